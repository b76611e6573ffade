// Copyright 2021 Locha Mesh Developers <contact@locha.io>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # STC8 ISP library
//!
//! This a library to program STC8G/STC8H microcontrollers through the UART
//! bootloader built into the chips, using any USB-to-serial converter.
//!
//! The bootloader only listens for a short time after power on, so
//! [`Programmer::identify`] keeps probing the port until the user power
//! cycles the MCU.
//!
//! # Example
//!
//! ```no_run
//! use stc_isp::{Config, Programmer};
//!
//! # fn main() -> stc_isp::Result<()> {
//! let mut isp = Programmer::connect(Config::default())?;
//! isp.set_baud()?;
//! isp.check_baud()?;
//! isp.erase()?;
//! isp.write_flash(0, &[0x02, 0x00, 0x03])?;
//! # Ok(())
//! # }
//! ```

use std::{
    convert::TryFrom,
    fmt,
    time::Duration,
};

#[rustfmt::skip]
pub mod constants;
pub mod catalog;
pub mod config;
pub mod frame;
pub mod ports;
pub mod transport;
pub mod util;

mod error;
#[cfg(test)]
mod mock;

pub use self::{
    catalog::DeviceDescriptor,
    config::{Config, PortSelector},
    error::{Error, Result},
    transport::Transport,
};

use self::constants::*;

/// Chip version as reported during the handshake.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ChipVersion {
    /// Major version in the high nibble, minor version in the low nibble.
    pub version: u8,
    /// Stepping, an ASCII letter.
    pub stepping: u8,
    /// Patch level in the low nibble.
    pub minor: u8,
}

impl ChipVersion {
    /// Whether `CMD_BAUD_CHECK` needs the extended payload.
    pub fn uses_extended_check(&self) -> bool {
        self.version >= EXTENDED_CHECK_VERSION
    }
}

impl fmt::Display for ChipVersion {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            fmt,
            "{}.{}.{}{}",
            self.version >> 4,
            self.version & 0x0F,
            self.minor & 0x0F,
            char::from(self.stepping)
        )
    }
}

/// The identified MCU.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ChipInfo {
    pub id: u16,
    pub name: &'static str,
    /// Flash size in bytes.
    pub flash_size: u32,
    pub version: ChipVersion,
    /// Oscillator frequency measured by the bootloader, in Hz.
    pub fosc: u32,
}

impl ChipInfo {
    /// Parse the identification payload sent by the bootloader.
    pub fn from_reply(reply: &[u8]) -> Result<ChipInfo> {
        if reply.len() < ID_REPLY_LEN {
            return Err(Error::ShortReply {
                expected: ID_REPLY_LEN,
                found: reply.len(),
            });
        }

        let id = u16::from_be_bytes([reply[20], reply[21]]);
        let device = catalog::lookup(id).ok_or(Error::UnsupportedDevice(id))?;

        Ok(ChipInfo {
            id,
            name: device.name,
            flash_size: device.flash_size,
            version: ChipVersion {
                version: reply[17],
                stepping: reply[18],
                minor: reply[22],
            },
            fosc: u32::from_be_bytes([reply[1], reply[2], reply[3], reply[4]]),
        })
    }
}

/// Value loaded into the MCU baud rate timer for `baud`.
///
/// The divisor always uses the nominal [`FUSER`] timer base instead of the
/// measured oscillator frequency; the bootloader expects it that way.
pub fn baud_divisor(baud: u32) -> Result<u16> {
    if !(MIN_BAUD..=MAX_BAUD).contains(&baud) {
        return Err(Error::InvalidBaudRate(baud));
    }

    u16::try_from(65536 - FUSER / (4 * baud)).map_err(|_| Error::InvalidBaudRate(baud))
}

/// A programming session with an identified MCU.
pub struct Programmer<P> {
    port: P,
    config: Config,
    chip: ChipInfo,
    baud: u32,
}

impl Programmer<serial::SystemPort> {
    /// Open the serial port selected in `config` and wait for the MCU.
    ///
    /// See [`Programmer::identify`].
    pub fn connect(config: Config) -> Result<Self> {
        config.validate()?;

        let path = config.port.resolve()?;
        let port = transport::open(&path, config.handshake_baud)?;

        Programmer::identify(port, config)
    }
}

impl<P> Programmer<P>
where
    P: Transport,
{
    /// Wait for the MCU to be power cycled and identify it.
    ///
    /// A synchronization byte is sent every [`transport::POLL_TIMEOUT`]
    /// until the bootloader answers or `config.power_cycle_wait` elapses.
    ///
    /// # Errors
    ///
    /// - [`Error::HandshakeTimeout`] if the MCU never answered.
    /// - [`Error::ShortReply`] if the identification is incomplete.
    /// - [`Error::UnsupportedDevice`] if the chip isn't in the catalog.
    pub fn identify(mut port: P, config: Config) -> Result<Self> {
        port.set_read_timeout(transport::POLL_TIMEOUT)?;
        port.clear_input()?;

        let iterations = config.poll_iterations();
        log::debug!("Probing for MCU, {} attempts", iterations);

        let mut reply = None;
        for _ in 0..iterations {
            port.write_bytes(&[SYNCH])?;
            reply = frame::decode(&mut port)?;
            if reply.is_some() {
                break;
            }
        }

        let reply = reply.ok_or(Error::HandshakeTimeout)?;
        let chip = ChipInfo::from_reply(&reply)?;

        log::debug!(
            "Found {} (ID: {:#06X}) version {}, fosc = {} Hz",
            chip.name,
            chip.id,
            chip.version,
            chip.fosc
        );

        Ok(Programmer {
            port,
            baud: config.handshake_baud,
            config,
            chip,
        })
    }

    /// The identified MCU.
    pub fn chip(&self) -> &ChipInfo {
        &self.chip
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Baud rate currently used on the link.
    pub fn baud(&self) -> u32 {
        self.baud
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Send a command frame and return the reply payload.
    fn transmit(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        let pkt = frame::encode(TX_CODE, payload)?;

        log::trace!("sending cmd {:#X}, {} bytes", payload[0], pkt.len());

        self.port.write_bytes(&pkt)?;
        match frame::decode(&mut self.port)? {
            Some(reply) if !reply.is_empty() => Ok(reply),
            _ => Err(Error::ShortReply {
                expected: 1,
                found: 0,
            }),
        }
    }

    fn command(&mut self, payload: &[u8], expected: u8) -> Result<()> {
        let reply = self.transmit(payload)?;
        if reply[0] != expected {
            return Err(Error::CommandRejected {
                command: payload[0],
                reply: reply[0],
            });
        }

        Ok(())
    }

    /// Ask the MCU to switch to the configured baud rate.
    ///
    /// The MCU answers at the current rate, [`Programmer::check_baud`] must
    /// follow right away.
    pub fn set_baud(&mut self) -> Result<()> {
        let [count_hi, count_lo] = baud_divisor(self.config.baud)?.to_be_bytes();
        let payload = [
            CMD_BAUD_SET,
            self.chip.fosc as u8,
            0x40,
            count_hi,
            count_lo,
            0x00,
            0x00,
            0x97,
        ];

        self.command(&payload, CMD_BAUD_SET)
    }

    /// Switch the local side to the new baud rate and verify the MCU
    /// follows.
    ///
    /// On failure the link is left in an unknown state and the session
    /// should be dropped.
    pub fn check_baud(&mut self) -> Result<()> {
        // Let the MCU finish switching.
        #[cfg(not(test))]
        std::thread::sleep(Duration::from_millis(10));

        self.port.set_baud_rate(self.config.baud)?;
        self.baud = self.config.baud;

        let result = if self.chip.version.uses_extended_check() {
            self.command(
                &[CMD_BAUD_CHECK, 0x00, 0x00, BREAK, BREAK ^ 0xFF],
                CMD_BAUD_CHECK,
            )
        } else {
            self.command(&[CMD_BAUD_CHECK], CMD_BAUD_CHECK)
        };

        if result.is_ok() {
            log::debug!("Baud rate set to {}", self.baud);
        }

        result
    }

    /// Erase the whole flash.
    pub fn erase(&mut self) -> Result<()> {
        self.command(&[CMD_ERASE, 0x00, 0x00, BREAK, BREAK ^ 0xFF], CMD_ERASE)
    }

    /// Fail if `len` bytes at `address` don't fit in the flash.
    pub fn check_capacity(&self, address: u16, len: usize) -> Result<()> {
        let available = self.chip.flash_size.saturating_sub(u32::from(address));
        if len as u64 > u64::from(available) || u32::from(address) > self.chip.flash_size {
            return Err(Error::CapacityExceeded {
                address,
                len,
                flash_size: self.chip.flash_size,
            });
        }

        Ok(())
    }

    /// Write `data` into the flash at `address` with a single command.
    ///
    /// The flash must have been erased first. See
    /// [`util::write_flash_range`] to write images larger than a frame.
    pub fn write_flash(&mut self, address: u16, data: &[u8]) -> Result<()> {
        self.check_capacity(address, data.len())?;

        let mut payload = Vec::with_capacity(data.len() + 5);
        payload.push(CMD_WRITE);
        payload.extend_from_slice(&address.to_be_bytes());
        payload.push(BREAK);
        payload.push(BREAK ^ 0xFF);
        payload.extend_from_slice(data);

        self.command(&payload, REPLY_WRITE_OK)
    }
}

impl<P> fmt::Debug for Programmer<P> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Programmer")
            .field("chip", &self.chip)
            .field("baud", &self.baud)
            .field("port", &())
            .finish()
    }
}
