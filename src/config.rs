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

use std::{
    convert::TryFrom,
    fmt::{self, Display, Formatter},
    io,
    time::Duration,
};

use crate::{
    constants::{MAX_BAUD, MIN_BAUD},
    ports::PortInfo,
    transport::POLL_TIMEOUT,
    Error, Result,
};

#[cfg(not(windows))]
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
#[cfg(windows)]
pub const DEFAULT_PORT: &str = "COM1";

pub const DEFAULT_BAUD: u32 = 115200;
pub const DEFAULT_POWER_CYCLE_WAIT: Duration = Duration::from_secs(10);

/// How to find the serial port of the USB-to-serial converter.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PortSelector {
    /// A port path, e.g. `/dev/ttyUSB0`.
    ByPath(String),
    /// The first port whose USB vendor and product IDs match.
    ByVendorProduct(u16, u16),
}

impl PortSelector {
    /// Resolve the selector to a port path.
    pub fn resolve(&self) -> Result<String> {
        match self {
            PortSelector::ByPath(path) => Ok(path.clone()),
            PortSelector::ByVendorProduct(vid, pid) => {
                resolve_usb(&PortInfo::list_all(), *vid, *pid).ok_or_else(
                    || Error::TransportUnavailable {
                        port: self.to_string(),
                        source: io::Error::new(
                            io::ErrorKind::NotFound,
                            "no matching USB-to-serial converter",
                        ),
                    },
                )
            }
        }
    }
}

fn resolve_usb(ports: &[PortInfo], vid: u16, pid: u16) -> Option<String> {
    ports
        .iter()
        .find(|p| {
            p.usb_info
                .as_ref()
                .map_or(false, |usb| usb.vid == vid && usb.pid == pid)
        })
        .map(|p| p.port.to_string_lossy().into_owned())
}

impl Display for PortSelector {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PortSelector::ByPath(path) => write!(fmt, "{}", path),
            PortSelector::ByVendorProduct(vid, pid) => {
                write!(fmt, "{:04X}:{:04X}", vid, pid)
            }
        }
    }
}

/// Parameters of a programming session.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Config {
    pub port: PortSelector,
    /// Baud rate negotiated with the MCU after the handshake.
    pub baud: u32,
    /// Baud rate used while waiting for the MCU. The bootloader detects it
    /// from the synchronization bytes.
    pub handshake_baud: u32,
    /// How long to wait for the user to power cycle the MCU.
    pub power_cycle_wait: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: PortSelector::ByPath(DEFAULT_PORT.to_owned()),
            baud: DEFAULT_BAUD,
            handshake_baud: DEFAULT_BAUD,
            power_cycle_wait: DEFAULT_POWER_CYCLE_WAIT,
        }
    }
}

impl Config {
    /// Check the baud rates are within what the bootloader supports.
    pub fn validate(&self) -> Result<()> {
        for &baud in [self.baud, self.handshake_baud].iter() {
            if !(MIN_BAUD..=MAX_BAUD).contains(&baud) {
                return Err(Error::InvalidBaudRate(baud));
            }
        }

        Ok(())
    }

    /// Number of synchronization probes sent while waiting for the MCU.
    pub fn poll_iterations(&self) -> u32 {
        let iterations =
            self.power_cycle_wait.as_millis() / POLL_TIMEOUT.as_millis();
        u32::try_from(iterations).unwrap_or(u32::MAX)
    }
}
