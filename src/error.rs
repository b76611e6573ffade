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

use std::io;

use thiserror::Error;

/// Errors returned by the ISP protocol engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The serial port couldn't be opened or found.
    #[error("failed to connect to serial port `{port}`")]
    TransportUnavailable {
        port: String,
        #[source]
        source: io::Error,
    },
    /// No reply was received within the power cycle window.
    #[error("timeout, failed to connect to MCU")]
    HandshakeTimeout,
    /// Unexpected byte at a fixed offset of a frame, or a truncated frame.
    #[error("invalid data {0} from MCU")]
    Framing(&'static str),
    #[error("invalid data checksum from MCU (expected {expected:#06x}, found {found:#06x})")]
    Checksum { expected: u16, found: u16 },
    /// The reply payload is shorter than the exchange requires.
    #[error("invalid response from MCU (expected at least {expected} bytes, found {found})")]
    ShortReply { expected: usize, found: usize },
    #[error("unsupported chip (ID: {0:#06x})")]
    UnsupportedDevice(u16),
    /// The reply code doesn't match the one expected for the command.
    #[error("command {command:#04x} rejected by MCU (reply {reply:#04x})")]
    CommandRejected { command: u8, reply: u8 },
    #[error("not enough memory ({len} bytes at {address:#06x}, flash size is {flash_size} bytes)")]
    CapacityExceeded {
        address: u16,
        len: usize,
        flash_size: u32,
    },
    #[error("payload of {0} bytes doesn't fit in a frame")]
    PayloadTooLarge(usize),
    #[error("unsupported baud rate {0}, must be within 2400 - 115200")]
    InvalidBaudRate(u32),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether repeating the whole operation may succeed, e.g. after the
    /// user power cycles the MCU again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::HandshakeTimeout)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
