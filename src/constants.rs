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

/// Frame start marker.
pub const PREFIX: u8                    = 0x46;
/// Frame end marker.
pub const SUFFIX: u8                    = 0x16;
/// Marker embedded in some command payloads, followed by its complement.
pub const BREAK: u8                     = 0x5A;
/// Direction code of host originated frames.
pub const TX_CODE: u8                   = 0x6A;
/// Direction code of device originated frames.
pub const RX_CODE: u8                   = 0x68;
/// Probe byte sent while waiting for the power cycle.
pub const SYNCH: u8                     = 0x7F;

pub const CMD_BAUD_SET: u8              = 0x01;
pub const CMD_ERASE: u8                 = 0x03;
pub const CMD_BAUD_CHECK: u8            = 0x05;
pub const CMD_WRITE: u8                 = 0x22;

/// Reply code of a successful `CMD_WRITE`.
pub const REPLY_WRITE_OK: u8            = 0x02;

/// Nominal timer base of the baud rate divisor, in Hz.
pub const FUSER: u32                    = 24_000_000;

/// Bytes counted in the size field besides the payload: code, size,
/// checksum and suffix.
pub const FRAME_OVERHEAD: usize         = 6;
/// Largest payload whose size still fits the 16-bit size field.
pub const MAX_PAYLOAD: usize            = u16::MAX as usize - FRAME_OVERHEAD;

/// Minimum length of the identification payload.
pub const ID_REPLY_LEN: usize           = 23;

/// First chip version using the extended `CMD_BAUD_CHECK` payload.
pub const EXTENDED_CHECK_VERSION: u8    = 0x72;

pub const MIN_BAUD: u32                 = 2400;
pub const MAX_BAUD: u32                 = 115200;
