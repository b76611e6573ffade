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

//! # Device catalog
//!
//! Chip identifiers reported by the bootloader during the handshake, with
//! the name and flash size of each supported part.

/// A supported microcontroller.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DeviceDescriptor {
    /// Chip identifier reported by the bootloader.
    pub id: u16,
    /// Part name.
    pub name: &'static str,
    /// Flash size in bytes.
    pub flash_size: u32,
}

const fn dev(id: u16, name: &'static str, flash_size: u32) -> DeviceDescriptor {
    DeviceDescriptor {
        id,
        name,
        flash_size,
    }
}

/// All the devices known to this crate.
#[rustfmt::skip]
pub static DEVICES: &[DeviceDescriptor] = &[
    dev(0xF721, "STC8H1K16",         16384),
    dev(0xF722, "STC8H1K20",         20480),
    dev(0xF723, "STC8H1K24",         24576),
    dev(0xF724, "STC8H1K28",         28672),
    dev(0xF725, "STC8H1K33",         33792),
    dev(0xF731, "STC8H1K02",          2048),
    dev(0xF732, "STC8H1K04",          4096),
    dev(0xF733, "STC8H1K06",          6144),
    dev(0xF734, "STC8H1K08",          8192),
    dev(0xF735, "STC8H1K10",         10240),
    dev(0xF736, "STC8H1K12",         12288),
    dev(0xF737, "STC8H1K17",         17408),
    dev(0xF741, "STC8H3K16S4",       16384),
    dev(0xF742, "STC8H3K32S4",       32768),
    dev(0xF743, "STC8H3K60S4",       61440),
    dev(0xF744, "STC8H3K64S4",       65024),
    dev(0xF745, "STC8H3K48S4",       49152),
    dev(0xF749, "STC8H3K16S2",       16384),
    dev(0xF74A, "STC8H3K32S2",       32768),
    dev(0xF74B, "STC8H3K60S2",       61440),
    dev(0xF74C, "STC8H3K64S2",       65024),
    dev(0xF74D, "STC8H3K48S2",       49152),
    dev(0xF751, "STC8G1K02-20/16P",   2048),
    dev(0xF752, "STC8G1K04-20/16P",   4096),
    dev(0xF753, "STC8G1K06-20/16P",   6144),
    dev(0xF754, "STC8G1K08-20/16P",   8192),
    dev(0xF755, "STC8G1K10-20/16P",  10240),
    dev(0xF756, "STC8G1K12-20/16P",  12288),
    dev(0xF757, "STC8G1K17-20/16P",  17408),
    dev(0xF761, "STC8G2K16S4",       16384),
    dev(0xF762, "STC8G2K32S4",       32768),
    dev(0xF763, "STC8G2K60S4",       61440),
    dev(0xF764, "STC8G2K64S4",       65024),
    dev(0xF765, "STC8G2K48S4",       49152),
    dev(0xF769, "STC8G2K16S2",       16384),
    dev(0xF76A, "STC8G2K32S2",       32768),
    dev(0xF76B, "STC8G2K60S2",       61440),
    dev(0xF76C, "STC8G2K64S2",       65024),
    dev(0xF76D, "STC8G2K48S2",       49152),
    dev(0xF771, "STC8G1K02T",         2048),
    dev(0xF772, "STC8G1K04T",         4096),
    dev(0xF773, "STC8G1K06T",         6144),
    dev(0xF774, "STC8G1K08T",         8192),
    dev(0xF775, "STC8G1K10T",        10240),
    dev(0xF776, "STC8G1K12T",        12288),
    dev(0xF777, "STC8G1K17T",        17408),
    dev(0xF781, "STC8H8K16U",        16384),
    dev(0xF782, "STC8H8K32U",        32768),
    dev(0xF783, "STC8H8K60U",        61440),
    dev(0xF784, "STC8H8K64U",        65024),
    dev(0xF785, "STC8H8K48U",        49152),
    dev(0xF791, "STC8G1K02A-8P",      2048),
    dev(0xF792, "STC8G1K04A-8P",      4096),
    dev(0xF793, "STC8G1K06A-8P",      6144),
    dev(0xF794, "STC8G1K08A-8P",      8192),
    dev(0xF795, "STC8G1K10A-8P",     10240),
    dev(0xF796, "STC8G1K12A-8P",     12288),
    dev(0xF797, "STC8G1K17A-8P",     17408),
    dev(0xF7A1, "STC8G1K02-8P",       2048),
    dev(0xF7A2, "STC8G1K04-8P",       4096),
    dev(0xF7A3, "STC8G1K06-8P",       6144),
    dev(0xF7A4, "STC8G1K08-8P",       8192),
    dev(0xF7A5, "STC8G1K10-8P",      10240),
    dev(0xF7A6, "STC8G1K12-8P",      12288),
    dev(0xF7A7, "STC8G1K17-8P",      17408),
];

/// Look up a device by its chip identifier.
pub fn lookup(id: u16) -> Option<&'static DeviceDescriptor> {
    DEVICES.iter().find(|d| d.id == id)
}
