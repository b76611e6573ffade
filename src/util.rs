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

//! # Utilities
//!
//! Convenience functions built on top of the single frame commands of
//! [`Programmer`].

use std::convert::TryFrom;

use crate::{constants::MAX_PAYLOAD, Error, Programmer, Result, Transport};

/// Bytes of a `CMD_WRITE` payload that aren't flash data: command,
/// address and break marker.
const WRITE_HDR_LEN: usize = 5;

/// Largest chunk a single `CMD_WRITE` frame can carry.
///
/// With this size any image that fits in a catalogued chip goes out in one
/// frame.
pub const DEFAULT_CHUNK_SIZE: usize = MAX_PAYLOAD - WRITE_HDR_LEN;

/// Write `data` into the flash starting at `address`, in chunks of at most
/// `chunk_size` bytes.
///
/// The capacity is checked for the whole image before anything is sent.
/// `progress` is called after each chunk with the number of bytes written
/// so far. The first chunk that fails aborts the transfer.
///
/// # Panics
///
/// This function panics if `chunk_size` is zero.
pub fn write_flash_range<P, F>(
    programmer: &mut Programmer<P>,
    address: u16,
    data: &[u8],
    chunk_size: usize,
    mut progress: F,
) -> Result<()>
where
    P: Transport,
    F: FnMut(usize),
{
    assert!(chunk_size > 0, "chunk size can't be zero");

    programmer.check_capacity(address, data.len())?;

    let chunk_size = chunk_size.min(DEFAULT_CHUNK_SIZE);
    log::info!(
        "Writing {} bytes at {:#06X}, {} chunks",
        data.len(),
        address,
        (data.len() + chunk_size - 1) / chunk_size
    );

    let mut written = 0;
    for (chunk_index, chunk) in data.chunks(chunk_size).enumerate() {
        let chunk_addr = u16::try_from(usize::from(address) + written).map_err(|_| {
            Error::CapacityExceeded {
                address,
                len: data.len(),
                flash_size: programmer.chip().flash_size,
            }
        })?;

        log::info!(
            "Writing chunk #{} ({} B) at address {:#06X}",
            chunk_index,
            chunk.len(),
            chunk_addr
        );

        programmer.write_flash(chunk_addr, chunk)?;

        written += chunk.len();
        progress(written);
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        constants::{CMD_WRITE, REPLY_WRITE_OK},
        test::{device_frame, programmer},
    };

    /// Payloads of the frames sent by the host.
    fn sent_payloads(writes: &[Vec<u8>]) -> Vec<&[u8]> {
        writes.iter().map(|w| &w[5..w.len() - 3]).collect()
    }

    #[test]
    fn test_write_flash_range_chunks() {
        let mut isp = programmer(0xF721, 0x72);
        let probes = isp.port().writes().len();
        for _ in 0..3 {
            isp.port_mut().reply(device_frame(&[REPLY_WRITE_OK]));
        }

        let data: Vec<u8> = (0..600u32).map(|i| (i % 251) as u8).collect();
        let mut reported = Vec::new();
        write_flash_range(&mut isp, 0x0100, &data, 256, |n| reported.push(n))
            .unwrap();

        assert_eq!(reported, [256, 512, 600]);

        let writes = isp.port().writes();
        let payloads = sent_payloads(&writes[probes..]);
        assert_eq!(payloads.len(), 3);
        for (i, (payload, addr)) in payloads
            .iter()
            .zip([0x0100u16, 0x0200, 0x0300].iter())
            .enumerate()
        {
            assert_eq!(payload[0], CMD_WRITE);
            assert_eq!(&payload[1..3], &addr.to_be_bytes());
            assert_eq!(&payload[3..5], &[0x5Au8, 0xA5]);
            let start = i * 256;
            let end = (start + 256).min(data.len());
            assert_eq!(&payload[5..], &data[start..end]);
        }
    }

    #[test]
    fn test_write_flash_range_single_frame() {
        let mut isp = programmer(0xF721, 0x72);
        let probes = isp.port().writes().len();
        isp.port_mut().reply(device_frame(&[REPLY_WRITE_OK]));

        let data = vec![0xA5u8; 16384];
        write_flash_range(&mut isp, 0, &data, DEFAULT_CHUNK_SIZE, |_| ()).unwrap();
        assert_eq!(isp.port().writes().len(), probes + 1);
    }

    #[test]
    fn test_write_flash_range_empty() {
        let mut isp = programmer(0xF721, 0x72);
        let probes = isp.port().writes().len();

        write_flash_range(&mut isp, 0, &[], DEFAULT_CHUNK_SIZE, |_| {
            panic!("nothing should be written")
        })
        .unwrap();
        assert_eq!(isp.port().writes().len(), probes);
    }

    #[test]
    fn test_write_flash_range_capacity() {
        let mut isp = programmer(0xF752, 0x72);
        let sent = isp.port().written_bytes();

        let data = vec![0u8; 4000];
        let result = write_flash_range(&mut isp, 100, &data, 128, |_| {
            panic!("nothing should be written")
        });
        assert!(matches!(result, Err(Error::CapacityExceeded { .. })));
        assert_eq!(isp.port().written_bytes(), sent);
    }

    #[test]
    fn test_write_flash_range_aborts() {
        let mut isp = programmer(0xF721, 0x72);
        let probes = isp.port().writes().len();
        isp.port_mut().reply(device_frame(&[REPLY_WRITE_OK]));
        isp.port_mut().reply(device_frame(&[0x00]));
        isp.port_mut().reply(device_frame(&[REPLY_WRITE_OK]));

        let data = vec![0u8; 300];
        let mut reported = Vec::new();
        let result =
            write_flash_range(&mut isp, 0, &data, 100, |n| reported.push(n));
        assert!(matches!(result, Err(Error::CommandRejected { .. })));
        assert_eq!(reported, [100]);
        assert_eq!(isp.port().writes().len(), probes + 2);
    }
}
