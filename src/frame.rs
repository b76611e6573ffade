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

//! # Frame codec
//!
//! Every exchange after the synchronization byte is wrapped as:
//!
//! ```text
//! [PREFIX][PREFIX^0xFF][CODE][SIZE_HI][SIZE_LO][...PAYLOAD][CHK_HI][CHK_LO][SUFFIX]
//! ```
//!
//! where `SIZE = len(PAYLOAD) + 6` and the checksum is the 16-bit sum of
//! `CODE`, both size bytes and the payload.

use std::convert::TryFrom;

use crate::{
    constants::{FRAME_OVERHEAD, PREFIX, RX_CODE, SUFFIX},
    transport::{Transport, FRAME_TIMEOUT},
    Error, Result,
};

/// Checksum of a frame with direction `code` and `payload`.
pub fn checksum(code: u8, size: u16, payload: &[u8]) -> u16 {
    let [size_hi, size_lo] = size.to_be_bytes();
    payload.iter().fold(
        u16::from(code)
            .wrapping_add(u16::from(size_hi))
            .wrapping_add(u16::from(size_lo)),
        |sum, byte| sum.wrapping_add(u16::from(*byte)),
    )
}

/// Build a frame carrying `payload` with the direction `code`.
pub fn encode(code: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let size = u16::try_from(payload.len() + FRAME_OVERHEAD)
        .map_err(|_| Error::PayloadTooLarge(payload.len()))?;

    let mut frame = Vec::with_capacity(payload.len() + FRAME_OVERHEAD + 2);
    frame.push(PREFIX);
    frame.push(PREFIX ^ 0xFF);
    frame.push(code);
    frame.extend_from_slice(&size.to_be_bytes());
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&checksum(code, size, payload).to_be_bytes());
    frame.push(SUFFIX);

    Ok(frame)
}

fn read_exact<T>(transport: &mut T, buf: &mut [u8]) -> Result<()>
where
    T: Transport + ?Sized,
{
    let n = transport.read_bytes(buf)?;
    if n != buf.len() {
        log::trace!("frame truncated, expected {} bytes, found {}", buf.len(), n);
        return Err(Error::Framing("length"));
    }

    Ok(())
}

/// Read a device originated frame and return its payload.
///
/// Returns `Ok(None)` when the first byte read isn't a frame prefix, or
/// nothing arrived before the read timeout. This is the normal outcome while
/// polling for the MCU.
pub fn decode<T>(transport: &mut T) -> Result<Option<Vec<u8>>>
where
    T: Transport + ?Sized,
{
    let mut byte = [0u8; 1];
    if transport.read_bytes(&mut byte)? == 0 || byte[0] != PREFIX {
        return Ok(None);
    }

    // The MCU is now sending, wait longer for the rest.
    transport.set_read_timeout(FRAME_TIMEOUT)?;

    let mut hdr = [0u8; 2];
    read_exact(transport, &mut hdr)?;
    if hdr != [PREFIX ^ 0xFF, RX_CODE] {
        return Err(Error::Framing("prefix"));
    }

    let mut size = [0u8; 2];
    read_exact(transport, &mut size)?;
    let size = u16::from_be_bytes(size);
    let payload_len = usize::from(size)
        .checked_sub(FRAME_OVERHEAD)
        .ok_or(Error::Framing("size"))?;

    let mut payload = vec![0u8; payload_len];
    read_exact(transport, &mut payload)?;

    let mut trailer = [0u8; 3];
    read_exact(transport, &mut trailer)?;
    let found = u16::from_be_bytes([trailer[0], trailer[1]]);
    let expected = checksum(RX_CODE, size, &payload);
    if expected != found {
        return Err(Error::Checksum { expected, found });
    }

    if trailer[2] != SUFFIX {
        return Err(Error::Framing("suffix"));
    }

    log::trace!("received frame, payload = {:02X?}", payload);

    Ok(Some(payload))
}
