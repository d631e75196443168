/*
 *   Copyright (c) 2024 Fabric Contributors
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

//! The bit-exact wire envelope from spec §6. Fields are kept host-order in
//! memory and swapped only at the encode/decode boundary — this is how
//! `original_source/.../MsgHeader.h` handles the same "network byte
//! order" requirement, rather than storing every field pre-swapped.

use fabric_core::{FabricError, FabricResult};

/// Sync marker prefixing every frame.
pub const MARKER: u16 = 0x55AA;

/// Reserved `remote_id` denoting an ACK frame.
pub const ACK_ID: u16 = 0xFFFF;

/// Size in bytes of the fixed-prefix header (marker + remote_id + seq_num
/// + length, each a `u16`).
pub const HEADER_LEN: usize = 8;

/// The fixed-prefix header on every remote message (spec §3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub marker: u16,
    pub remote_id: u16,
    pub seq_num: u16,
    pub length: u16,
}

impl FrameHeader {
    #[must_use]
    pub fn ack(seq_num: u16) -> Self {
        Self {
            marker: MARKER,
            remote_id: ACK_ID,
            seq_num,
            length: 0,
        }
    }

    #[must_use]
    pub fn is_ack(&self) -> bool {
        self.remote_id == ACK_ID
    }

    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..2].copy_from_slice(&self.marker.to_be_bytes());
        buf[2..4].copy_from_slice(&self.remote_id.to_be_bytes());
        buf[4..6].copy_from_slice(&self.seq_num.to_be_bytes());
        buf[6..8].copy_from_slice(&self.length.to_be_bytes());
        buf
    }

    /// Decodes the fixed-prefix header out of the front of `bytes`.
    ///
    /// # Errors
    /// `FramingError` if fewer than [`HEADER_LEN`] bytes are available or
    /// the sync marker does not match [`MARKER`].
    pub fn decode(bytes: &[u8]) -> FabricResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(FabricError::FramingError { found: 0 });
        }
        let marker = u16::from_be_bytes([bytes[0], bytes[1]]);
        if marker != MARKER {
            return Err(FabricError::FramingError { found: marker });
        }
        let remote_id = u16::from_be_bytes([bytes[2], bytes[3]]);
        let seq_num = u16::from_be_bytes([bytes[4], bytes[5]]);
        let length = u16::from_be_bytes([bytes[6], bytes[7]]);
        Ok(Self {
            marker,
            remote_id,
            seq_num,
            length,
        })
    }

    /// Encodes this header followed by `payload` into one frame.
    #[must_use]
    pub fn encode_frame(&self, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
        frame.extend_from_slice(&self.encode());
        frame.extend_from_slice(payload);
        frame
    }
}
