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

//! The `Serializer` external contract (spec §6): `write(args) -> bytes`,
//! `read(bytes) -> args`. The core only ever calls these from inside the
//! remote wrapper (spec §6).

use std::marker::PhantomData;

use fabric_core::{FabricError, FabricResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Per-signature argument codec, external to the core (spec §6).
pub trait Serializer<Args> {
    /// # Errors
    /// Returns `Err` if `args` cannot be encoded.
    fn write(&self, args: &Args) -> FabricResult<Vec<u8>>;

    /// # Errors
    /// Returns `Err(FabricError::DecodeFailed)` if `bytes` cannot be
    /// reconstructed into `Args` (spec §4.3 receive path, step 3).
    fn read(&self, remote_id: u16, bytes: &[u8]) -> FabricResult<Args>;
}

/// Reference `Serializer` used by the demo crate and tests: plain JSON via
/// `serde_json`, chosen because the teacher stack already depends on
/// `serde`/`serde_json` for its own config and IPC payloads. A production
/// host is free to swap in a binary codec without touching the wrapper.
pub struct JsonSerializer<Args> {
    _marker: PhantomData<fn() -> Args>,
}

impl<Args> JsonSerializer<Args> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<Args> Default for JsonSerializer<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> Serializer<Args> for JsonSerializer<Args>
where
    Args: Serialize + DeserializeOwned,
{
    fn write(&self, args: &Args) -> FabricResult<Vec<u8>> {
        serde_json::to_vec(args).map_err(|e| FabricError::DecodeFailed {
            remote_id: 0,
            reason: format!("encode failed: {e}"),
        })
    }

    fn read(&self, remote_id: u16, bytes: &[u8]) -> FabricResult<Args> {
        serde_json::from_slice(bytes).map_err(|e| FabricError::DecodeFailed {
            remote_id,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
    struct Payload {
        x: i32,
        y: i32,
        msg: String,
    }

    #[test]
    fn round_trips_a_struct() {
        let serializer = JsonSerializer::<Payload>::new();
        let original = Payload {
            x: 1,
            y: 2,
            msg: "Hello!".to_string(),
        };
        let bytes = serializer.write(&original).unwrap();
        let decoded = serializer.read(1, &bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn decode_failure_is_reported() {
        let serializer = JsonSerializer::<Payload>::new();
        let err = serializer.read(3, b"not json").unwrap_err();
        assert!(matches!(err, FabricError::DecodeFailed { remote_id: 3, .. }));
    }
}
