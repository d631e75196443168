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

//! The `Dispatcher` and `Transport` external contracts (spec §6). The
//! core never ships a concrete network transport (spec §1's explicit
//! non-goal); [`LoopbackDispatcher`]/[`LoopbackTransport`] here exist only
//! to drive tests and the demo crate in-process.

use fabric_core::{FabricError, FabricResult};
use parking_lot::Mutex;

/// Hands a fully-framed byte stream off to whatever moves bytes between
/// processes. Any non-zero return is a dispatch failure (spec §6).
pub trait Dispatcher: Send + Sync {
    fn send(&self, frame: &[u8], remote_id: u16) -> i32;
}

/// A paired send/receive byte channel, used by the reliability wrappers
/// (spec §6, §4.7).
pub trait Transport: Send + Sync {
    /// # Errors
    /// Implementation-defined I/O failure.
    fn send(&self, frame: &[u8]) -> FabricResult<()>;

    /// # Errors
    /// Implementation-defined I/O failure, or an empty queue.
    fn receive(&self) -> FabricResult<Vec<u8>>;
}

/// In-process loopback dispatcher: every sent frame is appended to an
/// internal queue that [`LoopbackDispatcher::drain`] hands back. Used to
/// exercise the remote wrapper without a real socket.
#[derive(Default)]
pub struct LoopbackDispatcher {
    sent: Mutex<Vec<(u16, Vec<u8>)>>,
}

impl LoopbackDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn drain(&self) -> Vec<(u16, Vec<u8>)> {
        std::mem::take(&mut self.sent.lock())
    }
}

impl Dispatcher for LoopbackDispatcher {
    fn send(&self, frame: &[u8], remote_id: u16) -> i32 {
        self.sent.lock().push((remote_id, frame.to_vec()));
        0
    }
}

/// In-process loopback transport: an unbounded FIFO of frames, shared
/// between a "sender" and "receiver" handle to the same instance.
#[derive(Default)]
pub struct LoopbackTransport {
    queue: Mutex<std::collections::VecDeque<Vec<u8>>>,
}

impl LoopbackTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for LoopbackTransport {
    fn send(&self, frame: &[u8]) -> FabricResult<()> {
        self.queue.lock().push_back(frame.to_vec());
        Ok(())
    }

    fn receive(&self) -> FabricResult<Vec<u8>> {
        // No "queue empty" kind exists in the closed error taxonomy (spec
        // §7); reuse `FramingError` with a zero marker as this loopback's
        // own sentinel for "nothing to receive yet".
        self.queue
            .lock()
            .pop_front()
            .ok_or(FabricError::FramingError { found: 0 })
    }
}
