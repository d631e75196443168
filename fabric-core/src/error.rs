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

//! The error taxonomy (§7). Every failure the fabric can produce is one of
//! these kinds; there is no "miscellaneous" catch-all, since every one of
//! them is a status the spec names explicitly.

use thiserror::Error;

/// Result alias used throughout the fabric crates, analogous to a
/// `CommonResult<T>` alias but over a closed enum instead of a boxed
/// trait object, since every failure kind is known statically.
pub type FabricResult<T> = std::result::Result<T, FabricError>;

/// One of the nine error kinds from spec §7.
///
/// `EmptyInvocation` is the only kind that is a programming error rather
/// than an expected runtime condition; callers that hit it have invoked a
/// delegate that was never bound (or bound to `None`). Every other variant
/// is an ordinary, recoverable status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FabricError {
    /// Invoked a delegate with no bound target.
    #[error("invoked an empty delegate")]
    EmptyInvocation,

    /// Enqueue attempted before `start()` or after `stop()`.
    #[error("target thread `{thread_name}` is not running")]
    ThreadNotRunning {
        /// Name of the thread the caller tried to enqueue onto.
        thread_name: String,
    },

    /// A bounded queue rejected an enqueue because it was full.
    #[error("queue on thread `{thread_name}` is full (capacity {capacity})")]
    QueueFull {
        /// Name of the thread whose queue was full.
        thread_name: String,
        /// Configured capacity of the queue.
        capacity: usize,
    },

    /// A blocking wait exceeded its deadline.
    #[error("blocking call timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// A message was dropped by `Thread::stop()` without being invoked.
    #[error("message was cancelled by thread shutdown")]
    Cancelled,

    /// The external `Dispatcher` reported a nonzero/failure status.
    #[error("dispatch to remote id {remote_id} failed with status {status}")]
    DispatchFailed {
        /// Remote id the frame was addressed to.
        remote_id: u16,
        /// Status code the dispatcher returned.
        status: i32,
    },

    /// A received frame's sync marker did not match `0x55AA`.
    #[error("framing error: expected marker 0x55AA, found {found:#06x}")]
    FramingError {
        /// The marker value actually observed on the wire.
        found: u16,
    },

    /// The serializer could not reconstruct arguments from a payload.
    #[error("failed to decode payload for remote id {remote_id}: {reason}")]
    DecodeFailed {
        /// Remote id the failing frame was addressed to.
        remote_id: u16,
        /// Human-readable reason from the serializer.
        reason: String,
    },

    /// The reliability layer gave up after its configured retry budget.
    #[error("sequence {seq_num} unacknowledged after {retries} retries")]
    AckTimeout {
        /// Sequence number that was never acknowledged.
        seq_num: u16,
        /// Number of retries attempted before giving up.
        retries: u32,
    },
}

impl FabricError {
    /// `true` for kinds that are ordinary, expected runtime statuses rather
    /// than programming bugs. Only [`FabricError::EmptyInvocation`] is not
    /// one of these (spec §7: "No panics/aborts from the core on misuse
    /// other than `EmptyInvocation`").
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FabricError::EmptyInvocation)
    }
}
