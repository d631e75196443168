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

use std::time::Duration;

/// Tunables the C++ original hardcodes or leaves to the integrator. The
/// core has no opinion on *where* these come from (env vars, a TOML file,
/// hardcoded) — that's a hosting-application concern (spec §1's "sample
/// applications" non-goal) — this is just the typed bag they land in.
#[derive(Debug, Clone, PartialEq)]
pub struct FabricConfig {
    /// Default bounded capacity for a `Thread`'s per-priority queues when
    /// the caller does not specify one to `Thread::start`. `None` means
    /// unbounded.
    pub default_queue_capacity: Option<usize>,

    /// Default watchdog duration for a `Thread`; a single dispatched call
    /// exceeding this logs a diagnostic but is never killed (spec §4.6).
    pub default_watchdog: Option<Duration>,

    /// Default priority new async/signal subscriptions get when the caller
    /// doesn't specify one.
    pub default_priority: crate::Priority,

    /// Default retry budget for `RetryMonitor` (spec §4.7) before it
    /// surfaces `AckTimeout`.
    pub default_retry_count: u32,

    /// Default per-frame ACK deadline for `TransportMonitor`/`RetryMonitor`.
    pub default_ack_timeout: Duration,

    /// Multiplier applied to a timer's interval to decide it has "fallen
    /// behind" and should resync rather than keep catching up tick by tick
    /// (spec §4.8: "if `now - last_expire > 2*interval`, reset").
    pub timer_resync_threshold: u32,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            default_queue_capacity: None,
            default_watchdog: None,
            default_priority: crate::Priority::Normal,
            default_retry_count: 3,
            default_ack_timeout: Duration::from_millis(500),
            timer_resync_threshold: 2,
        }
    }
}
