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

//! L3 remote wrapper (spec §4.3, §6): marshals an L1 delegate invocation
//! into a byte stream framed by the fixed [`envelope::FrameHeader`], sent
//! through a pluggable [`dispatcher::Dispatcher`] and encoded by a
//! pluggable [`serializer::Serializer`]. Also carries the optional L4.7
//! reliability layer (`TransportMonitor` / `RetryMonitor` /
//! `ReliableTransport`).
//!
//! `Serializer`, `Dispatcher`, and `Transport` are the external contracts
//! from spec §6 — this crate defines the traits and a JSON/loopback
//! reference implementation of each for tests and the demo crate; real
//! hosts are expected to bring their own.

pub mod dispatcher;
pub mod envelope;
pub mod reliability;
pub mod remote_delegate;
pub mod serializer;

pub use dispatcher::{Dispatcher, LoopbackDispatcher, LoopbackTransport, Transport};
pub use envelope::{FrameHeader, ACK_ID, HEADER_LEN, MARKER};
pub use reliability::{MonitorStatus, ReliableTransport, RetryMonitor, TransportMonitor};
pub use remote_delegate::RemoteDelegate;
pub use serializer::{JsonSerializer, Serializer};
