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

//! L5 Signal + Connection (spec §4.5): a shared-owned, thread-safe
//! multicast. The publisher holds a [`Signal`] through `Arc`; subscribers
//! are handed back a [`Connection`] (or [`ScopedConnection`]) that only
//! weakly observes the signal, so dropping either side alone never leaks
//! or panics the other (spec §3, §9 "cyclic references between Signal and
//! Subscriber").

pub mod connection;
pub mod signal;

pub use connection::{Connection, ScopedConnection};
pub use signal::Signal;
