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

//! Delegate primitive (L1), unicast/multicast containers (L4), and the
//! shared error taxonomy (L8).
//!
//! This crate has no async runtime dependency on purpose: a [`Delegate`] can
//! be bound, cloned, compared and invoked synchronously with nothing more
//! than `std`. The async marshaling wrapper lives in `fabric-thread`, the
//! remote wrapper in `fabric-remote`, on top of the primitive defined here.

pub mod callable;
pub mod config;
pub mod containers;
pub mod delegate;
pub mod error;
pub mod priority;

pub use callable::Callable;
pub use config::FabricConfig;
pub use containers::{Multicast, MulticastSafe, Unicast};
pub use delegate::Delegate;
pub use error::{FabricError, FabricResult};
pub use priority::Priority;
