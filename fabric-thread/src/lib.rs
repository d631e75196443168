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

//! L6 thread abstraction and the L2 async wrapper built on top of it.
//!
//! A [`Thread`] owns a dedicated OS thread driving a small current-thread
//! tokio runtime that services a three-lane (High/Normal/Low) priority
//! queue of boxed jobs. [`AsyncDelegate`] wraps an `fabric_core::Delegate`
//! with a target `Thread` and a [`WaitPolicy`], marshaling a call into a
//! job on that thread exactly as spec'd in §4.2.

pub mod async_delegate;
pub mod thread;

pub use async_delegate::{AsyncDelegate, WaitPolicy};
pub use thread::{QueuePolicy, Thread, ThreadOptions};
