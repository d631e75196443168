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

//! L4 delegate containers (spec §4.4): [`Unicast`] holds at most one
//! delegate; [`Multicast`] is an ordered, duplicate-tolerant sequence;
//! [`MulticastSafe`] adds a mutex and a reentrancy-safe lazy-deletion
//! broadcast.

mod multicast;
mod multicast_safe;
mod unicast;

pub use multicast::Multicast;
pub use multicast_safe::MulticastSafe;
pub use unicast::Unicast;
