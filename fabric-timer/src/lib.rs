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

//! L7 timer (spec §4.8): each [`Timer`] owns a multicast of zero-argument
//! delegates plus an interval, a one-shot flag, and an enabled flag. A
//! process-wide registry holds weak references to every live timer;
//! [`process_all`] is called periodically (typically from a dedicated
//! timer thread) to fire due timers.

pub mod registry;
pub mod timer;

pub use registry::process_all;
pub use timer::Timer;
