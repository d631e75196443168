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

//! Beyond [`diagnostics`], nothing lives in this crate's library target
//! itself; it exists to pull every other crate together for the scenario
//! suite in `tests/` (spec §8's S1-S6) and the cross-crate invariant
//! suite in `tests/invariants.rs`.

pub mod diagnostics;

pub use diagnostics::{config_from_env, install_diagnostics};
