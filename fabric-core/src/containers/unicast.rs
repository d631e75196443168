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

use crate::delegate::Delegate;
use crate::error::{FabricError, FabricResult};

/// Holds at most one delegate; reassigning replaces it (spec §4.4).
#[derive(Clone)]
pub struct Unicast<Args, R> {
    slot: Delegate<Args, R>,
}

impl<Args, R> Unicast<Args, R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Delegate::empty(),
        }
    }

    /// Replaces whatever delegate was previously set.
    pub fn set(&mut self, delegate: Delegate<Args, R>) {
        self.slot = delegate;
    }

    /// Clears the slot back to empty.
    pub fn clear(&mut self) {
        self.slot = Delegate::empty();
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        !self.slot.is_empty()
    }

    /// Invokes the held delegate.
    ///
    /// # Errors
    /// Returns `Err(FabricError::EmptyInvocation)` if nothing is set.
    pub fn call(&self, args: Args) -> FabricResult<R> {
        if self.slot.is_empty() {
            return Err(FabricError::EmptyInvocation);
        }
        self.slot.invoke(args)
    }
}

impl<Args, R> Default for Unicast<Args, R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassigning_replaces() {
        let mut u = Unicast::new();
        assert!(!u.is_set());
        u.set(Delegate::bind_free(|x: i32| x + 1));
        assert_eq!(u.call((1,)).unwrap(), 2);
        u.set(Delegate::bind_free(|x: i32| x * 10));
        assert_eq!(u.call((1,)).unwrap(), 10);
    }

    #[test]
    fn clear_empties() {
        let mut u: Unicast<(i32,), i32> = Unicast::new();
        u.set(Delegate::bind_free(|x: i32| x));
        u.clear();
        assert!(u.call((1,)).is_err());
    }
}
