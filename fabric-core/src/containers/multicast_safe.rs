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

use parking_lot::Mutex;

use crate::delegate::Delegate;

struct Inner<Args, R> {
    delegates: Vec<Option<Delegate<Args, R>>>,
    depth: u32,
}

/// Thread-safe multicast container (spec §4.4). A mutex guards the
/// delegate list; an internal reentrancy counter implements lazy
/// deletion so that `broadcast` is safe to call from within a subscriber
/// and safe to mutate concurrently from another thread while an
/// iteration is in progress:
///
/// - `remove` during an in-progress broadcast marks the slot `None`
///   rather than shifting the vector, so indices already captured by the
///   in-flight iteration stay valid.
/// - `add` during an in-progress broadcast appends past the snapshot
///   length taken at the start of that broadcast, so it is not visited
///   until the next one.
/// - Only the outermost `broadcast` (the one that took `depth` from 0 to
///   1) compacts the `None` slots out of the vector, on exit.
/// - The mutex is never held across a subscriber callback: the delegate
///   for a given index is cloned out under the lock, then invoked with
///   the lock released.
pub struct MulticastSafe<Args, R> {
    inner: Mutex<Inner<Args, R>>,
}

impl<Args, R> MulticastSafe<Args, R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                delegates: Vec::new(),
                depth: 0,
            }),
        }
    }

    /// Appends a delegate to the back of the list.
    pub fn add(&self, delegate: Delegate<Args, R>) {
        self.inner.lock().delegates.push(Some(delegate));
    }

    /// Removes the first delegate that compares equal, if any.
    pub fn remove(&self, delegate: &Delegate<Args, R>)
    where
        Args: Clone,
    {
        let mut inner = self.inner.lock();
        if let Some(slot) = inner
            .delegates
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|d| d.equals(delegate)))
        {
            *slot = None;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().delegates.iter().filter(|s| s.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<Args: Clone, R> MulticastSafe<Args, R> {
    /// Calls every currently-present delegate in order, tolerating
    /// concurrent `add`/`remove` from other threads (including from
    /// within a subscriber's own invocation, re-entering this same
    /// container). Per-subscriber failures are logged and do not stop
    /// remaining subscribers from running (spec §4.4, testable property
    /// #6).
    pub fn broadcast(&self, args: Args) {
        let snapshot_len = {
            let mut inner = self.inner.lock();
            inner.depth += 1;
            inner.delegates.len()
        };

        for i in 0..snapshot_len {
            let maybe = {
                let inner = self.inner.lock();
                inner.delegates.get(i).cloned().flatten()
            };
            if let Some(delegate) = maybe {
                if let Err(err) = delegate.invoke(args.clone()) {
                    tracing::warn!(?err, "multicast subscriber invocation failed");
                }
            }
        }

        let mut inner = self.inner.lock();
        inner.depth -= 1;
        if inner.depth == 0 {
            inner.delegates.retain(Option::is_some);
        }
    }
}

impl<Args, R> Default for MulticastSafe<Args, R> {
    fn default() -> Self {
        Self::new()
    }
}
