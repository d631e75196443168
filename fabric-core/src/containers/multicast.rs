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

use std::cell::{Cell, RefCell};

use crate::delegate::Delegate;

/// Ordered, single-threaded multicast container (spec §4.4). Duplicates
/// are allowed; `add` appends, `remove` removes the first delegate that
/// compares equal. Reentrant `add`/`remove` from within a subscriber's own
/// invocation is supported via the same lazy-deletion discipline as
/// [`crate::MulticastSafe`], just without a mutex: a delegate removed
/// during its own invocation is not called again in that broadcast; one
/// added during an in-progress broadcast is not visited until the next
/// broadcast.
pub struct Multicast<Args> {
    delegates: RefCell<Vec<Option<Delegate<Args, ()>>>>,
    depth: Cell<u32>,
}

impl<Args> Multicast<Args> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            delegates: RefCell::new(Vec::new()),
            depth: Cell::new(0),
        }
    }

    /// Appends a delegate to the back of the list.
    pub fn add(&self, delegate: Delegate<Args, ()>) {
        self.delegates.borrow_mut().push(Some(delegate));
    }

    /// Removes the first delegate that compares equal, if any.
    pub fn remove(&self, delegate: &Delegate<Args, ()>)
    where
        Args: Clone,
    {
        let mut delegates = self.delegates.borrow_mut();
        if let Some(slot) = delegates
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|d| d.equals(delegate)))
        {
            *slot = None;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.delegates.borrow().iter().filter(|s| s.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<Args: Clone> Multicast<Args> {
    /// Calls every currently-present delegate in order (spec §4.4).
    /// Per-subscriber failures are swallowed and logged — subscribers that
    /// need to observe their own failures should self-report through
    /// their own error channel (async/remote wrappers carry one; see
    /// `fabric-thread`/`fabric-remote`).
    pub fn broadcast(&self, args: Args) {
        self.depth.set(self.depth.get() + 1);

        let snapshot_len = self.delegates.borrow().len();
        for i in 0..snapshot_len {
            let maybe = self.delegates.borrow().get(i).cloned().flatten();
            if let Some(delegate) = maybe {
                if let Err(err) = delegate.invoke(args.clone()) {
                    tracing::warn!(?err, "multicast subscriber invocation failed");
                }
            }
        }

        let depth = self.depth.get() - 1;
        self.depth.set(depth);
        if depth == 0 {
            self.delegates.borrow_mut().retain(Option::is_some);
        }
    }
}

impl<Args> Default for Multicast<Args> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;
    use std::rc::Rc;

    #[test]
    fn add_and_broadcast_in_order() {
        let log = Rc::new(StdRefCell::new(Vec::new()));
        let mc: Multicast<(i32,)> = Multicast::new();

        let l1 = log.clone();
        mc.add(Delegate::bind_callable(move |i: i32| l1.borrow_mut().push(i)));
        let l2 = log.clone();
        mc.add(Delegate::bind_callable(move |i: i32| l2.borrow_mut().push(i + 1)));

        mc.broadcast((7,));
        assert_eq!(*log.borrow(), vec![7, 8]);
    }

    #[test]
    fn add_remove_yields_empty() {
        fn noop(_x: i32) {}
        let mc: Multicast<(i32,)> = Multicast::new();
        let d = Delegate::bind_free(noop);
        mc.add(d.clone());
        assert_eq!(mc.len(), 1);
        mc.remove(&d);
        assert!(mc.is_empty());
    }

    #[test]
    fn self_removing_subscriber_not_called_again_same_broadcast() {
        let mc: Rc<Multicast<(i32,)>> = Rc::new(Multicast::new());
        let calls = Rc::new(StdRefCell::new(0));

        // Bind a callable that removes itself from the container on its
        // first invocation. Build the delegate first so we can capture an
        // equal clone to remove.
        let calls_inner = calls.clone();
        let mc_inner = mc.clone();
        let target: Rc<StdRefCell<Option<crate::delegate::Delegate<(i32,), ()>>>> =
            Rc::new(StdRefCell::new(None));
        let target_inner = target.clone();
        let delegate = Delegate::bind_callable(move |_x: i32| {
            *calls_inner.borrow_mut() += 1;
            if let Some(me) = target_inner.borrow().as_ref() {
                mc_inner.remove(me);
            }
        });
        *target.borrow_mut() = Some(delegate.clone());
        mc.add(delegate);

        mc.broadcast((1,));
        assert_eq!(*calls.borrow(), 1);
        assert!(mc.is_empty());

        mc.broadcast((2,));
        assert_eq!(*calls.borrow(), 1, "removed subscriber must not run again");
    }

    #[test]
    fn added_during_broadcast_not_visited_until_next() {
        let mc: Rc<Multicast<(i32,)>> = Rc::new(Multicast::new());
        let log = Rc::new(StdRefCell::new(Vec::new()));

        let mc_inner = mc.clone();
        let log_inner = log.clone();
        mc.add(Delegate::bind_callable(move |x: i32| {
            log_inner.borrow_mut().push(100 + x);
            let log_inner2 = log_inner.clone();
            mc_inner.add(Delegate::bind_callable(move |y: i32| {
                log_inner2.borrow_mut().push(200 + y);
            }));
        }));

        mc.broadcast((1,));
        assert_eq!(*log.borrow(), vec![101]);

        mc.broadcast((2,));
        assert_eq!(*log.borrow(), vec![101, 102, 202]);
    }
}
