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

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use fabric_core::{Delegate, Priority};
use parking_lot::Mutex;

use crate::connection::{Connection, ScopedConnection};

fn priority_rank(p: Priority) -> u8 {
    match p {
        Priority::Low => 0,
        Priority::Normal => 1,
        Priority::High => 2,
    }
}

pub(crate) struct Slot<Args> {
    pub(crate) id: u64,
    priority: Priority,
    delegate: Option<Delegate<Args, ()>>,
}

pub(crate) struct SignalInner<Args> {
    slots: Mutex<Vec<Slot<Args>>>,
    depth: AtomicU32,
    next_id: AtomicU64,
}

impl<Args> SignalInner<Args> {
    pub(crate) fn remove(&self, id: u64) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.iter_mut().find(|s| s.id == id) {
            slot.delegate = None;
        }
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        self.slots
            .lock()
            .iter()
            .any(|s| s.id == id && s.delegate.is_some())
    }
}

impl<Args: Clone> SignalInner<Args> {
    fn emit(&self, args: Args) {
        self.depth.fetch_add(1, Ordering::SeqCst);

        // Snapshot the currently-present slot indices, ordered
        // higher-priority-first; ties preserve subscription (insertion)
        // order since `sort_by` is stable and slots are visited in
        // ascending index order before the sort (spec §4.5: "higher-
        // priority subscribers run first per emission").
        let order: Vec<usize> = {
            let slots = self.slots.lock();
            let mut indexed: Vec<(usize, Priority)> = slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.delegate.is_some())
                .map(|(i, s)| (i, s.priority))
                .collect();
            indexed.sort_by(|a, b| priority_rank(b.1).cmp(&priority_rank(a.1)));
            indexed.into_iter().map(|(i, _)| i).collect()
        };

        for idx in order {
            let maybe = {
                let slots = self.slots.lock();
                slots.get(idx).and_then(|s| s.delegate.clone())
            };
            if let Some(delegate) = maybe {
                if let Err(err) = delegate.invoke(args.clone()) {
                    tracing::warn!(?err, "signal subscriber invocation failed");
                }
            }
        }

        let depth = self.depth.fetch_sub(1, Ordering::SeqCst) - 1;
        if depth == 0 {
            self.slots.lock().retain(|s| s.delegate.is_some());
        }
    }
}

/// A shared-owned multicast (spec §3, §4.5). Clone it to share a handle to
/// the same underlying subscriber list; the last clone dropped tears the
/// list down, at which point any outstanding [`Connection`] becomes
/// [`Connection::is_connected`] == `false` (Inert) rather than panicking.
pub struct Signal<Args> {
    inner: Arc<SignalInner<Args>>,
}

impl<Args> Signal<Args> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                slots: Mutex::new(Vec::new()),
                depth: AtomicU32::new(0),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Subscribes `delegate` at `priority`, returning a plain (observing,
    /// `Clone`) [`Connection`]. Slots may be synchronous delegates or an
    /// L2 async wrapper bound via `bind_callable` — the signal itself
    /// neither knows nor cares.
    pub fn connect(&self, delegate: Delegate<Args, ()>, priority: Priority) -> Connection<Args> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.slots.lock().push(Slot {
            id,
            priority,
            delegate: Some(delegate),
        });
        Connection::new(Arc::downgrade(&self.inner), id)
    }

    /// Subscribes and wraps the returned connection in a move-only
    /// [`ScopedConnection`] that disconnects on drop (spec §4.5).
    pub fn connect_scoped(
        &self,
        delegate: Delegate<Args, ()>,
        priority: Priority,
    ) -> ScopedConnection<Args> {
        ScopedConnection::new(self.connect(delegate, priority))
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .slots
            .lock()
            .iter()
            .filter(|s| s.delegate.is_some())
            .count()
    }
}

impl<Args: Clone> Signal<Args> {
    /// Emits to every currently-connected subscriber, highest priority
    /// first (spec §4.5). Reentrant emission is allowed.
    pub fn emit(&self, args: Args) {
        self.inner.emit(args);
    }
}

impl<Args> Clone for Signal<Args> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn emits_in_priority_order_then_fifo() {
        let signal: Signal<(i32,)> = Signal::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = log.clone();
        signal.connect(
            Delegate::bind_callable(move |x: i32| l1.borrow_mut().push(("normal1", x))),
            Priority::Normal,
        );
        let l2 = log.clone();
        signal.connect(
            Delegate::bind_callable(move |x: i32| l2.borrow_mut().push(("high", x))),
            Priority::High,
        );
        let l3 = log.clone();
        signal.connect(
            Delegate::bind_callable(move |x: i32| l3.borrow_mut().push(("normal2", x))),
            Priority::Normal,
        );

        signal.emit((9,));
        assert_eq!(
            *log.borrow(),
            vec![("high", 9), ("normal1", 9), ("normal2", 9)]
        );
    }

    #[test]
    fn disconnect_stops_future_emissions() {
        let signal: Signal<(i32,)> = Signal::new();
        let calls = Rc::new(RefCell::new(0));
        let calls_inner = calls.clone();
        let conn = signal.connect(
            Delegate::bind_callable(move |_x: i32| *calls_inner.borrow_mut() += 1),
            Priority::Normal,
        );
        signal.emit((1,));
        assert_eq!(*calls.borrow(), 1);
        conn.disconnect();
        signal.emit((2,));
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn connection_goes_inert_when_signal_dropped() {
        let conn = {
            let signal: Signal<(i32,)> = Signal::new();
            signal.connect(Delegate::bind_callable(|_x: i32| {}), Priority::Normal)
        };
        assert!(!conn.is_connected());
        conn.disconnect(); // must not panic even though the signal is gone
    }
}
