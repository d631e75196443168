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

//! Process-wide registry of live [`crate::Timer`]s (spec §4.8, §9).
//!
//! Timers register a weak reference at construction time; nothing ever
//! deregisters explicitly, since the registry only holds `Weak<Timer>`
//! and prunes dead entries as it encounters them. This is the Open
//! Question from spec §9 resolved: a timer can never be re-registered
//! under a new identity, only constructed once via `Timer::new`.

use std::sync::{Arc, OnceLock, Weak};
use std::time::Instant;

use parking_lot::Mutex;

use crate::timer::Timer;

#[derive(Default)]
pub(crate) struct Registry {
    timers: Mutex<Vec<Weak<Timer>>>,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::default)
}

pub(crate) fn register(timer: Weak<Timer>) {
    registry().timers.lock().push(timer);
}

/// Ticks every registered timer still alive, in registration order, and
/// drops dead weak references. Intended to be called periodically, e.g.
/// from a dedicated timer thread's loop (spec §4.8).
pub fn process_all() {
    let snapshot: Vec<Weak<Timer>> = registry().timers.lock().clone();
    let now = Instant::now();

    let mut dead = false;
    for weak in &snapshot {
        match weak.upgrade() {
            Some(timer) => timer.tick(now),
            None => dead = true,
        }
    }

    if dead {
        registry()
            .timers
            .lock()
            .retain(|w| Weak::strong_count(w) > 0);
    }
}

/// Number of timers currently registered, alive or not yet pruned. Exposed
/// for tests.
#[must_use]
pub fn registered_count() -> usize {
    registry().timers.lock().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Timer;
    use fabric_core::Delegate;
    use serial_test::serial;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[test]
    #[serial]
    fn process_all_ticks_every_live_timer() {
        let before = registered_count();
        let t1 = Timer::new("r1");
        let t2 = Timer::new("r2");
        let count = Arc::new(AtomicU32::new(0));

        let c1 = count.clone();
        t1.on_tick(Delegate::bind_callable(move || {
            c1.fetch_add(1, Ordering::SeqCst);
        }));
        let c2 = count.clone();
        t2.on_tick(Delegate::bind_callable(move || {
            c2.fetch_add(1, Ordering::SeqCst);
        }));

        t1.start(Duration::from_millis(1), false);
        t2.start(Duration::from_millis(1), false);
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(registered_count(), before + 2);
        process_all();
        assert_eq!(count.load(Ordering::SeqCst), 2);

        t1.stop();
        t2.stop();
    }

    #[test]
    #[serial]
    fn dropped_timer_is_pruned_from_registry() {
        let before = registered_count();
        {
            let t = Timer::new("r3");
            t.start(Duration::from_millis(1), false);
            assert_eq!(registered_count(), before + 1);
        }
        // `t` is dropped; its Arc's strong count reaches zero. A pass over
        // the registry should prune the dead Weak.
        process_all();
        assert_eq!(registered_count(), before);
    }
}
