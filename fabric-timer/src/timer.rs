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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fabric_core::{Delegate, Multicast};
use parking_lot::Mutex;

use crate::registry;

/// A record with an interval, a one-shot flag, an enabled flag, a
/// last-expiration timestamp, and a multicast of zero-argument delegates
/// (spec §3, §4.8). Constructed only via [`Timer::new`], which registers
/// a weak reference with the process-wide registry so [`crate::process_all`]
/// can find it; dropping every `Arc<Timer>` lets the registry prune it on
/// its next pass.
pub struct Timer {
    name: String,
    interval: Mutex<Duration>,
    once: AtomicBool,
    enabled: AtomicBool,
    last_expire: Mutex<Instant>,
    subscribers: Multicast<()>,
}

impl Timer {
    /// Creates a disabled timer and registers it with the process-wide
    /// registry (spec §9: "registries register on construction,
    /// deregister on destruction").
    #[must_use]
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let timer = Arc::new(Self {
            name: name.into(),
            interval: Mutex::new(Duration::ZERO),
            once: AtomicBool::new(false),
            enabled: AtomicBool::new(false),
            last_expire: Mutex::new(Instant::now()),
            subscribers: Multicast::new(),
        });
        registry::register(Arc::downgrade(&timer));
        timer
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subscribes a zero-argument delegate to this timer's ticks.
    pub fn on_tick(&self, delegate: Delegate<(), ()>) {
        self.subscribers.add(delegate);
    }

    pub fn remove_subscriber(&self, delegate: &Delegate<(), ()>) {
        self.subscribers.remove(delegate);
    }

    /// Records the expiration baseline and enables the timer (spec
    /// §4.8). May be called again after `stop()` to rearm it.
    pub fn start(&self, interval: Duration, once: bool) {
        *self.interval.lock() = interval;
        self.once.store(once, Ordering::SeqCst);
        *self.last_expire.lock() = Instant::now();
        self.enabled.store(true, Ordering::SeqCst);
    }

    /// Marks the timer disabled; it stops ticking but stays registered.
    pub fn stop(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_one_shot(&self) -> bool {
        self.once.load(Ordering::SeqCst)
    }

    /// Called by [`crate::process_all`] for each registered timer still
    /// alive. Fires the subscriber multicast if `now - last_expire >=
    /// interval`; advances or resyncs the baseline per spec §4.8.
    pub(crate) fn tick(&self, now: Instant) {
        if !self.enabled.load(Ordering::SeqCst) {
            return;
        }
        let interval = *self.interval.lock();
        if interval.is_zero() {
            return;
        }

        let mut last = self.last_expire.lock();
        if now.duration_since(*last) < interval {
            return;
        }

        self.subscribers.broadcast(());

        if self.once.load(Ordering::SeqCst) {
            drop(last);
            self.enabled.store(false, Ordering::SeqCst);
            return;
        }

        let drift = now.duration_since(*last);
        if drift > interval.saturating_mul(2) {
            tracing::warn!(
                timer = %self.name,
                drift_ms = drift.as_millis(),
                "timer falling behind, resyncing last_expire to now"
            );
            *last = now;
        } else {
            *last += interval;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_core::Delegate;
    use serial_test::serial;
    use std::sync::atomic::AtomicU32;
    use std::thread;

    #[test]
    #[serial]
    fn fires_after_interval_elapses() {
        let timer = Timer::new("t1");
        let count = Arc::new(AtomicU32::new(0));
        let count_inner = count.clone();
        timer.on_tick(Delegate::bind_callable(move || {
            count_inner.fetch_add(1, Ordering::SeqCst);
        }));
        timer.start(Duration::from_millis(10), false);

        thread::sleep(Duration::from_millis(15));
        timer.tick(Instant::now());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        timer.stop();
    }

    #[test]
    #[serial]
    fn one_shot_disables_after_first_fire() {
        let timer = Timer::new("t2");
        let count = Arc::new(AtomicU32::new(0));
        let count_inner = count.clone();
        timer.on_tick(Delegate::bind_callable(move || {
            count_inner.fetch_add(1, Ordering::SeqCst);
        }));
        timer.start(Duration::from_millis(5), true);

        let t1 = Instant::now() + Duration::from_millis(10);
        timer.tick(t1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!timer.is_enabled());

        let t2 = t1 + Duration::from_millis(10);
        timer.tick(t2);
        assert_eq!(count.load(Ordering::SeqCst), 1, "one-shot must not fire twice");
    }

    #[test]
    #[serial]
    fn falling_behind_resyncs_rather_than_bursts() {
        let timer = Timer::new("t3");
        let count = Arc::new(AtomicU32::new(0));
        let count_inner = count.clone();
        timer.on_tick(Delegate::bind_callable(move || {
            count_inner.fetch_add(1, Ordering::SeqCst);
        }));
        let interval = Duration::from_millis(10);
        timer.start(interval, false);

        // Simulate `process_all` being called far later than 2x interval:
        // the timer should fire once and resync, not replay 5 ticks.
        let far_future = Instant::now() + Duration::from_millis(100);
        timer.tick(far_future);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        timer.stop();
    }

    #[test]
    #[serial]
    fn disabled_timer_does_not_fire() {
        let timer = Timer::new("t4");
        let count = Arc::new(AtomicU32::new(0));
        let count_inner = count.clone();
        timer.on_tick(Delegate::bind_callable(move || {
            count_inner.fetch_add(1, Ordering::SeqCst);
        }));
        timer.start(Duration::from_millis(5), false);
        timer.stop();

        timer.tick(Instant::now() + Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
