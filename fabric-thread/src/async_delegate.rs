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

//! L2 async wrapper (spec §4.2): marshals a call across a thread boundary.
//!
//! The Completion Slot for blocking variants is a plain
//! `std::sync::mpsc` one-shot channel rather than anything tokio-specific,
//! so a blocking caller never needs to be inside an async context itself —
//! it just calls `recv`/`recv_timeout` like any other blocking API. The
//! channel's own reference counting gives us the race rule from spec §5 for
//! free: if the caller times out and drops its receiver, the worker's
//! later `send` simply returns an ignored error instead of panicking or
//! blocking.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use fabric_core::{Delegate, FabricError, FabricResult, Priority};

use crate::thread::{QueuedJob, Thread};

/// How an [`AsyncDelegate::invoke`] call waits for completion.
#[derive(Debug, Clone, Copy)]
pub enum WaitPolicy {
    /// Fire-and-forget: enqueue and return immediately with a default `R`.
    NonBlocking,
    /// Block until the target thread has invoked the delegate.
    BlockingInfinite,
    /// Block up to `Duration`; past it, report `Timeout` and return a
    /// default `R` (spec §4.2, §5 race rule).
    BlockingWithDeadline(Duration),
}

/// Wraps an L1 [`Delegate`] with a target [`Thread`] and a [`WaitPolicy`]
/// (spec §4.2).
#[derive(Clone)]
pub struct AsyncDelegate<Args, R> {
    delegate: Delegate<Args, R>,
    thread: Arc<Thread>,
    policy: WaitPolicy,
    priority: Priority,
    /// Outcome of the most recent [`AsyncDelegate::invoke`] call. `invoke`
    /// itself never returns `Err` (spec §5: blocking waits return a
    /// default `R` on any failure); the failure, if any, lands here
    /// instead so a caller that cares can ask for it after the fact.
    status: Arc<Mutex<FabricResult<()>>>,
}

impl<Args, R> AsyncDelegate<Args, R>
where
    Args: Clone + Send + 'static,
    R: Default + Send + 'static,
{
    #[must_use]
    pub fn new(delegate: Delegate<Args, R>, thread: Arc<Thread>, policy: WaitPolicy) -> Self {
        Self {
            delegate,
            thread,
            policy,
            priority: Priority::default(),
            status: Arc::new(Mutex::new(Ok(()))),
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// The outcome of the most recently completed [`invoke`](Self::invoke)
    /// call: `Ok(())` if it ran the delegate to completion, or the
    /// `FabricError` that made `invoke` fall back to a default `R`.
    #[must_use]
    pub fn status(&self) -> FabricResult<()> {
        self.status.lock().clone()
    }

    /// Spec §4.2 contract:
    /// 1. Fast path: if the caller is already running on the target
    ///    thread, call the L1 delegate directly.
    /// 2. Otherwise marshal a Delegate Message (a clone of the delegate
    ///    plus owned copies of the arguments) onto the target thread.
    ///
    /// Always returns `R`; on any failure (queue full, thread not
    /// running, timeout, cancellation) it records the cause in
    /// [`status`](Self::status) and returns `R::default()` instead
    /// (spec §5).
    pub fn invoke(&self, args: Args) -> R {
        let result = if Thread::current_thread_id() == self.thread.id() {
            self.delegate.invoke(args)
        } else {
            match self.policy {
                WaitPolicy::NonBlocking => self.invoke_non_blocking(args),
                WaitPolicy::BlockingInfinite => self.invoke_blocking(args, None),
                WaitPolicy::BlockingWithDeadline(d) => self.invoke_blocking(args, Some(d)),
            }
        };

        match result {
            Ok(r) => {
                *self.status.lock() = Ok(());
                r
            }
            Err(err) => {
                *self.status.lock() = Err(err);
                R::default()
            }
        }
    }

    fn invoke_non_blocking(&self, args: Args) -> FabricResult<R> {
        let delegate = self.delegate.clone();
        let job = QueuedJob {
            run: Box::new(move || {
                if let Err(err) = delegate.invoke(args) {
                    tracing::warn!(?err, "fire-and-forget async delegate invocation failed");
                }
            }),
            cancel: Box::new(|| {}),
        };
        self.thread.enqueue_job(self.priority, job)?;
        Ok(R::default())
    }

    fn invoke_blocking(&self, args: Args, deadline: Option<Duration>) -> FabricResult<R> {
        let (tx, rx) = std::sync::mpsc::channel::<FabricResult<R>>();
        let tx_cancel = tx.clone();
        let delegate = self.delegate.clone();

        let job = QueuedJob {
            run: Box::new(move || {
                let result = delegate.invoke(args);
                let _ = tx.send(result);
            }),
            cancel: Box::new(move || {
                let _ = tx_cancel.send(Err(FabricError::Cancelled));
            }),
        };
        self.thread.enqueue_job(self.priority, job)?;

        match deadline {
            None => rx.recv().unwrap_or(Err(FabricError::Cancelled)),
            Some(d) => match rx.recv_timeout(d) {
                Ok(result) => result,
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => Err(FabricError::Timeout(d)),
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                    Err(FabricError::Cancelled)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::ThreadOptions;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::thread;

    #[test]
    fn fire_and_forget_runs_on_target_thread() {
        let t = Thread::start("s2", ThreadOptions::default());
        let observed_tid = Arc::new(std::sync::Mutex::new(None));
        let observed_value = Arc::new(AtomicI32::new(0));

        let observed_tid_inner = observed_tid.clone();
        let observed_value_inner = observed_value.clone();
        let delegate: Delegate<(i32,), ()> = Delegate::bind_callable(move |v: i32| {
            *observed_tid_inner.lock().unwrap() = Some(Thread::current_thread_id());
            observed_value_inner.store(v, Ordering::SeqCst);
        });

        let async_d = AsyncDelegate::new(delegate, t.clone(), WaitPolicy::NonBlocking);
        let ret = async_d.invoke((42,));
        assert_eq!(ret, ());
        assert_eq!(async_d.status(), Ok(()));

        t.stop();
        assert_eq!(observed_value.load(Ordering::SeqCst), 42);
        assert_eq!(*observed_tid.lock().unwrap(), Some(t.id()));
        assert_ne!(Some(thread::current().id()), *observed_tid.lock().unwrap());
    }

    #[test]
    fn blocking_infinite_returns_value_from_target_thread() {
        let t = Thread::start("s3", ThreadOptions::default());
        fn add(a: i32, b: i32) -> i32 {
            a + b
        }
        let delegate = Delegate::bind_free(add);
        let async_d = AsyncDelegate::new(delegate, t.clone(), WaitPolicy::BlockingInfinite);
        let result = async_d.invoke((2, 3));
        assert_eq!(result, 5);
        assert_eq!(async_d.status(), Ok(()));
        t.stop();
    }

    #[test]
    fn timeout_races_target_completion_without_crashing() {
        let t = Thread::start("s4", ThreadOptions::default());
        let delegate: Delegate<(), i32> = Delegate::bind_callable(|| {
            thread::sleep(Duration::from_millis(300));
            7
        });
        let async_d = AsyncDelegate::new(
            delegate,
            t.clone(),
            WaitPolicy::BlockingWithDeadline(Duration::from_millis(20)),
        );
        let result = async_d.invoke(());
        assert_eq!(result, i32::default());
        assert!(matches!(async_d.status(), Err(FabricError::Timeout(_))));
        // Give the target's slow call time to finish; it must not panic or
        // otherwise disturb the thread even though the caller moved on.
        thread::sleep(Duration::from_millis(400));
        t.stop();
    }

    #[test]
    fn fast_path_runs_synchronously_when_already_on_target() {
        let t = Thread::start("s5", ThreadOptions::default());
        let t2 = t.clone();
        let job_ran = Arc::new(AtomicI32::new(0));
        let job_ran_inner = job_ran.clone();

        let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
        t.enqueue_job(
            Priority::Normal,
            crate::thread::QueuedJob {
                run: Box::new(move || {
                    fn double(x: i32) -> i32 {
                        x * 2
                    }
                    let delegate = Delegate::bind_free(double);
                    let async_d =
                        AsyncDelegate::new(delegate, t2.clone(), WaitPolicy::BlockingInfinite);
                    let r = async_d.invoke((21,));
                    job_ran_inner.store(r, Ordering::SeqCst);
                    let _ = done_tx.send(());
                }),
                cancel: Box::new(|| {}),
            },
        )
        .unwrap();

        done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(job_ran.load(Ordering::SeqCst), 42);
        t.stop();
    }
}
