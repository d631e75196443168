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

//! L6 thread: a named worker owning a strict-priority FIFO queue (spec
//! §4.6). Three lanes (High, Normal, Low) are drained with the high lane
//! always checked first; within one lane, order is FIFO.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fabric_core::{FabricError, FabricResult, Priority};
use parking_lot::Mutex;

/// What `enqueue` does when the target lane's bounded queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueuePolicy {
    /// Return `Err(QueueFull)` immediately (spec §5 "reject-with-error").
    #[default]
    RejectWithError,
    /// Block the calling thread until space is available ("block-until-space").
    /// Panics if called from inside the target thread's own runtime — it
    /// would deadlock the worker against itself.
    BlockUntilSpace,
    /// Silently discard the newest job ("drop-newest"). Any attached
    /// completion slot is cancelled as if the thread had shut down.
    DropNewest,
}

#[derive(Clone, Copy, Debug)]
pub struct ThreadOptions {
    /// `None` means an effectively unbounded queue.
    pub queue_capacity: Option<usize>,
    pub watchdog: Option<Duration>,
    pub queue_policy: QueuePolicy,
}

impl Default for ThreadOptions {
    fn default() -> Self {
        Self {
            queue_capacity: None,
            watchdog: None,
            queue_policy: QueuePolicy::RejectWithError,
        }
    }
}

/// A job queued onto a [`Thread`]: the actual invocation plus what to run
/// instead if the job is discarded without being invoked (dropped due to
/// `stop()` draining the queue, or `DropNewest`). `cancel` is how a
/// blocking caller's Completion Slot is signaled `Cancelled` rather than
/// left to hang forever (spec §4.6 `stop()`).
pub(crate) struct QueuedJob {
    pub(crate) run: Box<dyn FnOnce() + Send + 'static>,
    pub(crate) cancel: Box<dyn FnOnce() + Send + 'static>,
}

enum WorkerMsg {
    Job(QueuedJob),
    Exit,
}

enum LaneSender {
    Bounded(tokio::sync::mpsc::Sender<WorkerMsg>),
    Unbounded(tokio::sync::mpsc::UnboundedSender<WorkerMsg>),
}

impl LaneSender {
    fn try_send(&self, msg: WorkerMsg) -> Result<(), WorkerMsg> {
        match self {
            LaneSender::Bounded(tx) => tx.try_send(msg).map_err(|e| match e {
                tokio::sync::mpsc::error::TrySendError::Full(m)
                | tokio::sync::mpsc::error::TrySendError::Closed(m) => m,
            }),
            LaneSender::Unbounded(tx) => tx.send(msg).map_err(|e| e.0),
        }
    }

    fn blocking_send(&self, msg: WorkerMsg) -> Result<(), WorkerMsg> {
        match self {
            LaneSender::Bounded(tx) => tx.blocking_send(msg).map_err(|e| e.0),
            LaneSender::Unbounded(tx) => tx.send(msg).map_err(|e| e.0),
        }
    }
}

enum LaneReceiver {
    Bounded(tokio::sync::mpsc::Receiver<WorkerMsg>),
    Unbounded(tokio::sync::mpsc::UnboundedReceiver<WorkerMsg>),
}

impl LaneReceiver {
    async fn recv(&mut self) -> Option<WorkerMsg> {
        match self {
            LaneReceiver::Bounded(rx) => rx.recv().await,
            LaneReceiver::Unbounded(rx) => rx.recv().await,
        }
    }

    fn try_recv(&mut self) -> Option<WorkerMsg> {
        match self {
            LaneReceiver::Bounded(rx) => rx.try_recv().ok(),
            LaneReceiver::Unbounded(rx) => rx.try_recv().ok(),
        }
    }
}

fn make_lane(capacity: Option<usize>) -> (LaneSender, LaneReceiver) {
    match capacity {
        Some(cap) => {
            let (tx, rx) = tokio::sync::mpsc::channel(cap.max(1));
            (LaneSender::Bounded(tx), LaneReceiver::Bounded(rx))
        }
        None => {
            let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
            (LaneSender::Unbounded(tx), LaneReceiver::Unbounded(rx))
        }
    }
}

struct Lanes {
    high: LaneSender,
    normal: LaneSender,
    low: LaneSender,
}

/// A named worker thread with a strict-priority FIFO message queue (spec
/// §3, §4.6). Owns a dedicated OS thread running a single-threaded tokio
/// runtime purely to drive the priority `select!` loop; no user code is
/// required to be async.
pub struct Thread {
    name: String,
    lanes: Lanes,
    running: Arc<AtomicBool>,
    os_thread_id: std::thread::ThreadId,
    join_handle: Mutex<Option<std::thread::JoinHandle<()>>>,
    queue_policy: QueuePolicy,
    queue_capacity: Option<usize>,
}

impl Thread {
    /// Spawns the worker OS thread; blocks the caller until the worker has
    /// signaled "started" (spec §4.6), so that a successful return
    /// guarantees `enqueue` will succeed against a live worker.
    #[must_use]
    pub fn start(name: impl Into<String>, options: ThreadOptions) -> Arc<Self> {
        let name = name.into();
        let (high_tx, high_rx) = make_lane(options.queue_capacity);
        let (normal_tx, normal_rx) = make_lane(options.queue_capacity);
        let (low_tx, low_rx) = make_lane(options.queue_capacity);

        let running = Arc::new(AtomicBool::new(false));
        let running_for_worker = running.clone();
        let worker_name = name.clone();
        let watchdog = options.watchdog;

        let (started_tx, started_rx) = std::sync::mpsc::channel::<()>();

        let join_handle = std::thread::Builder::new()
            .name(format!("fabric-thread:{name}"))
            .spawn(move || {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed to build worker runtime");
                running_for_worker.store(true, Ordering::SeqCst);
                let _ = started_tx.send(());
                rt.block_on(worker_loop(
                    high_rx,
                    normal_rx,
                    low_rx,
                    running_for_worker,
                    worker_name,
                    watchdog,
                ));
            })
            .expect("failed to spawn fabric worker OS thread");

        started_rx
            .recv()
            .expect("worker thread died before signaling started");

        Arc::new(Self {
            name,
            lanes: Lanes {
                high: high_tx,
                normal: normal_tx,
                low: low_tx,
            },
            running,
            os_thread_id: join_handle.thread().id(),
            join_handle: Mutex::new(Some(join_handle)),
            queue_policy: options.queue_policy,
            queue_capacity: options.queue_capacity,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn id(&self) -> std::thread::ThreadId {
        self.os_thread_id
    }

    #[must_use]
    pub fn current_thread_id() -> std::thread::ThreadId {
        std::thread::current().id()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn enqueue_job(&self, priority: Priority, job: QueuedJob) -> FabricResult<()> {
        if !self.is_running() {
            return Err(FabricError::ThreadNotRunning {
                thread_name: self.name.clone(),
            });
        }
        let lane = match priority {
            Priority::High => &self.lanes.high,
            Priority::Normal => &self.lanes.normal,
            Priority::Low => &self.lanes.low,
        };
        let msg = WorkerMsg::Job(job);
        let result = match self.queue_policy {
            QueuePolicy::RejectWithError => lane.try_send(msg),
            QueuePolicy::BlockUntilSpace => lane.blocking_send(msg),
            QueuePolicy::DropNewest => match lane.try_send(msg) {
                Ok(()) => Ok(()),
                Err(WorkerMsg::Job(dropped)) => {
                    (dropped.cancel)();
                    return Ok(());
                }
                Err(WorkerMsg::Exit) => unreachable!("Exit is never constructed here"),
            },
        };
        result.map_err(|_| FabricError::QueueFull {
            thread_name: self.name.clone(),
            capacity: self.queue_capacity.unwrap_or(0),
        })
    }

    /// Enqueues an Exit sentinel at Normal priority and joins the worker
    /// (spec §4.6). Any job still sitting in a lane when the sentinel is
    /// processed is dropped without invocation; its `cancel` runs instead.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            let _ = self.lanes.normal.try_send(WorkerMsg::Exit);
        }
        if let Some(handle) = self.join_handle.lock().take() {
            let _ = handle.join();
        }
    }
}

async fn worker_loop(
    mut high: LaneReceiver,
    mut normal: LaneReceiver,
    mut low: LaneReceiver,
    running: Arc<AtomicBool>,
    name: String,
    watchdog: Option<Duration>,
) {
    tracing::debug!(thread = %name, "fabric worker started");
    loop {
        let msg = tokio::select! {
            biased;
            Some(m) = high.recv() => m,
            Some(m) = normal.recv() => m,
            Some(m) = low.recv() => m,
            else => break,
        };

        match msg {
            WorkerMsg::Exit => {
                tracing::debug!(thread = %name, "fabric worker draining for exit");
                running.store(false, Ordering::SeqCst);
                drain_and_cancel(&mut high);
                drain_and_cancel(&mut normal);
                drain_and_cancel(&mut low);
                break;
            }
            WorkerMsg::Job(job) => {
                let start = Instant::now();
                (job.run)();
                if let Some(wd) = watchdog {
                    let elapsed = start.elapsed();
                    if elapsed > wd {
                        tracing::warn!(thread = %name, ?elapsed, ?wd, "watchdog exceeded");
                    }
                }
            }
        }
    }
    tracing::debug!(thread = %name, "fabric worker stopped");
}

fn drain_and_cancel(lane: &mut LaneReceiver) {
    while let Some(msg) = lane.try_recv() {
        if let WorkerMsg::Job(job) = msg {
            (job.cancel)();
        }
    }
}
