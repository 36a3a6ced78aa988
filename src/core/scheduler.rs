//! Priority scheduler: bounded worker pool, wait/wake protocol, and
//! exactly-once batch completion detection.
//!
//! All queue mutation and the completion check share one mutex, so "queue is
//! empty" and "every worker is idle" are observed in the same critical
//! section. Workers block on a condvar when the queue drains instead of
//! polling.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::core::client::{ClientConn, CompletionCallback};
use crate::core::error::{SchedulerError, TaskError};
use crate::core::queue::PriorityQueue;
use crate::core::task::Task;

/// Sentinel written to a bound client when a batch finishes with no
/// completion callback registered.
pub const DONE_SENTINEL: &str = "200";

/// Mutable scheduler state. Everything the completion check reads or writes
/// lives behind the one mutex in [`Inner`].
struct SchedState<C> {
    queue: PriorityQueue,
    /// Tasks submitted since the last completed batch.
    batch_submitted: u64,
    /// Batch timer; `Some` iff a task has been submitted since the last full
    /// drain.
    started_at: Option<Instant>,
    /// Workers currently blocked waiting for work.
    idle_workers: usize,
    active_client: Option<C>,
    on_complete: Option<CompletionCallback<C>>,
    shutdown: bool,
}

/// Everything a declared completion needs once the lock is released.
struct FinishedBatch<C> {
    client: Option<C>,
    callback: Option<CompletionCallback<C>>,
    completed: u64,
    elapsed_ms: u64,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    interrupted: AtomicU64,
    batches: AtomicU64,
}

/// Snapshot of scheduler lifetime statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Tasks accepted by submit.
    pub submitted_tasks: u64,
    /// Tasks executed to an outcome, interrupted tasks included.
    pub completed_tasks: u64,
    /// Tasks that signalled interruption.
    pub interrupted_tasks: u64,
    /// Batches for which completion was declared.
    pub completed_batches: u64,
}

struct Inner<C> {
    state: Mutex<SchedState<C>>,
    /// Signaled on submit and on shutdown; workers block here while the
    /// queue is empty.
    work_available: Condvar,
    worker_count: usize,
    counters: Counters,
}

/// Priority scheduler owning the task queue and the worker pool.
///
/// One instance per process; handed by `Arc` to the admission and transport
/// components rather than reached through globals.
pub struct Scheduler<C: ClientConn> {
    inner: Arc<Inner<C>>,
    workers_running: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<C: ClientConn> Scheduler<C> {
    /// Create a scheduler whose pool will hold `worker_count` threads.
    ///
    /// # Panics
    ///
    /// Panics if `worker_count` is zero; configuration validation upstream
    /// rejects that before construction.
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be at least 1");
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SchedState {
                    queue: PriorityQueue::new(),
                    batch_submitted: 0,
                    started_at: None,
                    idle_workers: 0,
                    active_client: None,
                    on_complete: None,
                    shutdown: false,
                }),
                work_available: Condvar::new(),
                worker_count,
                counters: Counters::default(),
            }),
            workers_running: AtomicBool::new(false),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Number of worker threads the pool runs with.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.inner.worker_count
    }

    /// Insert a task into the queue for its priority level and signal one
    /// idle worker. Starts the batch timer if none is running. Always
    /// succeeds.
    pub fn submit(&self, task: Task) {
        {
            let mut state = self.inner.state.lock();
            self.push_task(&mut state, task);
        }
        self.inner.work_available.notify_one();
    }

    /// Submit a whole batch under one critical section, so the completion
    /// detector can never observe a partially submitted batch, then wake
    /// every idle worker.
    pub fn submit_batch(&self, tasks: Vec<Task>) {
        if tasks.is_empty() {
            return;
        }
        {
            let mut state = self.inner.state.lock();
            for task in tasks {
                self.push_task(&mut state, task);
            }
        }
        self.inner.work_available.notify_all();
    }

    fn push_task(&self, state: &mut SchedState<C>, task: Task) {
        if state.started_at.is_none() {
            state.started_at = Some(Instant::now());
        }
        state.batch_submitted += 1;
        debug!(task_id = task.id(), priority = task.priority(), "task submitted");
        state.queue.push(task);
        self.inner.counters.submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Remove and return the highest-priority task, FIFO within a level, or
    /// `None` when the queue is empty.
    pub fn try_take(&self) -> Option<Task> {
        self.inner.state.lock().queue.pop()
    }

    /// Spawn the worker pool. Calling again while workers are already
    /// running is a no-op.
    pub fn run_workers(&self) {
        if self.workers_running.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut workers = self.workers.lock();
        for worker_id in 0..self.inner.worker_count {
            let inner = Arc::clone(&self.inner);
            let handle = thread::Builder::new()
                .name(format!("ty-worker-{worker_id}"))
                .spawn(move || worker_loop(&inner, worker_id))
                .expect("failed to spawn worker thread");
            workers.push(handle);
        }
        info!(worker_count = self.inner.worker_count, "worker pool started");
    }

    /// Bind `conn` as the active client.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::SlotOccupied`] and leaves the existing
    /// binding untouched if a client is already bound.
    pub fn bind_active_client(&self, conn: C) -> Result<(), SchedulerError> {
        let mut state = self.inner.state.lock();
        if state.active_client.is_some() {
            warn!("refusing to bind a second active client");
            return Err(SchedulerError::SlotOccupied);
        }
        state.active_client = Some(conn);
        Ok(())
    }

    /// Clear the active client and any pending completion callback.
    pub fn unbind_active_client(&self) {
        let mut state = self.inner.state.lock();
        state.active_client = None;
        state.on_complete = None;
    }

    /// `true` while a client owns the notification channel.
    pub fn has_active_client(&self) -> bool {
        self.inner.state.lock().active_client.is_some()
    }

    /// Register the one-shot completion callback for the current batch,
    /// replacing any previously registered one (single subscriber). The
    /// callback is cleared once fired or when the active client is unbound.
    pub fn on_batch_complete<F>(&self, callback: F)
    where
        F: FnOnce(C, u64, u64) + Send + 'static,
    {
        self.inner.state.lock().on_complete = Some(Box::new(callback));
    }

    /// Lifetime statistics snapshot.
    pub fn stats(&self) -> SchedulerStats {
        let counters = &self.inner.counters;
        SchedulerStats {
            submitted_tasks: counters.submitted.load(Ordering::Relaxed),
            completed_tasks: counters.completed.load(Ordering::Relaxed),
            interrupted_tasks: counters.interrupted.load(Ordering::Relaxed),
            completed_batches: counters.batches.load(Ordering::Relaxed),
        }
    }

    /// Human-readable per-priority queue depths, highest level first.
    pub fn queue_summary(&self) -> String {
        let state = self.inner.state.lock();
        if state.queue.is_empty() {
            return "no queued tasks".into();
        }
        let parts: Vec<String> = state
            .queue
            .depths()
            .iter()
            .map(|(priority, depth)| format!("p{priority}:{depth}"))
            .collect();
        parts.join(" ")
    }

    /// Ask the workers to exit, wake them, and join their threads.
    pub fn shutdown(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
        }
        self.inner.work_available.notify_all();
        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked during shutdown");
            }
        }
        debug!("worker pool shut down");
    }
}

impl<C: ClientConn> Drop for Scheduler<C> {
    fn drop(&mut self) {
        // Signal shutdown but don't join: workers are detached and exit on
        // their next wakeup. Explicit shutdown() is required for a joined
        // stop.
        let mut state = self.inner.state.lock();
        if !state.shutdown {
            state.shutdown = true;
            drop(state);
            self.inner.work_available.notify_all();
            debug!("scheduler dropped without explicit shutdown; workers detached");
        }
    }
}

fn worker_loop<C: ClientConn>(inner: &Arc<Inner<C>>, worker_id: usize) {
    debug!(worker_id, "worker thread started");
    let mut state = inner.state.lock();
    loop {
        if state.shutdown {
            break;
        }

        if let Some(task) = state.queue.pop() {
            MutexGuard::unlocked(&mut state, || run_task(inner, worker_id, task));
            continue;
        }

        // Queue drained: this worker goes idle. The emptiness observation,
        // the idle count, and the completion declaration all happen without
        // releasing the state lock, so two workers can never both conclude
        // they were last out, and a submission cannot slip between the
        // checks.
        state.idle_workers += 1;
        if state.queue.is_empty()
            && state.idle_workers == inner.worker_count
            && state.batch_submitted > 0
        {
            let finished = declare_completion(&mut state, inner);
            MutexGuard::unlocked(&mut state, || notify_completion(finished));
        }
        while !state.shutdown && state.queue.is_empty() {
            inner.work_available.wait(&mut state);
        }
        state.idle_workers -= 1;
    }
    debug!(worker_id, "worker thread exiting");
}

/// Reset batch state and extract everything the notification needs. Runs
/// under the state lock; the returned value is delivered outside it.
fn declare_completion<C: ClientConn>(
    state: &mut SchedState<C>,
    inner: &Inner<C>,
) -> FinishedBatch<C> {
    let elapsed_ms = state
        .started_at
        .take()
        .map_or(0, |t| u64::try_from(t.elapsed().as_millis()).unwrap_or(u64::MAX));
    let completed = state.batch_submitted;
    state.batch_submitted = 0;
    inner.counters.batches.fetch_add(1, Ordering::Relaxed);
    FinishedBatch {
        client: state.active_client.take(),
        callback: state.on_complete.take(),
        completed,
        elapsed_ms,
    }
}

fn notify_completion<C: ClientConn>(finished: FinishedBatch<C>) {
    info!(
        completed = finished.completed,
        elapsed_ms = finished.elapsed_ms,
        "batch complete"
    );
    let Some(client) = finished.client else {
        debug!("batch finished with no active client; result dropped");
        return;
    };
    if let Some(callback) = finished.callback {
        callback(client, finished.completed, finished.elapsed_ms);
    } else {
        if let Err(e) = client.send_text(DONE_SENTINEL) {
            warn!(error = %e, "failed to write completion sentinel");
        }
        let _ = client.close();
    }
}

fn run_task<C: ClientConn>(inner: &Inner<C>, worker_id: usize, task: Task) {
    let task_id = task.id();
    let priority = task.priority();
    let duration_ms = u64::try_from(task.duration().as_millis()).unwrap_or(u64::MAX);
    debug!(worker_id, task_id, priority, duration_ms, "executing task");

    // The worker loop must survive any single task, interrupted or worse.
    match panic::catch_unwind(AssertUnwindSafe(move || task.execute())) {
        Ok(Ok(())) => debug!(worker_id, task_id, "task completed"),
        Ok(Err(TaskError::Interrupted)) => {
            inner.counters.interrupted.fetch_add(1, Ordering::Relaxed);
            warn!(worker_id, task_id, priority, "task interrupted");
        }
        Err(_) => error!(worker_id, task_id, "task panicked; worker continues"),
    }
    inner.counters.completed.fetch_add(1, Ordering::Relaxed);
}
