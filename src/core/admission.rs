//! Admission queue: serializes waiting client connections into the
//! scheduler's single active-client slot.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::client::ClientConn;
use crate::core::descriptor::BatchDescriptor;
use crate::core::factory::TaskFactory;
use crate::core::scheduler::{Scheduler, DONE_SENTINEL};

/// Response token written to a client whose submission could not be parsed.
pub const BAD_DATA: &str = "BAD DATA";

/// Fallback poll interval for the dispatch loop. Enqueued connections and a
/// freed active-client slot wake the loop immediately through the wake
/// channel; the timeout only bounds latency if a wake is ever missed.
const DISPATCH_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// FIFO of waiting client connections plus the wake channel driving the
/// dispatch loop.
///
/// The waiting list is its own exclusion domain, independent of the
/// scheduler's state lock. A connection is dequeued, read, and bound at most
/// once; at most one connection is active at any time.
pub struct AdmissionQueue<C: ClientConn> {
    waiting: Mutex<VecDeque<C>>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
    shutdown: AtomicBool,
}

impl<C: ClientConn> Default for AdmissionQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ClientConn> AdmissionQueue<C> {
    /// Create an empty admission queue.
    #[must_use]
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = unbounded();
        Self {
            waiting: Mutex::new(VecDeque::new()),
            wake_tx,
            wake_rx,
            shutdown: AtomicBool::new(false),
        }
    }

    /// Append a newly accepted connection to the waiting list and wake the
    /// dispatcher. Safe against concurrent accepts and dispatch drains.
    pub fn enqueue(&self, conn: C) {
        let position = {
            let mut waiting = self.waiting.lock();
            waiting.push_back(conn);
            waiting.len()
        };
        debug!(position, "connection queued for admission");
        let _ = self.wake_tx.send(());
    }

    /// Number of connections currently waiting for admission.
    pub fn waiting_len(&self) -> usize {
        self.waiting.lock().len()
    }

    /// Stop the dispatch loop after its current iteration.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        let _ = self.wake_tx.send(());
    }

    /// Run the dispatch loop on a dedicated thread.
    ///
    /// The loop admits the next waiting connection whenever the scheduler's
    /// active-client slot is free, reads and parses its descriptor, and
    /// submits the expanded batch. The registered completion callback writes
    /// the final report to the client, closes it, and signals this loop that
    /// the slot is free again.
    pub fn run_dispatch(self: Arc<Self>, scheduler: Arc<Scheduler<C>>) -> JoinHandle<()> {
        thread::Builder::new()
            .name("ty-admission".into())
            .spawn(move || {
                info!("admission dispatcher started");
                loop {
                    if self.shutdown.load(Ordering::Acquire) {
                        break;
                    }
                    self.dispatch_ready(&scheduler);
                    match self.wake_rx.recv_timeout(DISPATCH_POLL_INTERVAL) {
                        Ok(()) | Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("admission dispatcher exiting");
            })
            .expect("failed to spawn admission thread")
    }

    /// Admit waiting connections for as long as the active-client slot stays
    /// free; a successfully submitted batch occupies it and ends the loop.
    fn dispatch_ready(&self, scheduler: &Scheduler<C>) {
        while !scheduler.has_active_client() {
            let Some(conn) = self.waiting.lock().pop_front() else {
                return;
            };
            self.admit(scheduler, conn);
        }
    }

    fn admit(&self, scheduler: &Scheduler<C>, conn: C) {
        let batch_id = Uuid::new_v4();
        if scheduler.bind_active_client(conn.clone()).is_err() {
            // Slot raced away; the connection keeps its place in line.
            self.waiting.lock().push_front(conn);
            return;
        }
        info!(%batch_id, "client admitted as active");

        let wake = self.wake_tx.clone();
        scheduler.on_batch_complete(move |client: C, completed, elapsed_ms| {
            let line = format!("{completed} tasks completed in {elapsed_ms}\n");
            if let Err(e) = client
                .send_text(&line)
                .and_then(|()| client.send_text(DONE_SENTINEL))
            {
                warn!(%batch_id, error = %e, "failed to write completion response");
            }
            let _ = client.close();
            info!(%batch_id, completed, elapsed_ms, "batch reported to client");
            let _ = wake.send(());
        });

        let payload = match conn.read_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%batch_id, error = %e, "failed to read descriptor");
                let _ = conn.close();
                scheduler.unbind_active_client();
                let _ = self.wake_tx.send(());
                return;
            }
        };

        match BatchDescriptor::from_json_str(&payload) {
            Ok(descriptor) => {
                let tasks = TaskFactory::expand(&descriptor);
                if tasks.is_empty() {
                    // A zero-count batch would never drain into a completion
                    // and would wedge the slot.
                    self.reject(scheduler, &conn, batch_id, "descriptor expands to no tasks");
                    return;
                }
                debug!(%batch_id, count = tasks.len(), "submitting batch");
                scheduler.submit_batch(tasks);
                debug!(%batch_id, queues = %scheduler.queue_summary(), "batch queued");
            }
            Err(e) => self.reject(scheduler, &conn, batch_id, &e.to_string()),
        }
    }

    fn reject(&self, scheduler: &Scheduler<C>, conn: &C, batch_id: Uuid, reason: &str) {
        warn!(%batch_id, reason, "rejecting submission");
        if let Err(e) = conn.send_text(BAD_DATA) {
            warn!(%batch_id, error = %e, "failed to write error response");
        }
        let _ = conn.close();
        scheduler.unbind_active_client();
        let _ = self.wake_tx.send(());
    }
}
