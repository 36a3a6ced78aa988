//! TCP acceptor wiring accepted connections into the admission queue.

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::admission::AdmissionQueue;
use crate::core::error::AppResult;
use crate::core::scheduler::Scheduler;
use crate::net::conn::Connection;

/// A running scheduler server: worker pool, admission dispatcher, and TCP
/// acceptor, all long-lived.
pub struct Server {
    scheduler: Arc<Scheduler<Connection>>,
    admission: Arc<AdmissionQueue<Connection>>,
    local_addr: SocketAddr,
}

impl Server {
    /// Bind the listening socket and start every long-lived component.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration or if the socket cannot be bound,
    /// the only process-fatal condition; everything after this point is
    /// recovered per connection.
    pub fn start(config: &ServerConfig) -> AppResult<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid config: {e}"))?;

        let listener = TcpListener::bind(config.addr())
            .with_context(|| format!("failed to bind {}", config.addr()))?;
        let local_addr = listener.local_addr().context("listener has no local address")?;

        let scheduler = Arc::new(Scheduler::new(config.worker_count));
        scheduler.run_workers();

        let admission = Arc::new(AdmissionQueue::new());
        Arc::clone(&admission).run_dispatch(Arc::clone(&scheduler));

        {
            let admission = Arc::clone(&admission);
            thread::Builder::new()
                .name("ty-acceptor".into())
                .spawn(move || accept_loop(&listener, &admission))
                .context("failed to spawn acceptor thread")?;
        }

        info!(%local_addr, workers = config.worker_count, "server listening");
        Ok(Self {
            scheduler,
            admission,
            local_addr,
        })
    }

    /// Address the listener actually bound (resolves port `0`).
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle to the scheduler, for statistics and tests.
    #[must_use]
    pub fn scheduler(&self) -> &Arc<Scheduler<Connection>> {
        &self.scheduler
    }

    /// Number of connections waiting for admission.
    #[must_use]
    pub fn waiting_clients(&self) -> usize {
        self.admission.waiting_len()
    }

    /// Stop the dispatcher and the worker pool. The acceptor thread stays
    /// parked on `accept` until the process exits; std listeners have no
    /// cross-thread cancel.
    pub fn shutdown(&self) {
        self.admission.shutdown();
        self.scheduler.shutdown();
    }
}

fn accept_loop(listener: &TcpListener, admission: &Arc<AdmissionQueue<Connection>>) {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => match Connection::new(stream) {
                Ok(conn) => {
                    info!(peer = %conn.peer_addr(), "client connected");
                    admission.enqueue(conn);
                }
                Err(e) => warn!(error = %e, "failed to wrap accepted connection"),
            },
            Err(e) => warn!(error = %e, "accept failed"),
        }
    }
}
