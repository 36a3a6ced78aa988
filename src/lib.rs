//! # Taskyard
//!
//! An admission-controlled priority batch scheduler over TCP.
//!
//! Clients connect, submit one batch descriptor, and wait: the server
//! synthesizes the described tasks, runs them on a bounded pool of worker
//! threads in strict priority order, and reports aggregate completion back to
//! the submitting client. Only one client's batch is owned by the scheduler
//! at a time; additional clients queue FIFO for their turn.
//!
//! ## Core Problem Solved
//!
//! Batch workloads with mixed urgency need three guarantees that are easy to
//! get wrong together:
//!
//! - **Strict priority ordering**: a lower-priority task never starts while a
//!   higher-priority task is queued (FIFO within a level, no preemption)
//! - **Race-free completion detection**: "queue empty and every worker idle"
//!   is checked in the same critical section as queue mutation, so completion
//!   fires exactly once per batch
//! - **Serialized admission**: one active client owns the notification
//!   channel; everyone else waits their turn
//!
//! ## Key Components
//!
//! - [`core::Scheduler`] - priority queue, worker pool, wait/wake protocol,
//!   and the all-idle completion detector
//! - [`core::AdmissionQueue`] - FIFO of waiting connections feeding the
//!   single active-client slot
//! - [`core::TaskFactory`] - expands a wire descriptor into randomized tasks
//! - [`net::Server`] - TCP listener, acceptor loop, and component wiring
//!
//! ## Example
//!
//! ```rust,no_run
//! use taskyard::config::ServerConfig;
//! use taskyard::net::Server;
//!
//! # fn main() -> taskyard::core::AppResult<()> {
//! let config = ServerConfig::new().with_port(8080).with_worker_count(4);
//! let server = Server::start(&config)?;
//! println!("listening on {}", server.local_addr());
//! # Ok(())
//! # }
//! ```
//!
//! Clients send one JSON descriptor per connection, e.g.
//! `{"count":5,"interruption_chance":10,"min_duration_ms":100,"max_duration_ms":1000}`,
//! and receive `"<N> tasks completed in <T>"` followed by the `"200"`
//! sentinel, or `"BAD DATA"` for an unparseable payload.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling: tasks, queue, worker pool, completion detection, admission.
pub mod core;
/// Configuration models.
pub mod config;
/// TCP transport: connection handle, acceptor, server wiring.
pub mod net;
/// Shared utilities.
pub mod util;
