//! Core scheduling: task model, priority queue, worker pool, completion
//! detection, and client admission.

pub mod admission;
pub mod client;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod queue;
pub mod scheduler;
pub mod task;

pub use admission::{AdmissionQueue, BAD_DATA};
pub use client::{ClientConn, CompletionCallback};
pub use descriptor::BatchDescriptor;
pub use error::{AppResult, SchedulerError, TaskError};
pub use factory::TaskFactory;
pub use queue::PriorityQueue;
pub use scheduler::{Scheduler, SchedulerStats, DONE_SENTINEL};
pub use task::{Task, TaskAction, TaskId};
