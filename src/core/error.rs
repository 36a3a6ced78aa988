//! Error types for scheduler and admission operations.

use thiserror::Error;

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Submitted descriptor payload failed to parse or described no work.
    #[error("malformed descriptor: {0}")]
    BadDescriptor(String),
    /// A client is already bound as the scheduler's active client.
    #[error("active client slot already occupied")]
    SlotOccupied,
}

/// Outcome signalled by a task action that did not complete normally.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The task signalled interruption instead of running to completion.
    #[error("task interrupted")]
    Interrupted,
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
