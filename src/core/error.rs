//! Error types for pool operations.

use thiserror::Error;

/// Errors surfaced by pool construction, submission, and result retrieval.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Configuration validation failed; the pool was not created.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// The minimum worker count could not be started; the pool was torn
    /// down.
    #[error("pool initialization failed: {0}")]
    InitializationFailed(String),
    /// Submission was refused because shutdown has been initiated.
    #[error("pool is shutting down")]
    ShuttingDown,
    /// Waiting on a future exceeded its timeout. The task keeps running
    /// and the future may still complete later.
    #[error("wait timed out")]
    TimedOut,
    /// The task was cancelled before it started executing.
    #[error("task was cancelled")]
    Cancelled,
    /// A future was transitioned to a terminal state twice. This is a
    /// programming error inside the pool, never expected in normal use.
    #[error("future already resolved")]
    AlreadyResolved,
    /// The task ran and failed; the cause is captured in the inner error.
    #[error(transparent)]
    TaskFailed(#[from] TaskError),
    /// Internal failure (runtime join error, poisoned helper thread).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure captured inside a future when a task does not complete.
///
/// Task errors never cross thread boundaries as panics or early returns;
/// they are only observable through the task's future.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    /// The work closure returned an error.
    #[error("task execution failed: {0}")]
    Execution(String),
    /// The work closure panicked; the payload message is preserved.
    #[error("task panicked: {0}")]
    Panicked(String),
    /// The pool was shut down before the task started.
    #[error("pool shut down before the task started")]
    PoolShutdown,
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
