//! Core scheduling abstractions: tasks, futures, queues, workers, pool.

pub mod error;
pub mod future;
pub mod metrics;
pub mod pool;
mod queue;
pub mod task;
pub mod worker;

pub use error::{AppResult, PoolError, TaskError};
pub use future::{FutureState, TaskFuture};
pub use metrics::PoolMetrics;
pub use pool::WorkerPool;
pub use task::{Priority, TaskId};
pub use worker::{WorkerSnapshot, WorkerState};
