//! # Taskforge
//!
//! A priority-scheduled, dynamically-sized worker pool with future-based
//! task handles.
//!
//! This library provides a single-process scheduling engine: a bounded
//! set of worker threads consumes tasks from priority-ordered queues,
//! grows and shrinks with load, and hands every caller an asynchronous
//! handle to the eventual result.
//!
//! ## Core Problem Solved
//!
//! Request-dispatch and job-scheduling systems share the same hard parts:
//!
//! - **Priority under contention**: urgent work must jump the line
//!   without reordering work of equal urgency
//! - **Elastic capacity**: bursts need more workers, quiet periods fewer,
//!   without oscillating between the two
//! - **Deferred results**: submitters must observe completion, failure,
//!   or cancellation later, from any thread, without polling
//! - **Failure containment**: one bad task must never take down a worker
//!   or the pool
//!
//! ## Key Features
//!
//! - **Strict priority scheduling**: three levels, FIFO within a level,
//!   highest first across levels (starvation of low priority under
//!   sustained high-priority load is a documented tradeoff)
//! - **Dynamic sizing**: one-worker-at-a-time scale up on queue pressure
//!   and scale down on idle timeout, bounded by `min`/`max`
//! - **Futures**: condvar-backed handles with blocking and async waits,
//!   exactly-once resolution, cooperative cancellation
//! - **Metrics**: lock-free counters for submissions, completions, queue
//!   depth, and wait/execution time
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use taskforge::config::PoolConfig;
//! use taskforge::core::{Priority, WorkerPool};
//!
//! let pool: WorkerPool<u64> = WorkerPool::new(
//!     PoolConfig::new().with_min_workers(2).with_max_workers(4),
//! )
//! .unwrap();
//!
//! let future = pool.submit(Priority::High, || Ok(6 * 7)).unwrap();
//! assert_eq!(future.wait(Duration::from_secs(5)).unwrap(), 42);
//!
//! // Drain: queued tasks finish before shutdown returns.
//! pool.shutdown(true);
//! ```
//!
//! For complete scenarios, see `tests/worker_pool_test.rs`.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: tasks, futures, queues, workers, pool.
pub mod core;
/// Configuration models for the worker pool.
pub mod config;
/// Builders to construct pools from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;
