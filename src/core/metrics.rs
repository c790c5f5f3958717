//! Passive metrics aggregation.
//!
//! Counters are lock-free atomics updated by submitters and workers;
//! nothing here ever blocks the task path. A snapshot is a plain read of
//! the counters, so two snapshots with no intervening activity are equal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::core::task::Priority;

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug)]
pub(crate) struct MetricsCollector {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
    queued: [AtomicU64; Priority::COUNT],
    wait_micros: AtomicU64,
    exec_micros: AtomicU64,
    busy_workers: AtomicU64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            queued: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
            wait_micros: AtomicU64::new(0),
            exec_micros: AtomicU64::new(0),
            busy_workers: AtomicU64::new(0),
        }
    }
}

impl MetricsCollector {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Called by the queue bank inside its critical section.
    pub(crate) fn queue_depth_inc(&self, priority: Priority) {
        self.queued[priority.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn queue_depth_dec(&self, priority: Priority) {
        self.queued[priority.index()].fetch_sub(1, Ordering::Relaxed);
    }

    /// Aggregate queued depth across all priority levels.
    pub(crate) fn queued_total(&self) -> u64 {
        self.queued.iter().map(|g| g.load(Ordering::Relaxed)).sum()
    }

    /// Accumulate submit -> start latency.
    pub(crate) fn record_wait(&self, waited: Duration) {
        self.wait_micros.fetch_add(to_micros(waited), Ordering::Relaxed);
    }

    /// Accumulate start -> end execution time.
    pub(crate) fn record_exec(&self, ran: Duration) {
        self.exec_micros.fetch_add(to_micros(ran), Ordering::Relaxed);
    }

    pub(crate) fn worker_busy(&self) {
        self.busy_workers.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn worker_idle(&self) {
        self.busy_workers.fetch_sub(1, Ordering::Relaxed);
    }

    /// Point-in-time read of all counters.
    pub(crate) fn snapshot(&self, workers: usize) -> PoolMetrics {
        PoolMetrics {
            workers: workers as u64,
            busy_workers: self.busy_workers.load(Ordering::Relaxed),
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            queued: [
                self.queued[0].load(Ordering::Relaxed),
                self.queued[1].load(Ordering::Relaxed),
                self.queued[2].load(Ordering::Relaxed),
            ],
            wait_micros: self.wait_micros.load(Ordering::Relaxed),
            exec_micros: self.exec_micros.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time statistics about pool utilization and performance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolMetrics {
    /// Current number of workers in the pool.
    pub workers: u64,
    /// Workers currently executing a task.
    pub busy_workers: u64,
    /// Total tasks accepted by `submit`.
    pub submitted: u64,
    /// Tasks that finished and produced a value.
    pub completed: u64,
    /// Tasks that failed (execution error, panic, or shutdown rejection).
    pub failed: u64,
    /// Tasks cancelled while still queued.
    pub cancelled: u64,
    /// Queue depth per priority level, indexed by [`Priority::index`].
    pub queued: [u64; Priority::COUNT],
    /// Cumulative submit -> start latency across executed tasks, in
    /// microseconds.
    pub wait_micros: u64,
    /// Cumulative start -> end execution time across executed tasks, in
    /// microseconds.
    pub exec_micros: u64,
}

impl PoolMetrics {
    /// Queue depth for one priority level.
    #[must_use]
    pub const fn queued_at(&self, priority: Priority) -> u64 {
        self.queued[priority.index()]
    }

    /// Total queued tasks across all levels.
    #[must_use]
    pub fn queued_total(&self) -> u64 {
        self.queued.iter().sum()
    }

    /// Tasks that reached a worker (completed or failed).
    #[must_use]
    pub const fn executed(&self) -> u64 {
        self.completed + self.failed
    }

    /// Mean submit -> start latency, if any task has executed.
    #[must_use]
    pub fn avg_wait(&self) -> Option<Duration> {
        (self.executed() > 0).then(|| Duration::from_micros(self.wait_micros / self.executed()))
    }

    /// Mean execution time, if any task has executed.
    #[must_use]
    pub fn avg_exec(&self) -> Option<Duration> {
        (self.executed() > 0).then(|| Duration::from_micros(self.exec_micros / self.executed()))
    }
}

fn to_micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}
