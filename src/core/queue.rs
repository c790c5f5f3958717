//! Strict-priority queue bank.
//!
//! One FIFO queue per priority level, all guarded by a single mutex with a
//! condition variable for blocking consumers. Dequeue scans levels from
//! highest to lowest, so higher-priority work always wins when both are
//! available; within a level, tasks leave in submission order. A steady
//! stream of high-priority tasks starves lower levels indefinitely; that
//! tradeoff is intentional and documented on [`Priority`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::core::metrics::MetricsCollector;
use crate::core::task::{Priority, Task, TaskId};

/// The per-priority queues, a single critical section.
struct Levels<R> {
    queues: [VecDeque<Task<R>>; Priority::COUNT],
}

impl<R> Levels<R> {
    fn take_highest(&mut self) -> Option<Task<R>> {
        for priority in Priority::DESCENDING {
            if let Some(task) = self.queues[priority.index()].pop_front() {
                return Some(task);
            }
        }
        None
    }

    fn len(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }
}

/// Pending-task storage shared by submitters and workers.
///
/// The queue lock is also the cancellation arbiter: a task can be removed
/// by [`remove`](Self::remove) only while it is still queued; once a
/// worker has taken it, removal fails and cancellation is refused.
pub(crate) struct QueueBank<R> {
    levels: Mutex<Levels<R>>,
    /// Signalled once per push, broadcast on shutdown/resize.
    available: Condvar,
    metrics: Arc<MetricsCollector>,
}

impl<R> QueueBank<R> {
    pub(crate) fn new(metrics: Arc<MetricsCollector>) -> Self {
        Self {
            levels: Mutex::new(Levels {
                queues: [VecDeque::new(), VecDeque::new(), VecDeque::new()],
            }),
            available: Condvar::new(),
            metrics,
        }
    }

    /// Append a task to the tail of its priority level and wake one
    /// waiting consumer.
    pub(crate) fn push(&self, task: Task<R>) {
        let mut levels = self.levels.lock();
        self.metrics.queue_depth_inc(task.priority);
        levels.queues[task.priority.index()].push_back(task);
        drop(levels);
        self.available.notify_one();
    }

    /// Take the head task of the first non-empty level, scanning highest
    /// to lowest, blocking up to `timeout` for one to appear.
    pub(crate) fn pop_highest(&self, timeout: Duration) -> Option<Task<R>> {
        let deadline = Instant::now() + timeout;
        let mut levels = self.levels.lock();
        loop {
            if let Some(task) = levels.take_highest() {
                self.metrics.queue_depth_dec(task.priority);
                return Some(task);
            }
            if Instant::now() >= deadline {
                return None;
            }
            if self.available.wait_until(&mut levels, deadline).timed_out() {
                return levels.take_highest().map(|task| {
                    self.metrics.queue_depth_dec(task.priority);
                    task
                });
            }
        }
    }

    /// Remove a still-queued task by id. Returns `None` if the task has
    /// already been dequeued (or never existed).
    pub(crate) fn remove(&self, id: TaskId, priority: Priority) -> Option<Task<R>> {
        let mut levels = self.levels.lock();
        let queue = &mut levels.queues[priority.index()];
        let pos = queue.iter().position(|t| t.id == id)?;
        let task = queue.remove(pos)?;
        self.metrics.queue_depth_dec(priority);
        Some(task)
    }

    /// Empty every level, returning the removed tasks. Used by immediate
    /// shutdown and the post-join straggler sweep.
    pub(crate) fn drain_all(&self) -> Vec<Task<R>> {
        let mut levels = self.levels.lock();
        let mut drained = Vec::with_capacity(levels.len());
        for priority in Priority::DESCENDING {
            while let Some(task) = levels.queues[priority.index()].pop_front() {
                self.metrics.queue_depth_dec(priority);
                drained.push(task);
            }
        }
        drained
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.levels.lock().len() == 0
    }

    /// Wake every blocked consumer (shutdown, worker retirement).
    pub(crate) fn notify_all(&self) {
        self.available.notify_all();
    }
}
