//! Pool manager: worker lifecycle, capacity policy, and the API surface.
//!
//! A [`WorkerPool`] owns the queue bank, the worker registry, and the
//! metrics collector for its whole lifetime. There are no globals; any
//! number of independent pools can coexist in one process.
//!
//! # Design
//!
//! - **No polling**: workers block on the queue condvar; callers block on
//!   future condvars.
//! - **Small critical sections**: the queue lock and the registry lock
//!   are never held across task execution or thread joins.
//! - **Hysteresis**: capacity changes one worker at a time per check.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::PoolConfig;
use crate::core::error::{AppResult, PoolError, TaskError};
use crate::core::future::TaskFuture;
use crate::core::metrics::{MetricsCollector, PoolMetrics};
use crate::core::queue::QueueBank;
use crate::core::task::{Priority, Task, Work};
use crate::core::worker::{worker_loop, WorkerShared, WorkerSnapshot, WorkerState};

/// Pool lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    /// Accepting submissions.
    Running,
    /// Shutdown initiated; workers run until the queues are empty.
    Draining,
    /// Shutdown initiated; queued tasks are rejected, workers exit after
    /// their current task.
    Halted,
}

impl Lifecycle {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Running => 0,
            Self::Draining => 1,
            Self::Halted => 2,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Running,
            1 => Self::Draining,
            _ => Self::Halted,
        }
    }
}

/// Registered worker: shared state plus the join handle for shutdown.
struct WorkerEntry {
    shared: Arc<WorkerShared>,
    join: Option<JoinHandle<()>>,
}

/// The set of live workers plus handles of retired ones awaiting join.
struct Registry {
    workers: Vec<WorkerEntry>,
    retired: Vec<JoinHandle<()>>,
}

/// State shared between the pool handle and its worker threads.
pub(crate) struct PoolCore<R> {
    pub(crate) config: PoolConfig,
    pub(crate) bank: QueueBank<R>,
    pub(crate) metrics: Arc<MetricsCollector>,
    lifecycle: AtomicU8,
    shutdown_started: AtomicBool,
    registry: Mutex<Registry>,
    next_task_id: AtomicU64,
    next_worker_id: AtomicU64,
}

impl<R: Send + 'static> PoolCore<R> {
    pub(crate) fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.lifecycle.load(Ordering::Acquire))
    }

    fn set_lifecycle(&self, lifecycle: Lifecycle) {
        self.lifecycle.store(lifecycle.as_u8(), Ordering::Release);
    }

    /// Spawn one worker and register it. Caller holds the registry lock,
    /// which keeps the worker count within bounds under concurrent checks.
    fn spawn_worker_locked(core: &Arc<Self>, registry: &mut Registry) -> io::Result<u64> {
        let id = core.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::new(WorkerShared::new(id));
        let worker_core = Arc::clone(core);
        let me = Arc::clone(&shared);
        let join = thread::Builder::new()
            .name(format!("tf-worker-{id}"))
            .stack_size(core.config.thread_stack_size)
            .spawn(move || worker_loop(&worker_core, &me))?;
        registry.workers.push(WorkerEntry {
            shared,
            join: Some(join),
        });
        Ok(id)
    }

    /// Evaluate the scaling policy and apply at most one worker change.
    ///
    /// Scale up when queued work exceeds `current * scale_up_factor` and
    /// the pool is below `max_workers`; a spawn failure here is logged
    /// and retried on the next check. Scale down when the queues are
    /// empty, some worker has been idle past `idle_timeout`, and the pool
    /// is above `min_workers`; the longest-idle worker is retired.
    pub(crate) fn resize_check(core: &Arc<Self>) {
        if core.lifecycle() != Lifecycle::Running {
            return;
        }
        let queued = usize::try_from(core.metrics.queued_total()).unwrap_or(usize::MAX);
        let mut registry = core.registry.lock();
        let current = registry.workers.len();

        if queued > current.saturating_mul(core.config.scale_up_factor)
            && current < core.config.max_workers
        {
            match Self::spawn_worker_locked(core, &mut registry) {
                Ok(worker_id) => {
                    info!(worker_id, queued, workers = current + 1, "scaled up");
                }
                Err(e) => {
                    warn!(error = %e, "worker spawn failed; retrying on next check");
                }
            }
            return;
        }

        if queued == 0 && current > core.config.min_workers {
            let idle_timeout = core.config.idle_timeout();
            let candidate = registry
                .workers
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.shared.state() == WorkerState::Idle)
                .map(|(index, entry)| (index, entry.shared.idle_for()))
                .filter(|(_, idle)| *idle >= idle_timeout)
                .max_by_key(|(_, idle)| *idle)
                .map(|(index, _)| index);

            if let Some(index) = candidate {
                let mut entry = registry.workers.remove(index);
                entry.shared.retire.store(true, Ordering::Release);
                if let Some(handle) = entry.join.take() {
                    registry.retired.push(handle);
                }
                let worker_id = entry.shared.id;
                drop(registry);
                // Wake it out of the dequeue wait so it exits promptly.
                core.bank.notify_all();
                info!(worker_id, workers = current - 1, "scaled down idle worker");
            }
        }
    }

    /// Drain the queue bank and fail every removed task's future.
    fn reject_pending(&self) {
        let drained = self.bank.drain_all();
        if drained.is_empty() {
            return;
        }
        warn!(count = drained.len(), "rejecting queued tasks");
        for task in drained {
            if task.future.fail(TaskError::PoolShutdown).is_ok() {
                self.metrics.record_failed();
            }
        }
    }
}

/// A bounded, dynamically-sized pool of worker threads consuming
/// priority-ordered tasks.
///
/// ```rust
/// use std::time::Duration;
/// use taskforge::core::{Priority, WorkerPool};
///
/// let pool: WorkerPool<u32> = WorkerPool::with_bounds(1, 4).unwrap();
/// let future = pool.submit(Priority::High, || Ok(2 + 2)).unwrap();
/// assert_eq!(future.wait(Duration::from_secs(5)).unwrap(), 4);
/// pool.shutdown(true);
/// ```
pub struct WorkerPool<R: Send + 'static> {
    core: Arc<PoolCore<R>>,
}

impl<R: Send + 'static> std::fmt::Debug for WorkerPool<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool").finish_non_exhaustive()
    }
}

impl<R: Send + 'static> WorkerPool<R> {
    /// Create a pool from a validated configuration and start
    /// `min_workers` workers.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidConfiguration`] if validation fails; the
    ///   pool is not created.
    /// - [`PoolError::InitializationFailed`] if any of the minimum
    ///   workers could not be spawned; already-started workers are told
    ///   to exit and the pool is not returned.
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfiguration)?;

        let metrics = Arc::new(MetricsCollector::default());
        let core = Arc::new(PoolCore {
            bank: QueueBank::new(Arc::clone(&metrics)),
            metrics,
            config,
            lifecycle: AtomicU8::new(Lifecycle::Running.as_u8()),
            shutdown_started: AtomicBool::new(false),
            registry: Mutex::new(Registry {
                workers: Vec::new(),
                retired: Vec::new(),
            }),
            next_task_id: AtomicU64::new(0),
            next_worker_id: AtomicU64::new(0),
        });

        for _ in 0..core.config.min_workers {
            let mut registry = core.registry.lock();
            if let Err(e) = PoolCore::spawn_worker_locked(&core, &mut registry) {
                drop(registry);
                core.set_lifecycle(Lifecycle::Halted);
                core.bank.notify_all();
                warn!(error = %e, "pool initialization failed below min_workers");
                return Err(PoolError::InitializationFailed(e.to_string()));
            }
        }

        info!(
            min_workers = core.config.min_workers,
            max_workers = core.config.max_workers,
            "worker pool started"
        );
        Ok(Self { core })
    }

    /// Create a pool with the given worker bounds and default settings
    /// for everything else.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_bounds(min_workers: usize, max_workers: usize) -> Result<Self, PoolError> {
        Self::new(
            PoolConfig::new()
                .with_min_workers(min_workers)
                .with_max_workers(max_workers),
        )
    }

    /// Submit work at a priority and receive its future immediately.
    ///
    /// The closure's `Err` is captured as
    /// [`TaskError::Execution`](crate::core::TaskError::Execution) in the
    /// future; a panic inside the closure is captured as
    /// [`TaskError::Panicked`](crate::core::TaskError::Panicked). Neither
    /// disturbs the executing worker.
    ///
    /// # Errors
    ///
    /// [`PoolError::ShuttingDown`] once shutdown has been initiated.
    pub fn submit<F>(&self, priority: Priority, work: F) -> Result<TaskFuture<R>, PoolError>
    where
        F: FnOnce() -> AppResult<R> + Send + 'static,
    {
        if self.core.lifecycle() != Lifecycle::Running {
            return Err(PoolError::ShuttingDown);
        }

        let id = self.core.next_task_id.fetch_add(1, Ordering::Relaxed);
        let future = TaskFuture::new(id, priority);
        let work: Work<R> =
            Box::new(move || work().map_err(|e| TaskError::Execution(format!("{e:#}"))));

        self.core.bank.push(Task {
            id,
            priority,
            work,
            submitted_at: Instant::now(),
            future: future.clone(),
        });
        self.core.metrics.record_submitted();

        // Shutdown may have flipped the lifecycle between the check above
        // and the push; the straggler sweep only covers tasks enqueued
        // before it runs. If the task is still in the bank, pull it back
        // out and refuse the submission.
        if self.core.lifecycle() != Lifecycle::Running {
            if let Some(task) = self.core.bank.remove(id, priority) {
                if task.future.fail(TaskError::PoolShutdown).is_ok() {
                    self.core.metrics.record_failed();
                }
                return Err(PoolError::ShuttingDown);
            }
            return Ok(future);
        }
        debug!(task_id = id, priority = %priority, "task submitted");

        PoolCore::resize_check(&self.core);
        Ok(future)
    }

    /// Cancel a task that has not started executing.
    ///
    /// Returns `true` and transitions the future to `Cancelled` if the
    /// task was still queued. Returns `false` once a worker has dequeued
    /// it: cancellation is cooperative, not preemptive, and a running
    /// task is never interrupted.
    pub fn cancel(&self, future: &TaskFuture<R>) -> bool {
        let Some(task) = self.core.bank.remove(future.id(), future.priority()) else {
            return false;
        };
        if task.future.mark_cancelled().is_err() {
            warn!(task_id = task.id, "cancelled task was already resolved");
        }
        self.core.metrics.record_cancelled();
        debug!(task_id = task.id, "task cancelled before execution");
        true
    }

    /// Run one scaling check now, in addition to the checks performed on
    /// submission and on worker dequeue timeouts.
    pub fn resize_check(&self) {
        PoolCore::resize_check(&self.core);
    }

    /// Current number of workers in the pool.
    #[must_use]
    pub fn current_workers(&self) -> usize {
        self.core.registry.lock().workers.len()
    }

    /// Point-in-time view of every live worker.
    #[must_use]
    pub fn workers(&self) -> Vec<WorkerSnapshot> {
        self.core
            .registry
            .lock()
            .workers
            .iter()
            .map(|entry| entry.shared.snapshot())
            .collect()
    }

    /// Consistent point-in-time metrics snapshot. Never blocks producers
    /// or consumers.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        self.core.metrics.snapshot(self.current_workers())
    }

    /// Shut the pool down and wait for every worker to stop.
    ///
    /// With `drain` set, queued tasks are executed to completion first.
    /// Otherwise the queues are emptied immediately and every pending
    /// future is failed with
    /// [`TaskError::PoolShutdown`](crate::core::TaskError::PoolShutdown);
    /// in-flight tasks still finish. When
    /// [`shutdown_timeout_ms`](crate::config::PoolConfig::shutdown_timeout_ms)
    /// is configured, each worker is given at most that long before it is
    /// detached. Subsequent calls return immediately.
    pub fn shutdown(&self, drain: bool) {
        if self.core.shutdown_started.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(drain, "shutting down worker pool");

        self.core.set_lifecycle(if drain {
            Lifecycle::Draining
        } else {
            Lifecycle::Halted
        });
        if !drain {
            self.core.reject_pending();
        }
        self.core.bank.notify_all();

        let (entries, retired) = {
            let mut registry = self.core.registry.lock();
            (
                std::mem::take(&mut registry.workers),
                std::mem::take(&mut registry.retired),
            )
        };
        let worker_count = entries.len();
        let timeout = self.core.config.shutdown_timeout();
        for entry in entries {
            join_worker(entry, timeout);
        }
        for handle in retired {
            if handle.join().is_err() {
                warn!("retired worker panicked");
            }
        }

        // Sweep anything that raced the lifecycle flip; no worker is left
        // to run it, so its future must not stay pending.
        self.core.reject_pending();
        self.core.set_lifecycle(Lifecycle::Halted);
        info!(worker_count, "worker pool shut down");
    }
}

impl<R: Send + 'static> Drop for WorkerPool<R> {
    fn drop(&mut self) {
        // Signal shutdown but do not join in Drop; explicit shutdown() is
        // the graceful path. Pending futures are failed so observers do
        // not hang.
        if !self.core.shutdown_started.swap(true, Ordering::AcqRel) {
            self.core.set_lifecycle(Lifecycle::Halted);
            self.core.reject_pending();
            self.core.bank.notify_all();
            debug!("worker pool dropped without explicit shutdown; workers detach");
        }
    }
}

/// Join one worker, bounded by the configured timeout; detach on overrun.
fn join_worker(entry: WorkerEntry, timeout: Option<Duration>) {
    let worker_id = entry.shared.id;
    let Some(handle) = entry.join else { return };

    match timeout {
        None => {
            if handle.join().is_err() {
                warn!(worker_id, "worker panicked");
            } else {
                debug!(worker_id, "worker joined");
            }
        }
        Some(limit) => {
            let (done_tx, done_rx) = crossbeam_channel::bounded(1);
            let waiter = thread::spawn(move || {
                let _ = done_tx.send(handle.join().is_ok());
            });
            match done_rx.recv_timeout(limit) {
                Ok(true) => {
                    debug!(worker_id, "worker joined");
                    let _ = waiter.join();
                }
                Ok(false) => {
                    warn!(worker_id, "worker panicked");
                    let _ = waiter.join();
                }
                // Dropping the waiter handle detaches both threads; the
                // worker exits on its own once its task returns.
                Err(_) => warn!(worker_id, "worker did not stop within timeout; detaching"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::future::FutureState;
    use std::sync::atomic::AtomicUsize;

    fn small_pool() -> WorkerPool<u32> {
        WorkerPool::new(
            PoolConfig::new()
                .with_min_workers(2)
                .with_max_workers(4)
                .with_dequeue_poll_ms(20),
        )
        .unwrap()
    }

    #[test]
    fn test_submit_and_wait() {
        let pool = small_pool();
        let future = pool.submit(Priority::Normal, || Ok(21 * 2)).unwrap();
        assert_eq!(future.wait(Duration::from_secs(5)).unwrap(), 42);
        assert_eq!(future.state(), FutureState::Completed);
        pool.shutdown(true);
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let err = WorkerPool::<u32>::with_bounds(0, 4).unwrap_err();
        assert!(matches!(err, PoolError::InvalidConfiguration(_)));

        let err = WorkerPool::<u32>::with_bounds(4, 2).unwrap_err();
        assert!(matches!(err, PoolError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_submit_after_shutdown_is_refused() {
        let pool = small_pool();
        pool.shutdown(true);
        let err = pool.submit(Priority::Low, || Ok(1)).unwrap_err();
        assert!(matches!(err, PoolError::ShuttingDown));
    }

    #[test]
    fn test_execution_error_is_captured() {
        let pool = small_pool();
        let future = pool
            .submit(Priority::Normal, || {
                Err(anyhow::anyhow!("backend unavailable"))
            })
            .unwrap();

        match future.wait(Duration::from_secs(5)) {
            Err(PoolError::TaskFailed(TaskError::Execution(msg))) => {
                assert!(msg.contains("backend unavailable"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        pool.shutdown(true);
    }

    #[test]
    fn test_panic_is_contained() {
        let pool = small_pool();
        let future: TaskFuture<u32> = pool
            .submit(Priority::Normal, || panic!("worker must survive"))
            .unwrap();

        match future.wait(Duration::from_secs(5)) {
            Err(PoolError::TaskFailed(TaskError::Panicked(msg))) => {
                assert!(msg.contains("worker must survive"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        // The worker that caught the panic still serves new tasks.
        let future = pool.submit(Priority::High, || Ok(7)).unwrap();
        assert_eq!(future.wait(Duration::from_secs(5)).unwrap(), 7);
        pool.shutdown(true);
    }

    #[test]
    fn test_metrics_count_submissions() {
        let pool = small_pool();
        let counter = Arc::new(AtomicUsize::new(0));
        let futures: Vec<_> = (0..6)
            .map(|_| {
                let counter = Arc::clone(&counter);
                pool.submit(Priority::Normal, move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                    Ok(0)
                })
                .unwrap()
            })
            .collect();
        for future in &futures {
            future.wait(Duration::from_secs(5)).unwrap();
        }

        let metrics = pool.metrics();
        assert_eq!(metrics.submitted, 6);
        assert_eq!(metrics.completed, 6);
        assert_eq!(counter.load(Ordering::Relaxed), 6);
        pool.shutdown(true);
    }
}
