//! Worker lifecycle and main loop.
//!
//! A worker is a long-lived OS thread that repeatedly takes the highest
//! priority queued task, executes it, and resolves its future. Task
//! errors and panics are captured into the future and never escape the
//! loop. The dequeue wait is bounded so workers periodically observe
//! shutdown, retirement, and resize conditions.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::core::error::TaskError;
use crate::core::pool::{Lifecycle, PoolCore};
use crate::core::task::Task;

/// Lifecycle state of a single worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Thread spawned, loop not yet entered.
    Starting,
    /// Waiting for work.
    Idle,
    /// Executing a task.
    Running,
    /// Loop exited, final bookkeeping in progress.
    Stopping,
    /// Thread is done.
    Stopped,
}

impl WorkerState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Starting,
            1 => Self::Idle,
            2 => Self::Running,
            3 => Self::Stopping,
            _ => Self::Stopped,
        }
    }

    const fn as_u8(self) -> u8 {
        match self {
            Self::Starting => 0,
            Self::Idle => 1,
            Self::Running => 2,
            Self::Stopping => 3,
            Self::Stopped => 4,
        }
    }
}

/// Point-in-time view of one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSnapshot {
    /// Worker identifier, unique within the pool.
    pub id: u64,
    /// Current lifecycle state.
    pub state: WorkerState,
    /// Tasks this worker has executed (successes and failures).
    pub tasks_processed: u64,
}

/// State shared between a worker thread and the pool registry.
pub(crate) struct WorkerShared {
    pub(crate) id: u64,
    state: AtomicU8,
    /// Set by scale-down; the worker exits at the next loop turn.
    pub(crate) retire: AtomicBool,
    tasks_processed: AtomicU64,
    /// Updated on startup and after each task.
    last_activity: Mutex<Instant>,
}

impl WorkerShared {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            state: AtomicU8::new(WorkerState::Starting.as_u8()),
            retire: AtomicBool::new(false),
            tasks_processed: AtomicU64::new(0),
            last_activity: Mutex::new(Instant::now()),
        }
    }

    pub(crate) fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: WorkerState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Time since this worker last finished a task (or started up).
    pub(crate) fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    pub(crate) fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            id: self.id,
            state: self.state(),
            tasks_processed: self.tasks_processed.load(Ordering::Relaxed),
        }
    }
}

/// Worker thread entry point.
pub(crate) fn worker_loop<R: Send + 'static>(core: &Arc<PoolCore<R>>, me: &Arc<WorkerShared>) {
    debug!(worker_id = me.id, "worker started");
    me.set_state(WorkerState::Idle);
    me.touch();

    loop {
        if me.retire.load(Ordering::Acquire) {
            debug!(worker_id = me.id, "worker retiring");
            break;
        }
        match core.lifecycle() {
            Lifecycle::Halted => break,
            Lifecycle::Draining if core.bank.is_empty() => break,
            _ => {}
        }

        match core.bank.pop_highest(core.config.dequeue_poll_interval()) {
            Some(task) => run_task(core, me, task),
            None => {
                // Dequeue timed out; use the gap to evaluate scaling,
                // the way the pool does after each submission.
                if core.lifecycle() == Lifecycle::Running {
                    PoolCore::resize_check(core);
                }
            }
        }
    }

    me.set_state(WorkerState::Stopping);
    debug!(
        worker_id = me.id,
        tasks_processed = me.tasks_processed.load(Ordering::Relaxed),
        "worker stopped"
    );
    me.set_state(WorkerState::Stopped);
}

/// Execute one task: record timings, contain failures, resolve the future.
fn run_task<R: Send + 'static>(core: &PoolCore<R>, me: &WorkerShared, task: Task<R>) {
    let metrics = &core.metrics;
    metrics.record_wait(task.submitted_at.elapsed());
    metrics.worker_busy();
    me.set_state(WorkerState::Running);

    let Task {
        id, priority, work, future, ..
    } = task;
    debug!(worker_id = me.id, task_id = id, priority = %priority, "executing task");

    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| work()));
    metrics.record_exec(started.elapsed());

    let resolution = match outcome {
        Ok(Ok(value)) => {
            metrics.record_completed();
            future.complete(value)
        }
        Ok(Err(task_err)) => {
            metrics.record_failed();
            future.fail(task_err)
        }
        Err(payload) => {
            metrics.record_failed();
            future.fail(TaskError::Panicked(panic_message(payload.as_ref())))
        }
    };
    if resolution.is_err() {
        // The queue lock makes the executing worker the sole resolver;
        // reaching this branch means that invariant was broken.
        error!(worker_id = me.id, task_id = id, "future was already resolved");
    }

    me.set_state(WorkerState::Idle);
    metrics.worker_idle();
    me.tasks_processed.fetch_add(1, Ordering::Relaxed);
    me.touch();
    debug!(worker_id = me.id, task_id = id, "task finished");
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "opaque panic payload".to_string())
}
