//! Future handles for asynchronously observing task results.
//!
//! A [`TaskFuture`] is created together with its task at submission and is
//! resolved exactly once by the worker that executes the task. Resolution
//! is published under a `parking_lot` mutex and signalled through a
//! condition variable, so observers block efficiently instead of polling.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::core::error::{PoolError, TaskError};
use crate::core::task::{Priority, TaskId};

/// Observable lifecycle state of a [`TaskFuture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FutureState {
    /// The task has not finished (it may be queued or executing).
    Pending,
    /// The task finished and produced a value.
    Completed,
    /// The task failed; the error is held in the future.
    Failed,
    /// The task was cancelled before execution started.
    Cancelled,
}

/// Terminal outcome stored in the shared cell.
enum Outcome<R> {
    Completed(R),
    Failed(TaskError),
    Cancelled,
}

/// State shared between the submitter's handle clones and the pool.
struct Shared<R> {
    /// `None` while pending; written exactly once.
    cell: Mutex<Option<Outcome<R>>>,
    /// Signalled on the pending -> terminal transition.
    resolved: Condvar,
}

/// Handle to the eventual result of a submitted task.
///
/// Clones share the same underlying state; any number of observers may
/// wait on the same future concurrently. After the terminal transition
/// the state is effectively immutable and [`wait`](Self::wait) returns a
/// clone of the stored value.
pub struct TaskFuture<R> {
    id: TaskId,
    priority: Priority,
    shared: Arc<Shared<R>>,
}

impl<R> Clone for TaskFuture<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            priority: self.priority,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R> std::fmt::Debug for TaskFuture<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskFuture")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("state", &self.state())
            .finish()
    }
}

impl<R> TaskFuture<R> {
    /// Create a pending future bound to a task id.
    pub(crate) fn new(id: TaskId, priority: Priority) -> Self {
        Self {
            id,
            priority,
            shared: Arc::new(Shared {
                cell: Mutex::new(None),
                resolved: Condvar::new(),
            }),
        }
    }

    /// Id shared with the underlying task.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Priority the task was submitted with.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Current state of the future.
    #[must_use]
    pub fn state(&self) -> FutureState {
        match self.shared.cell.lock().as_ref() {
            None => FutureState::Pending,
            Some(Outcome::Completed(_)) => FutureState::Completed,
            Some(Outcome::Failed(_)) => FutureState::Failed,
            Some(Outcome::Cancelled) => FutureState::Cancelled,
        }
    }

    /// Whether the future has reached a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state() != FutureState::Pending
    }

    /// Block until the future resolves or `timeout` elapses.
    ///
    /// Waiting uses a condition variable, never busy polling, and never
    /// blocks longer than `timeout`. A timeout does not cancel the task;
    /// the same future can be waited on again and may resolve later.
    ///
    /// # Errors
    ///
    /// - [`PoolError::TimedOut`] if the future is still pending after
    ///   `timeout`.
    /// - [`PoolError::TaskFailed`] with the captured [`TaskError`] if the
    ///   task failed.
    /// - [`PoolError::Cancelled`] if the task was cancelled before it ran.
    pub fn wait(&self, timeout: Duration) -> Result<R, PoolError>
    where
        R: Clone,
    {
        let deadline = Instant::now() + timeout;
        let mut cell = self.shared.cell.lock();
        loop {
            if let Some(outcome) = cell.as_ref() {
                return outcome_to_result(outcome);
            }
            if Instant::now() >= deadline {
                return Err(PoolError::TimedOut);
            }
            if self.shared.resolved.wait_until(&mut cell, deadline).timed_out() {
                // Final check: resolution may have raced the timeout.
                return match cell.as_ref() {
                    Some(outcome) => outcome_to_result(outcome),
                    None => Err(PoolError::TimedOut),
                };
            }
        }
    }

    /// Wait for the future on a tokio runtime without blocking it.
    ///
    /// The condition-variable wait runs on tokio's blocking thread pool,
    /// bounded by the same `timeout` as [`wait`](Self::wait).
    ///
    /// # Errors
    ///
    /// Same as [`wait`](Self::wait), plus [`PoolError::Internal`] if the
    /// blocking task could not be joined.
    #[cfg(feature = "tokio-runtime")]
    pub async fn wait_async(&self, timeout: Duration) -> Result<R, PoolError>
    where
        R: Clone + Send + 'static,
    {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.wait(timeout))
            .await
            .map_err(|e| PoolError::Internal(format!("blocking wait join failed: {e}")))?
    }

    /// Resolve the future with a value. Exactly-once: a second transition
    /// reports [`PoolError::AlreadyResolved`].
    pub(crate) fn complete(&self, value: R) -> Result<(), PoolError> {
        self.transition(Outcome::Completed(value))
    }

    /// Resolve the future with a task error.
    pub(crate) fn fail(&self, error: TaskError) -> Result<(), PoolError> {
        self.transition(Outcome::Failed(error))
    }

    /// Mark the future cancelled. Only valid before execution starts; the
    /// queue lock arbitrates that.
    pub(crate) fn mark_cancelled(&self) -> Result<(), PoolError> {
        self.transition(Outcome::Cancelled)
    }

    fn transition(&self, outcome: Outcome<R>) -> Result<(), PoolError> {
        let mut cell = self.shared.cell.lock();
        if cell.is_some() {
            return Err(PoolError::AlreadyResolved);
        }
        *cell = Some(outcome);
        drop(cell);
        self.shared.resolved.notify_all();
        Ok(())
    }
}

fn outcome_to_result<R: Clone>(outcome: &Outcome<R>) -> Result<R, PoolError> {
    match outcome {
        Outcome::Completed(value) => Ok(value.clone()),
        Outcome::Failed(error) => Err(PoolError::TaskFailed(error.clone())),
        Outcome::Cancelled => Err(PoolError::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_resolve_once() {
        let future = TaskFuture::new(1, Priority::Normal);
        assert_eq!(future.state(), FutureState::Pending);

        future.complete(42).unwrap();
        assert_eq!(future.state(), FutureState::Completed);
        assert_eq!(future.wait(Duration::from_millis(10)).unwrap(), 42);
    }

    #[test]
    fn test_double_resolve_is_rejected() {
        let future = TaskFuture::new(1, Priority::Normal);
        future.complete(1).unwrap();

        let err = future.complete(2).unwrap_err();
        assert!(matches!(err, PoolError::AlreadyResolved));

        let err = future.fail(TaskError::Execution("late".into())).unwrap_err();
        assert!(matches!(err, PoolError::AlreadyResolved));

        // The first value wins.
        assert_eq!(future.wait(Duration::from_millis(10)).unwrap(), 1);
    }

    #[test]
    fn test_wait_times_out_while_pending() {
        let future: TaskFuture<u32> = TaskFuture::new(1, Priority::Low);
        let err = future.wait(Duration::from_millis(20)).unwrap_err();
        assert!(matches!(err, PoolError::TimedOut));
        assert_eq!(future.state(), FutureState::Pending);
    }

    #[test]
    fn test_failure_is_observable_by_every_clone() {
        let future: TaskFuture<u32> = TaskFuture::new(7, Priority::High);
        let observer = future.clone();
        future.fail(TaskError::Execution("boom".into())).unwrap();

        for f in [future, observer] {
            match f.wait(Duration::from_millis(10)) {
                Err(PoolError::TaskFailed(TaskError::Execution(msg))) => {
                    assert_eq!(msg, "boom");
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    }

    #[test]
    fn test_cancelled_future() {
        let future: TaskFuture<u32> = TaskFuture::new(3, Priority::Normal);
        future.mark_cancelled().unwrap();
        assert_eq!(future.state(), FutureState::Cancelled);
        assert!(matches!(
            future.wait(Duration::from_millis(10)),
            Err(PoolError::Cancelled)
        ));
    }

    #[test]
    fn test_concurrent_waiters_all_observe_resolution() {
        let future: TaskFuture<String> = TaskFuture::new(9, Priority::Normal);

        let mut waiters = Vec::new();
        for _ in 0..4 {
            let f = future.clone();
            waiters.push(thread::spawn(move || f.wait(Duration::from_secs(5))));
        }

        thread::sleep(Duration::from_millis(20));
        future.complete("done".to_string()).unwrap();

        for waiter in waiters {
            assert_eq!(waiter.join().unwrap().unwrap(), "done");
        }
    }

    #[cfg(feature = "tokio-runtime")]
    #[tokio::test]
    async fn test_wait_async() {
        let future: TaskFuture<u32> = TaskFuture::new(11, Priority::Normal);
        let resolver = future.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            resolver.complete(5).unwrap();
        });

        let value = future.wait_async(Duration::from_secs(5)).await.unwrap();
        assert_eq!(value, 5);
    }
}
