//! Task identity, priority levels, and the internal unit of work.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::core::error::TaskError;
use crate::core::future::TaskFuture;

/// Unique, process-local task identifier. A task and its future share the
/// same id.
pub type TaskId = u64;

/// Scheduling priority of a submitted task.
///
/// Dequeue order is strict: a queued `High` task is always taken before
/// any `Normal` or `Low` task. A continuous stream of high-priority work
/// can therefore starve lower levels indefinitely; callers that need
/// fairness must implement aging on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Background work, dequeued only when nothing else is waiting.
    Low,
    /// Default priority.
    Normal,
    /// Dequeued before all other levels.
    High,
}

impl Priority {
    /// Number of priority levels.
    pub const COUNT: usize = 3;

    /// All levels ordered from highest to lowest dequeue precedence.
    pub const DESCENDING: [Self; Self::COUNT] = [Self::High, Self::Normal, Self::Low];

    /// Stable index of this level into per-priority arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Low => 0,
            Self::Normal => 1,
            Self::High => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Normal => write!(f, "normal"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Boxed unit of work. Errors are already normalized to [`TaskError`] by
/// the submission layer.
pub(crate) type Work<R> = Box<dyn FnOnce() -> Result<R, TaskError> + Send + 'static>;

/// A queued unit of work.
///
/// Owned by the queue bank until dequeued; ownership then transfers to the
/// executing worker, which resolves the attached future and drops the task.
pub(crate) struct Task<R> {
    pub id: TaskId,
    pub priority: Priority,
    pub work: Work<R>,
    pub submitted_at: Instant,
    pub future: TaskFuture<R>,
}

impl<R> fmt::Debug for Task<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("submitted_at", &self.submitted_at)
            .finish_non_exhaustive()
    }
}
