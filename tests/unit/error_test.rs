//! Tests for error types and display formatting

use taskforge::core::{PoolError, TaskError};

#[test]
fn test_pool_error_display() {
    let err = PoolError::InvalidConfiguration("min_workers must be greater than 0".into());
    assert_eq!(
        format!("{err}"),
        "invalid configuration: min_workers must be greater than 0"
    );

    assert_eq!(format!("{}", PoolError::ShuttingDown), "pool is shutting down");
    assert_eq!(format!("{}", PoolError::TimedOut), "wait timed out");
    assert_eq!(format!("{}", PoolError::Cancelled), "task was cancelled");
    assert_eq!(
        format!("{}", PoolError::AlreadyResolved),
        "future already resolved"
    );
}

#[test]
fn test_task_error_display() {
    assert_eq!(
        format!("{}", TaskError::Execution("backend gone".into())),
        "task execution failed: backend gone"
    );
    assert_eq!(
        format!("{}", TaskError::Panicked("index out of bounds".into())),
        "task panicked: index out of bounds"
    );
    assert_eq!(
        format!("{}", TaskError::PoolShutdown),
        "pool shut down before the task started"
    );
}

#[test]
fn test_task_error_converts_into_pool_error() {
    let err: PoolError = TaskError::PoolShutdown.into();
    assert!(matches!(
        err,
        PoolError::TaskFailed(TaskError::PoolShutdown)
    ));
    // Transparent wrapping: the task error formats unchanged.
    assert_eq!(format!("{err}"), format!("{}", TaskError::PoolShutdown));
}

#[test]
fn test_task_error_equality() {
    assert_eq!(
        TaskError::Execution("x".into()),
        TaskError::Execution("x".into())
    );
    assert_ne!(
        TaskError::Execution("x".into()),
        TaskError::Panicked("x".into())
    );
}
