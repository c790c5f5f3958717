//! Tests for the pool builder

use std::time::Duration;

use taskforge::builders::PoolBuilder;
use taskforge::config::PoolConfig;
use taskforge::core::{PoolError, Priority};

#[test]
fn test_builder_constructs_working_pool() {
    let pool = PoolBuilder::<u32>::new()
        .min_workers(1)
        .max_workers(2)
        .dequeue_poll_ms(20)
        .build()
        .unwrap();

    let future = pool.submit(Priority::Normal, || Ok(11)).unwrap();
    assert_eq!(future.wait(Duration::from_secs(5)).unwrap(), 11);
    pool.shutdown(true);
}

#[test]
fn test_builder_rejects_invalid_bounds() {
    let err = PoolBuilder::<u32>::new()
        .min_workers(3)
        .max_workers(1)
        .build()
        .unwrap_err();
    assert!(matches!(err, PoolError::InvalidConfiguration(_)));
}

#[test]
fn test_builder_from_existing_config() {
    let config = PoolConfig::new()
        .with_min_workers(1)
        .with_max_workers(3)
        .with_dequeue_poll_ms(20);
    let pool = PoolBuilder::<String>::from_config(config)
        .shutdown_timeout_ms(2_000)
        .build()
        .unwrap();

    assert_eq!(pool.current_workers(), 1);
    pool.shutdown(true);
}
