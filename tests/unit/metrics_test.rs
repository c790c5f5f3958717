//! Tests for the metrics snapshot surface

use std::thread;
use std::time::Duration;

use taskforge::config::PoolConfig;
use taskforge::core::{Priority, WorkerPool};

fn pool() -> WorkerPool<u64> {
    WorkerPool::new(
        PoolConfig::new()
            .with_min_workers(2)
            .with_max_workers(2)
            .with_dequeue_poll_ms(20),
    )
    .unwrap()
}

#[test]
fn test_fresh_pool_snapshot() {
    let pool = pool();
    let metrics = pool.metrics();

    assert_eq!(metrics.workers, 2);
    assert_eq!(metrics.busy_workers, 0);
    assert_eq!(metrics.submitted, 0);
    assert_eq!(metrics.executed(), 0);
    assert_eq!(metrics.queued_total(), 0);
    assert_eq!(metrics.avg_wait(), None);
    assert_eq!(metrics.avg_exec(), None);
    pool.shutdown(true);
}

#[test]
fn test_counters_after_mixed_outcomes() {
    let pool = pool();

    let ok = pool.submit(Priority::Normal, || Ok(1)).unwrap();
    let bad = pool
        .submit(Priority::Normal, || Err(anyhow::anyhow!("nope")))
        .unwrap();
    ok.wait(Duration::from_secs(5)).unwrap();
    let _ = bad.wait(Duration::from_secs(5));

    let metrics = pool.metrics();
    assert_eq!(metrics.submitted, 2);
    assert_eq!(metrics.completed, 1);
    assert_eq!(metrics.failed, 1);
    assert_eq!(metrics.executed(), 2);
    pool.shutdown(true);
}

#[test]
fn test_busy_worker_gauge_during_execution() {
    let pool = pool();
    let future = pool
        .submit(Priority::High, || {
            thread::sleep(Duration::from_millis(200));
            Ok(0)
        })
        .unwrap();

    thread::sleep(Duration::from_millis(80));
    assert_eq!(pool.metrics().busy_workers, 1);

    future.wait(Duration::from_secs(5)).unwrap();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(pool.metrics().busy_workers, 0);
    pool.shutdown(true);
}

#[test]
fn test_snapshot_serializes_to_json() {
    let pool = pool();
    let future = pool.submit(Priority::Low, || Ok(3)).unwrap();
    future.wait(Duration::from_secs(5)).unwrap();

    let json = serde_json::to_value(pool.metrics()).unwrap();
    assert_eq!(json["submitted"], 1);
    assert_eq!(json["completed"], 1);
    assert!(json["queued"].is_array());
    pool.shutdown(true);
}
