//! Tests for configuration validation and parsing

use std::time::Duration;

use taskforge::config::PoolConfig;

#[test]
fn test_default_config_is_valid() {
    let config = PoolConfig::new();
    assert!(config.validate().is_ok());
    assert_eq!(config.min_workers, 1);
    assert!(config.max_workers >= config.min_workers);
    assert_eq!(config.scale_up_factor, 2);
    assert_eq!(config.shutdown_timeout_ms, None);
}

#[test]
fn test_fluent_setters() {
    let config = PoolConfig::new()
        .with_min_workers(2)
        .with_max_workers(6)
        .with_scale_up_factor(3)
        .with_idle_timeout_ms(1_500)
        .with_dequeue_poll_ms(25)
        .with_shutdown_timeout_ms(4_000)
        .with_thread_stack_size(512 * 1024);

    assert_eq!(config.min_workers, 2);
    assert_eq!(config.max_workers, 6);
    assert_eq!(config.scale_up_factor, 3);
    assert_eq!(config.idle_timeout(), Duration::from_millis(1_500));
    assert_eq!(config.dequeue_poll_interval(), Duration::from_millis(25));
    assert_eq!(config.shutdown_timeout(), Some(Duration::from_secs(4)));
    assert_eq!(config.thread_stack_size, 512 * 1024);
}

#[test]
fn test_zero_min_workers_is_rejected() {
    let config = PoolConfig::new().with_min_workers(0);
    assert!(config.validate().is_err());
}

#[test]
fn test_max_below_min_is_rejected() {
    let config = PoolConfig::new().with_min_workers(4).with_max_workers(2);
    assert!(config.validate().is_err());
}

#[test]
fn test_zero_scale_up_factor_is_rejected() {
    let config = PoolConfig::new().with_scale_up_factor(0);
    assert!(config.validate().is_err());
}

#[test]
fn test_zero_poll_interval_is_rejected() {
    let config = PoolConfig::new().with_dequeue_poll_ms(0);
    assert!(config.validate().is_err());
}

#[test]
fn test_from_json_str_valid() {
    let config = PoolConfig::from_json_str(
        r#"{
            "min_workers": 2,
            "max_workers": 8,
            "scale_up_factor": 2,
            "idle_timeout_ms": 5000,
            "dequeue_poll_ms": 100,
            "thread_stack_size": 2097152
        }"#,
    )
    .unwrap();
    assert_eq!(config.min_workers, 2);
    assert_eq!(config.max_workers, 8);
    assert_eq!(config.shutdown_timeout_ms, None);
}

#[test]
fn test_from_json_str_rejects_invalid_values() {
    let err = PoolConfig::from_json_str(
        r#"{
            "min_workers": 0,
            "max_workers": 8,
            "scale_up_factor": 2,
            "idle_timeout_ms": 5000,
            "dequeue_poll_ms": 100,
            "thread_stack_size": 2097152
        }"#,
    )
    .unwrap_err();
    assert!(err.contains("min_workers"));
}

#[test]
fn test_from_json_str_rejects_malformed_input() {
    let err = PoolConfig::from_json_str("{not json").unwrap_err();
    assert!(err.contains("parse error"));
}
