//! Worker pool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default worker thread stack size (2 MiB).
const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;

/// Configuration for a [`WorkerPool`](crate::core::WorkerPool).
///
/// All knobs have working defaults; construct with [`PoolConfig::new`] and
/// override with the `with_*` setters:
///
/// ```rust
/// use taskforge::config::PoolConfig;
///
/// let config = PoolConfig::new()
///     .with_min_workers(2)
///     .with_max_workers(8)
///     .with_idle_timeout_ms(2_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Minimum number of worker threads kept alive. Must be at least 1.
    pub min_workers: usize,
    /// Maximum number of worker threads. Must be >= `min_workers`.
    pub max_workers: usize,
    /// Scale-up trigger: grow the pool when queued tasks exceed
    /// `current_workers * scale_up_factor`. Must be at least 1.
    pub scale_up_factor: usize,
    /// How long a worker must sit idle before it becomes a scale-down
    /// candidate, in milliseconds.
    pub idle_timeout_ms: u64,
    /// Bounded wait used by workers when dequeuing, in milliseconds. This
    /// also bounds how often shutdown and resize conditions are polled.
    pub dequeue_poll_ms: u64,
    /// Per-worker cap on how long shutdown waits for an in-flight task
    /// before detaching the worker. `None` waits indefinitely.
    #[serde(default)]
    pub shutdown_timeout_ms: Option<u64>,
    /// Stack size for worker threads, in bytes.
    pub thread_stack_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_workers: 1,
            max_workers: num_cpus::get().max(1),
            scale_up_factor: 2,
            idle_timeout_ms: 5_000,
            dequeue_poll_ms: 100,
            shutdown_timeout_ms: None,
            thread_stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl PoolConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum worker count.
    #[must_use]
    pub const fn with_min_workers(mut self, min: usize) -> Self {
        self.min_workers = min;
        self
    }

    /// Set the maximum worker count.
    #[must_use]
    pub const fn with_max_workers(mut self, max: usize) -> Self {
        self.max_workers = max;
        self
    }

    /// Set the scale-up factor.
    #[must_use]
    pub const fn with_scale_up_factor(mut self, factor: usize) -> Self {
        self.scale_up_factor = factor;
        self
    }

    /// Set the idle timeout in milliseconds.
    #[must_use]
    pub const fn with_idle_timeout_ms(mut self, ms: u64) -> Self {
        self.idle_timeout_ms = ms;
        self
    }

    /// Set the dequeue poll interval in milliseconds.
    #[must_use]
    pub const fn with_dequeue_poll_ms(mut self, ms: u64) -> Self {
        self.dequeue_poll_ms = ms;
        self
    }

    /// Cap how long shutdown waits for each worker, in milliseconds.
    #[must_use]
    pub const fn with_shutdown_timeout_ms(mut self, ms: u64) -> Self {
        self.shutdown_timeout_ms = Some(ms);
        self
    }

    /// Set the worker thread stack size in bytes.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Idle timeout as a [`Duration`].
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Dequeue poll interval as a [`Duration`].
    #[must_use]
    pub const fn dequeue_poll_interval(&self) -> Duration {
        Duration::from_millis(self.dequeue_poll_ms)
    }

    /// Shutdown timeout as a [`Duration`], if configured.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Option<Duration> {
        self.shutdown_timeout_ms.map(Duration::from_millis)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message describing the first violated
    /// constraint.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_workers == 0 {
            return Err("min_workers must be greater than 0".into());
        }
        if self.max_workers < self.min_workers {
            return Err("max_workers must be at least min_workers".into());
        }
        if self.scale_up_factor == 0 {
            return Err("scale_up_factor must be greater than 0".into());
        }
        if self.idle_timeout_ms == 0 {
            return Err("idle_timeout_ms must be greater than 0".into());
        }
        if self.dequeue_poll_ms == 0 {
            return Err("dequeue_poll_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse a pool configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse error or the first validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
