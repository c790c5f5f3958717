//! Fluent construction of worker pools from configuration.

use std::marker::PhantomData;

use crate::config::PoolConfig;
use crate::core::{PoolError, WorkerPool};

/// Builder over [`PoolConfig`] ending in a started [`WorkerPool`].
///
/// ```rust
/// use taskforge::builders::PoolBuilder;
///
/// let pool = PoolBuilder::<String>::new()
///     .min_workers(1)
///     .max_workers(2)
///     .dequeue_poll_ms(50)
///     .build()
///     .unwrap();
/// pool.shutdown(true);
/// ```
#[derive(Debug, Clone)]
pub struct PoolBuilder<R> {
    config: PoolConfig,
    _result: PhantomData<R>,
}

impl<R: Send + 'static> PoolBuilder<R> {
    /// Start from default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PoolConfig::new(),
            _result: PhantomData,
        }
    }

    /// Start from an existing configuration.
    #[must_use]
    pub const fn from_config(config: PoolConfig) -> Self {
        Self {
            config,
            _result: PhantomData,
        }
    }

    /// Minimum worker count.
    #[must_use]
    pub const fn min_workers(mut self, min: usize) -> Self {
        self.config.min_workers = min;
        self
    }

    /// Maximum worker count.
    #[must_use]
    pub const fn max_workers(mut self, max: usize) -> Self {
        self.config.max_workers = max;
        self
    }

    /// Scale-up factor.
    #[must_use]
    pub const fn scale_up_factor(mut self, factor: usize) -> Self {
        self.config.scale_up_factor = factor;
        self
    }

    /// Idle timeout before a worker becomes a scale-down candidate.
    #[must_use]
    pub const fn idle_timeout_ms(mut self, ms: u64) -> Self {
        self.config.idle_timeout_ms = ms;
        self
    }

    /// Bounded dequeue wait used by workers.
    #[must_use]
    pub const fn dequeue_poll_ms(mut self, ms: u64) -> Self {
        self.config.dequeue_poll_ms = ms;
        self
    }

    /// Per-worker shutdown join cap.
    #[must_use]
    pub const fn shutdown_timeout_ms(mut self, ms: u64) -> Self {
        self.config.shutdown_timeout_ms = Some(ms);
        self
    }

    /// Validate the assembled configuration and start the pool.
    ///
    /// # Errors
    ///
    /// Same as [`WorkerPool::new`].
    pub fn build(self) -> Result<WorkerPool<R>, PoolError> {
        WorkerPool::new(self.config)
    }
}

impl<R: Send + 'static> Default for PoolBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}
