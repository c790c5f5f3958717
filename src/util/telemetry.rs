//! Telemetry helpers for structured logging.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is not set: pool lifecycle events
/// (startup, scaling, shutdown) at info, nothing per-task.
const DEFAULT_DIRECTIVES: &str = "taskforge=info";

/// Install a default env-filtered subscriber if none is set.
///
/// Applications with their own subscriber are left untouched; call this
/// from binaries and tests that want pool lifecycle events on stderr.
/// `RUST_LOG=taskforge=debug` additionally surfaces per-task submit,
/// execute, and cancel events.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
