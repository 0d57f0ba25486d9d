//! Test utilities shared by unit and integration tests.
//!
//! Available with `cfg(test)` or the `test-utils` feature.

pub mod fixtures;

pub use fixtures::TopologyFixture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has any effect. With `level` set, that level is used;
/// otherwise logging is enabled only if `RUST_LOG` is set.
///
/// # Example
///
/// ```rust,no_run
/// use tracing::Level;
///
/// weave::test_utils::init_test_logging(Some(Level::TRACE));
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
