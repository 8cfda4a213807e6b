//! Tracing subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over `level` when set. Calling this twice is harmless.
pub fn init_logger(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if fmt().with_env_filter(filter).with_target(false).try_init().is_err() {
        tracing::debug!("Logger already initialized");
    }
}
