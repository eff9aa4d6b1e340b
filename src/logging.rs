//! Sets up structured logging with `tracing`.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// The filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install a global subscriber that pretty prints log events to stdout.
///
/// The level is read from the `RUST_LOG` environment variable, falling back
/// to [DEFAULT_LOG_FILTER].
///
/// # Panics
/// Panics if a global subscriber has already been installed.
pub fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}
