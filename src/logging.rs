//! Logging initialization.
//!
//! The library only emits `tracing` events; the binary decides where they go.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the global subscriber.
///
/// * `verbose` - DEBUG level instead of INFO.
/// * `json_format` - one JSON object per line instead of human-readable text.
///
/// Log output goes to stderr; stdout is reserved for reports. `RUST_LOG`
/// overrides the level when set.
pub fn init(verbose: bool, json_format: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
