//! # Telemetry
//!
//! Installs the global `tracing` subscriber for processes embedding the
//! intake service.

use tracing_subscriber::EnvFilter;

/// Builds the filter: `RUST_LOG` if set and valid, otherwise `fallback`.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Configuration
/// - Default filter comes from `[logging] filter` in `sales.toml`
/// - Override with `RUST_LOG` (e.g. `RUST_LOG=atlas_sales=trace`)
///
/// Returns `false` if a global subscriber was already installed, which is
/// the normal case in tests that call this more than once.
pub fn init_tracing(fallback: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(fallback))
        .with_target(true)
        .try_init()
        .is_ok()
}
