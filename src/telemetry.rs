//! Tracing setup for the binary.
//!
//! Library code only emits events; call `init_tracing` once at startup.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a compact fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Returns `false` if a global subscriber was already set.
#[must_use]
pub fn init_tracing() -> bool {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
