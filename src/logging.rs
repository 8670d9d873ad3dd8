//! Logging setup.
//!
//! The activator emits `tracing` events; this installs a console subscriber
//! for binaries and tests that do not bring their own.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, EnvFilter};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Install a fmt subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once. An existing global subscriber is kept.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let result = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();

        if result.is_err() {
            tracing::debug!("global tracing subscriber already set, keeping it");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_logging();
        init_logging();
        assert!(LOGGER_INITIALIZED.get().is_some());
    }
}
