//! Tracing subscriber setup for the command-line binary.
//!
//! Events go to stderr so stdout stays machine-readable. `RUST_LOG` overrides
//! the default filter.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter applied when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LogError {
    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs the global subscriber, falling back to `default_filter` when
/// `RUST_LOG` is not usable.
///
/// # Errors
///
/// Returns [`LogError::Install`] when a subscriber is already installed.
pub fn init_logging(default_filter: &str) -> Result<(), LogError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;
    Ok(())
}
