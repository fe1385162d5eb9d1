//! Tracing subscriber initialisation for binaries embedding Surveyor.

use crate::error::{Result, SurveyorError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `default_directive` (for example
/// [`GeneralConfig::log_filter`](crate::GeneralConfig)) is used.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(default_directive: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .map_err(|e| SurveyorError::Internal(format!("failed to install tracing subscriber: {e}")))
}
