//! Logger bootstrap for binaries and benches.
//!
//! Library code logs through the `log` facade; this installs a `tracing`
//! subscriber and bridges `log` records into it.

use thiserror::Error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Failure to install the global logger.
#[derive(Debug, Error)]
pub enum LoggerError {
    /// A tracing subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
    /// A `log` logger was already installed.
    #[error("failed to bridge log records: {0}")]
    Bridge(#[from] log::SetLoggerError),
}

/// Installs the global subscriber. Honours `RUST_LOG`, falling back to
/// [`DEFAULT_FILTER`].
pub fn init() -> Result<(), LoggerError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true));

    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}
