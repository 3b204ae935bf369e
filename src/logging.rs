//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! The filter is read from the `READYTODO_LOG` environment variable using
//! `EnvFilter` directive syntax (for example `readytodo=debug`), falling back
//! to `info`. Output goes to stderr.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
pub const LOG_ENV_VAR: &str = "READYTODO_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directives could not be parsed.
    #[error("invalid log filter '{directives}': {source}")]
    InvalidFilter {
        /// Directives as supplied.
        directives: String,
        /// Parser failure.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    /// A global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

/// Installs the global subscriber using `READYTODO_LOG`.
///
/// # Errors
///
/// Returns [`LoggingError`] when the filter is invalid or a subscriber is
/// already installed.
pub fn init_logging() -> Result<(), LoggingError> {
    let directives = std::env::var(LOG_ENV_VAR).ok();
    init_logging_with(directives.as_deref())
}

/// Installs the global subscriber with explicit filter directives.
///
/// `None` or blank directives select the `info` default.
///
/// # Errors
///
/// Returns [`LoggingError`] when the filter is invalid or a subscriber is
/// already installed.
pub fn init_logging_with(directives: Option<&str>) -> Result<(), LoggingError> {
    let filter = build_filter(directives)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| LoggingError::Install(err.to_string()))
}

fn build_filter(directives: Option<&str>) -> Result<EnvFilter, LoggingError> {
    let chosen = directives
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVES);
    EnvFilter::try_new(chosen).map_err(|source| LoggingError::InvalidFilter {
        directives: chosen.to_owned(),
        source,
    })
}
