//! Store configuration for the `PostgreSQL` adapter.
//!
//! Settings come from environment variables, or from any lookup function so
//! callers and tests can supply values without touching the process
//! environment.

use crate::task::adapters::postgres::TaskPgPool;
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use std::time::Duration;
use thiserror::Error;

/// Variable holding the `PostgreSQL` connection URL.
pub const DATABASE_URL_VAR: &str = "READYTODO_DATABASE_URL";
/// Variable holding the maximum pool size.
pub const MAX_CONNECTIONS_VAR: &str = "READYTODO_DB_MAX_CONNECTIONS";
/// Variable holding the connection checkout timeout in seconds.
pub const TIMEOUT_SECS_VAR: &str = "READYTODO_DB_TIMEOUT_SECS";

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while reading configuration or building the pool.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is missing or blank.
    #[error("missing required setting {0}")]
    Missing(&'static str),
    /// A variable holds a value that cannot be used.
    #[error("invalid value '{value}' for {name}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
    /// The connection pool could not be built.
    #[error("failed to build connection pool: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

/// Connection settings for the task store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    database_url: String,
    max_connections: u32,
    connection_timeout: Duration,
}

impl StoreConfig {
    /// Creates a configuration with default pool settings.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connection_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the URL is missing or a numeric setting
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the URL is missing or a numeric setting
    /// does not parse or is zero.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup(DATABASE_URL_VAR)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing(DATABASE_URL_VAR))?;

        let mut config = Self::new(database_url);
        if let Some(max) = parse_positive::<u32>(&lookup, MAX_CONNECTIONS_VAR)? {
            config.max_connections = max;
        }
        if let Some(secs) = parse_positive::<u64>(&lookup, TIMEOUT_SECS_VAR)? {
            config.connection_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Sets the maximum number of pooled connections.
    #[must_use]
    pub const fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Sets how long a pool checkout may wait.
    #[must_use]
    pub const fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Returns the connection URL.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Returns the maximum number of pooled connections.
    #[must_use]
    pub const fn max_connections(&self) -> u32 {
        self.max_connections
    }

    /// Returns the pool checkout timeout.
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    /// Builds an r2d2 pool of `PostgreSQL` connections.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Pool`] when the initial connections cannot be
    /// established.
    pub fn build_pool(&self) -> Result<TaskPgPool, ConfigError> {
        let manager = ConnectionManager::<PgConnection>::new(self.database_url.as_str());
        let pool = Pool::builder()
            .max_size(self.max_connections)
            .connection_timeout(self.connection_timeout)
            .build(manager)?;
        Ok(pool)
    }
}

fn parse_positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<T>() {
        Ok(value) if value != T::default() => Ok(Some(value)),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw.clone(),
        }),
    }
}
