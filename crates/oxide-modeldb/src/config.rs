//! Connection pool configuration.

use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable holding the connection URL.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

/// Environment variable overriding [`DbConfig::max_connections`].
pub const ENV_MAX_CONNECTIONS: &str = "MODELDB_MAX_CONNECTIONS";

/// Environment variable overriding [`DbConfig::acquire_timeout`], in seconds.
pub const ENV_ACQUIRE_TIMEOUT_SECS: &str = "MODELDB_ACQUIRE_TIMEOUT_SECS";

/// Settings for opening a [`crate::ModelDb`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Connection URL; its scheme selects the dialect.
    pub url: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// How long to wait for a free connection.
    pub acquire_timeout: Duration,
}

impl DbConfig {
    /// Default pool size.
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

    /// Default connection acquire timeout.
    pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a configuration with default pool settings.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Sets the maximum number of pooled connections.
    #[must_use]
    pub const fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the connection acquire timeout.
    #[must_use]
    pub const fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// `DATABASE_URL` is required; `MODELDB_MAX_CONNECTIONS` and
    /// `MODELDB_ACQUIRE_TIMEOUT_SECS` override the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the URL is missing or an override
    /// is not a number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps variable names to
    /// values.
    ///
    /// # Errors
    ///
    /// See [`DbConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ENV_DATABASE_URL)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::InvalidConfig(format!("{ENV_DATABASE_URL} is not set")))?;

        let mut config = Self::new(url);
        if let Some(value) = lookup(ENV_MAX_CONNECTIONS) {
            config.max_connections = parse_number(ENV_MAX_CONNECTIONS, &value)?;
        }
        if let Some(value) = lookup(ENV_ACQUIRE_TIMEOUT_SECS) {
            config.acquire_timeout =
                Duration::from_secs(parse_number(ENV_ACQUIRE_TIMEOUT_SECS, &value)?);
        }
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("{key} must be a number, got '{value}'")))
}
