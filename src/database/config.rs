//! Connection and execution configuration
//!
//! Configuration can be built in code, or loaded from a base TOML file with an
//! optional override file merged on top of it. Environment variables are
//! applied last:
//!
//! * `RUSTF_QUERY_DATABASE_URL` replaces the connection URL
//! * `RUSTF_QUERY_MAX_CONNECTIONS` replaces the pool size
//!
//! ```toml
//! [database]
//! url = "postgres://app@localhost/shop"
//! max_connections = 20
//!
//! [query]
//! use_transaction = true
//! quote_identifiers = false
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::pool::PoolOptions;
use std::env;
use std::time::Duration;

#[cfg(feature = "config")]
use std::{fs, path::Path};

/// Configuration for a single database connection pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConnectionConfig {
    /// Database connection URL (required)
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Idle timeout in seconds (how long a connection can be idle before being closed)
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,

    /// Maximum lifetime of a connection in seconds
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime: u64,
}

impl DatabaseConnectionConfig {
    /// Configuration with default pool settings for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout: default_connect_timeout(),
            idle_timeout: default_idle_timeout(),
            max_lifetime: default_max_lifetime(),
        }
    }

    pub fn builder() -> DatabaseConnectionConfigBuilder {
        DatabaseConnectionConfigBuilder::new()
    }

    /// sqlx pool options for any of the supported engines
    pub fn pool_options<DB: sqlx::Database>(&self) -> PoolOptions<DB> {
        PoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout))
            .idle_timeout(Duration::from_secs(self.idle_timeout))
            .max_lifetime(Duration::from_secs(self.max_lifetime))
    }

    /// Check the values a pool cannot be built from
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::config("Database URL is required"));
        }
        if self.max_connections == 0 {
            return Err(Error::config("max_connections must be at least 1"));
        }
        if self.min_connections > self.max_connections {
            return Err(Error::config(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }
}

/// Execution defaults applied through [`crate::Query::with_defaults`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDefaults {
    /// Wrap every execution in one transaction
    #[serde(default = "default_use_transaction")]
    pub use_transaction: bool,

    /// Keep pending statements after an execution
    #[serde(default)]
    pub preserve_queries: bool,

    /// Quote identifiers with the dialect's quote character
    #[serde(default)]
    pub quote_identifiers: bool,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            use_transaction: default_use_transaction(),
            preserve_queries: false,
            quote_identifiers: false,
        }
    }
}

/// Top-level configuration file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub database: Option<DatabaseConnectionConfig>,

    #[serde(default)]
    pub query: QueryDefaults,
}

impl QueryConfig {
    /// Configuration from environment variables only
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a single TOML file
    #[cfg(feature = "config")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let value = load_toml_value(path.as_ref())?;
        let mut config = Self::from_value(value)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load `base` and merge `overrides` on top of it when that file exists
    #[cfg(feature = "config")]
    pub fn load<P: AsRef<Path>, O: AsRef<Path>>(base: P, overrides: O) -> Result<Self> {
        let mut merged = load_toml_value(base.as_ref())?;

        let overrides = overrides.as_ref();
        if overrides.exists() {
            log::debug!("Merging configuration overrides from: {}", overrides.display());
            let layer = load_toml_value(overrides)?;
            merged = serde_toml_merge::merge(merged, layer).map_err(|e| {
                Error::config(format!("Failed to merge configuration files: {}", e))
            })?;
        }

        let mut config = Self::from_value(merged)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    #[cfg(feature = "config")]
    fn from_value(value: toml::Value) -> Result<Self> {
        let config: QueryConfig = value
            .try_into()
            .map_err(|e| Error::config(format!("Invalid configuration: {}", e)))?;
        if let Some(database) = &config.database {
            database.validate()?;
        }
        Ok(config)
    }

    /// Apply `RUSTF_QUERY_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = env::var("RUSTF_QUERY_DATABASE_URL") {
            match self.database.as_mut() {
                Some(database) => database.url = url,
                None => self.database = Some(DatabaseConnectionConfig::new(url)),
            }
        }
        if let Ok(max_conn) = env::var("RUSTF_QUERY_MAX_CONNECTIONS") {
            let max_connections = max_conn
                .parse()
                .map_err(|_| Error::config("Invalid RUSTF_QUERY_MAX_CONNECTIONS value"))?;
            match self.database.as_mut() {
                Some(database) => database.max_connections = max_connections,
                None => log::warn!(
                    "RUSTF_QUERY_MAX_CONNECTIONS ignored: no database is configured"
                ),
            }
        }
        Ok(())
    }

    /// The configured connection, or a configuration error
    pub fn database(&self) -> Result<&DatabaseConnectionConfig> {
        self.database
            .as_ref()
            .ok_or_else(|| Error::config("No [database] section configured"))
    }
}

#[cfg(feature = "config")]
fn load_toml_value(path: &Path) -> Result<toml::Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;
    let value: toml::Value = toml::from_str(&content)?;
    log::debug!("Loaded configuration from: {}", path.display());
    Ok(value)
}

fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    30
}
fn default_idle_timeout() -> u64 {
    600
} // 10 minutes
fn default_max_lifetime() -> u64 {
    1800
} // 30 minutes
fn default_use_transaction() -> bool {
    true
}

/// Builder for DatabaseConnectionConfig
#[derive(Debug, Clone)]
pub struct DatabaseConnectionConfigBuilder {
    url: Option<String>,
    max_connections: u32,
    min_connections: u32,
    connect_timeout: u64,
    idle_timeout: u64,
    max_lifetime: u64,
}

impl DatabaseConnectionConfigBuilder {
    pub fn new() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout: default_connect_timeout(),
            idle_timeout: default_idle_timeout(),
            max_lifetime: default_max_lifetime(),
        }
    }

    /// Set the database URL (required)
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Set connection timeout in seconds
    pub fn connect_timeout(mut self, timeout: u64) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set idle timeout in seconds
    pub fn idle_timeout(mut self, timeout: u64) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set maximum lifetime in seconds
    pub fn max_lifetime(mut self, lifetime: u64) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    pub fn build(self) -> Result<DatabaseConnectionConfig> {
        let url = self.url.ok_or_else(|| Error::missing_field("url"))?;
        let config = DatabaseConnectionConfig {
            url,
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout: self.connect_timeout,
            idle_timeout: self.idle_timeout,
            max_lifetime: self.max_lifetime,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for DatabaseConnectionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
