//! Database access layer
//!
//! Adapters own a sqlx pool per engine and hand out [`DatabaseConnection`]s
//! to the [`crate::Query`] coordinator. [`connect`] picks the adapter from the
//! connection URL's scheme.

pub mod adapter;
pub mod adapters;
pub mod config;
pub mod types;

use crate::driver::DriverType;
use crate::error::{Error, Result};
use std::sync::Arc;

pub use adapter::{DatabaseAdapter, DatabaseConnection, QueryResult};
pub use adapters::{MySqlAdapter, PostgresAdapter, SqliteAdapter};
pub use config::{DatabaseConnectionConfig, DatabaseConnectionConfigBuilder, QueryConfig, QueryDefaults};
pub use types::SqlValue;

/// Open a pool for `config` with the adapter matching its URL scheme
pub async fn connect(config: &DatabaseConnectionConfig) -> Result<Arc<dyn DatabaseAdapter>> {
    config.validate()?;
    let driver = DriverType::from_url(&config.url).ok_or_else(|| {
        Error::config(format!(
            "Unsupported database URL scheme in '{}'",
            config.url.split_once(':').map(|(scheme, _)| scheme).unwrap_or(&config.url)
        ))
    })?;

    log::debug!("Connecting {} pool (max {} connections)", driver, config.max_connections);

    let adapter: Arc<dyn DatabaseAdapter> = match driver {
        DriverType::MySQL | DriverType::MariaDB => {
            Arc::new(MySqlAdapter::connect(driver.driver_name(), config).await?)
        }
        DriverType::PostgreSQL => Arc::new(PostgresAdapter::connect(driver.driver_name(), config).await?),
        DriverType::SQLite => Arc::new(SqliteAdapter::connect(driver.driver_name(), config).await?),
    };
    Ok(adapter)
}
