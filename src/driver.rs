//! Supported database engines

use serde::{Deserialize, Serialize};
use std::fmt;

/// Database engines the statement providers can render for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverType {
    MySQL,
    MariaDB,
    PostgreSQL,
    SQLite,
}

impl DriverType {
    pub const ALL: [DriverType; 4] = [
        DriverType::MySQL,
        DriverType::MariaDB,
        DriverType::PostgreSQL,
        DriverType::SQLite,
    ];

    /// Name of the sqlx driver backing this engine
    pub fn driver_name(&self) -> &'static str {
        match self {
            DriverType::MySQL => "mysql",
            DriverType::MariaDB => "mariadb",
            DriverType::PostgreSQL => "postgres",
            DriverType::SQLite => "sqlite",
        }
    }

    /// URL schemes accepted for this engine
    pub fn url_schemes(&self) -> &'static [&'static str] {
        match self {
            DriverType::MySQL => &["mysql"],
            DriverType::MariaDB => &["mariadb"],
            DriverType::PostgreSQL => &["postgres", "postgresql"],
            DriverType::SQLite => &["sqlite"],
        }
    }

    /// Detect the engine from a connection URL
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split_once(':')?.0.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|driver| driver.url_schemes().contains(&scheme.as_str()))
    }

    /// MySQL and MariaDB share most of their grammar
    pub fn is_mysql_family(&self) -> bool {
        matches!(self, DriverType::MySQL | DriverType::MariaDB)
    }
}

impl fmt::Display for DriverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverType::MySQL => "MySQL",
            DriverType::MariaDB => "MariaDB",
            DriverType::PostgreSQL => "PostgreSQL",
            DriverType::SQLite => "SQLite",
        };
        f.write_str(name)
    }
}
