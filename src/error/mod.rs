use crate::driver::DriverType;
use thiserror::Error;

pub mod context;

pub type Result<T> = std::result::Result<T, Error>;

// Re-export context helpers
pub use context::{ErrorChain, ErrorContext};

/// Main error type for rustf-query
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors: programmer mistakes detected before any I/O
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid identifier for {field}: '{value}'")]
    InvalidIdentifier { field: String, value: String },

    #[error("No driver configured; {0} needs a driver type to render")]
    MissingDriver(String),

    #[error("Invalid syntax for {driver}: {message}")]
    InvalidSyntax { driver: DriverType, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database adapter is not connected")]
    NotConnected,

    // Compatibility errors
    #[error("Feature not supported for {driver}: {feature}")]
    UnsupportedFeature { driver: DriverType, feature: String },

    #[error("Unsupported operation for {driver}: {statement}")]
    Incompatible {
        driver: DriverType,
        statement: String,
    },

    // Database errors
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    #[error("Database query error: {0}")]
    DatabaseQuery(String),

    #[error("Database transaction error: {0}")]
    DatabaseTransaction(String),

    #[error("Request not executable: {0}")]
    NotExecutable(#[source] Box<Error>),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    // Error with context chain
    #[error("{message}")]
    WithContext {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn invalid_identifier(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn missing_driver(statement: impl Into<String>) -> Self {
        Self::MissingDriver(statement.into())
    }

    pub fn invalid_syntax(driver: DriverType, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            driver,
            message: message.into(),
        }
    }

    pub fn unsupported(driver: DriverType, feature: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            driver,
            feature: feature.into(),
        }
    }

    pub fn incompatible(driver: DriverType, statement: impl Into<String>) -> Self {
        Self::Incompatible {
            driver,
            statement: statement.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    // Database error constructors
    pub fn database_connection(msg: impl Into<String>) -> Self {
        Self::DatabaseConnection(msg.into())
    }

    pub fn database_query(msg: impl Into<String>) -> Self {
        Self::DatabaseQuery(msg.into())
    }

    pub fn database_transaction(msg: impl Into<String>) -> Self {
        Self::DatabaseTransaction(msg.into())
    }

    /// Wrap an error as the fatal "request not executable" error.
    /// Already-wrapped errors are returned unchanged.
    pub fn not_executable(self) -> Self {
        match self {
            Error::NotExecutable(_) => self,
            other => Self::NotExecutable(Box::new(other)),
        }
    }

    // Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if the error comes from a driver not supporting a statement or feature
    pub fn is_compatibility(&self) -> bool {
        match self {
            Error::UnsupportedFeature { .. } | Error::Incompatible { .. } => true,
            Error::WithContext { source, .. } => source.is_compatibility(),
            _ => false,
        }
    }

    /// Check if the error is a programmer error detected before any I/O
    pub fn is_configuration(&self) -> bool {
        match self {
            Error::MissingField { .. }
            | Error::InvalidIdentifier { .. }
            | Error::MissingDriver(_)
            | Error::InvalidSyntax { .. }
            | Error::Config(_)
            | Error::NotConnected => true,
            Error::WithContext { source, .. } => source.is_configuration(),
            _ => false,
        }
    }

    /// Get a stable error code for logs and reports
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::MissingField { .. } => "E_MISSING_FIELD",
            Error::InvalidIdentifier { .. } => "E_INVALID_IDENTIFIER",
            Error::MissingDriver(_) => "E_MISSING_DRIVER",
            Error::InvalidSyntax { .. } => "E_INVALID_SYNTAX",
            Error::Config(_) => "E_CONFIG",
            Error::NotConnected => "E_NOT_CONNECTED",
            Error::UnsupportedFeature { .. } => "E_UNSUPPORTED_FEATURE",
            Error::Incompatible { .. } => "E_INCOMPATIBLE",
            Error::DatabaseConnection(_) => "E_DB_CONNECTION",
            Error::DatabaseQuery(_) => "E_DB_QUERY",
            Error::DatabaseTransaction(_) => "E_DB_TRANSACTION",
            Error::NotExecutable(_) => "E_NOT_EXECUTABLE",
            Error::Internal(_) => "E_INTERNAL",
            Error::Json(_) => "E_JSON",
            Error::Io(_) => "E_IO",
            #[cfg(feature = "config")]
            Error::Toml(_) => "E_TOML",
            Error::Sqlx(_) => "E_SQLX",
            Error::WithContext { source, .. } => source.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_executable_wraps_once() {
        let err = Error::database_connection("refused").not_executable();
        let err = err.not_executable();

        match err {
            Error::NotExecutable(inner) => {
                assert!(matches!(*inner, Error::DatabaseConnection(_)));
            }
            other => panic!("Expected NotExecutable, got {:?}", other),
        }
    }

    #[test]
    fn test_classification_sees_through_context() {
        let err = Error::unsupported(DriverType::SQLite, "TRUNCATE").with_context("truncate logs");
        assert!(err.is_compatibility());
        assert!(!err.is_configuration());
        assert_eq!(err.error_code(), "E_UNSUPPORTED_FEATURE");

        let err = Error::missing_field("table");
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "Missing required field: table");
    }
}
