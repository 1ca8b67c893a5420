//! Error types for PI Scout
//!
//! Provides a single error enum for the library crates with:
//! - Distinct variants for storage, configuration and transport failures
//! - Machine-readable error codes
//! - A fatal/non-fatal split used by the discovery batch

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,

    // Resource errors (4xxx)
    PiNotFound,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,
    TransactionError,

    // External service errors (8xxx)
    UpstreamError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,

            ErrorCode::PiNotFound => 4002,

            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,
            ErrorCode::TransactionError => 7003,

            ErrorCode::UpstreamError => 8001,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    // Resource errors
    #[error("PI not found: {id}")]
    PiNotFound { id: i64 },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    #[error("Transaction failed: {message}")]
    Transaction { message: String },

    // External service errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Shorthand for configuration failures
    pub fn config(message: impl Into<String>) -> Self {
        AppError::Configuration {
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::PiNotFound { .. } => ErrorCode::PiNotFound,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Transaction { .. } => ErrorCode::TransactionError,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    /// Errors that must stop a discovery run before traversal begins.
    ///
    /// Everything else is absorbed per item: the batch logs it and moves on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Configuration { .. }
                | AppError::Validation { .. }
                | AppError::DatabaseConnection { .. }
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::PiNotFound { id: 7 };
        assert_eq!(err.code(), ErrorCode::PiNotFound);
        assert_eq!(err.code().as_code(), 4002);
    }

    #[test]
    fn test_fatal_split() {
        assert!(AppError::config("weights do not sum to 1.0").is_fatal());
        assert!(AppError::DatabaseConnection {
            message: "unable to open database file".into()
        }
        .is_fatal());

        assert!(!AppError::PiNotFound { id: 3 }.is_fatal());
        assert!(!AppError::Transaction {
            message: "database is locked".into()
        }
        .is_fatal());
    }

    #[test]
    fn test_snapshot_read_failures_are_internal() {
        let io: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "graph.json").into();
        assert_eq!(io.code(), ErrorCode::InternalError);
        assert!(!io.is_fatal());

        let json: AppError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(json.code().as_code(), 9003);
    }

    #[test]
    fn test_config_error_conversion() {
        let err: AppError = config::ConfigError::Message("missing field".into()).into();
        assert_eq!(err.code(), ErrorCode::ConfigurationError);
        assert!(err.is_fatal());
    }
}
