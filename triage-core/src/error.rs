//! Error types for the core domain

use thiserror::Error;

/// Core error type for domain operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid report: {message}")]
    InvalidReport { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

impl Error {
    /// Create an invalid report error
    pub fn invalid_report<S: Into<String>>(message: S) -> Self {
        Self::InvalidReport {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidReport { .. } | Error::Serialization(_))
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, Error>;
