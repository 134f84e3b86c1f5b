//! Error types for the server application

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Server application error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("Tracker error: {0}")]
    Tracker(#[from] triage_tracker::Error),

    #[error("Core domain error: {0}")]
    Core(#[from] triage_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for server operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned from HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Issue tracker error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<triage_tracker::Error> for AppError {
    fn from(err: triage_tracker::Error) -> Self {
        match err {
            triage_tracker::Error::Core(ref core) if core.is_client_error() => {
                AppError::BadRequest(core.to_string())
            }
            ref e if e.is_upstream() => AppError::Upstream(e.to_string()),
            e => AppError::Internal(e.to_string()),
        }
    }
}

impl From<triage_core::Error> for AppError {
    fn from(err: triage_core::Error) -> Self {
        if err.is_client_error() {
            AppError::BadRequest(err.to_string())
        } else {
            AppError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Upstream(message) => (StatusCode::BAD_GATEWAY, message),
            AppError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!("Error during processing: {}", error_message);
        }

        let body = json!({
            "error": error_message
        });

        (status, axum::Json(body)).into_response()
    }
}
