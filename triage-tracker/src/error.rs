//! Error types for tracker operations

use thiserror::Error;

/// Tracker layer error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not query tracker issues, response code {status_code}")]
    RetrievalFailed { status_code: u16 },

    #[error("Could not write tracker issue, response code {status_code}")]
    WriteFailed { status_code: u16 },

    #[error("Search still incomplete after {pages} pages ({total} results declared)")]
    PaginationLimit { pages: usize, total: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid tracker URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Core domain error: {0}")]
    Core(#[from] triage_core::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl Error {
    /// Whether the tracker itself failed or could not be reached
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::RetrievalFailed { .. }
                | Error::WriteFailed { .. }
                | Error::PaginationLimit { .. }
                | Error::Http(_)
        )
    }
}

/// Convenience result type for tracker operations
pub type Result<T> = std::result::Result<T, Error>;
