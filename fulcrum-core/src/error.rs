//! Error types for the Fulcrum clients.
//!
//! None of these cross the public client methods; they are collapsed into
//! `false` or an empty list at that boundary.

use thiserror::Error;

/// Custom error type for Fulcrum operations.
#[derive(Error, Debug)]
pub enum FulcrumError {
    /// A required environment variable is missing or a value is unusable.
    #[error("Config error: {0}")]
    Config(String),

    /// The remote endpoint answered with a non-success status.
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Connection-level failures reported by the HTTP client.
    #[error("Transport error: {0}")]
    Transport(reqwest::Error),

    /// Represents timeout errors.
    #[error("Operation timed out")]
    Timeout,

    /// Represents JSON parsing or serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Represents errors related to invalid URLs.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A field violates a length or emptiness rule.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<reqwest::Error> for FulcrumError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FulcrumError::Timeout
        } else if let Some(status) = err.status() {
            FulcrumError::Http { status: status.as_u16() }
        } else {
            FulcrumError::Transport(err)
        }
    }
}

/// A `Result` type alias for Fulcrum operations.
pub type Result<T> = std::result::Result<T, FulcrumError>;
