//! Error types for data access.

use thiserror::Error;

/// Errors raised by the data layer.
#[derive(Debug, Error)]
pub enum DataError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Upstream source error (HTTP status, malformed payload, retries exhausted)
    #[error("Source error: {0}")]
    Source(String),

    /// Transport-level HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Redis bus error
    #[error("Bus error: {0}")]
    Bus(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}


/// Result alias for data operations.
pub type Result<T> = std::result::Result<T, DataError>;
