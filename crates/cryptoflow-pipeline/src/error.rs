//! Pipeline error types.

use thiserror::Error;

/// Errors surfaced by pipeline jobs.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Data layer error (source, warehouse or bus)
    #[error("Data error: {0}")]
    Data(#[from] cryptoflow_data::DataError),

    /// Direct database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
