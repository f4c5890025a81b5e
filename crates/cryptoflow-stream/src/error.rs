//! Stream consumer error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    /// Upstream feed failure (connect, protocol, close)
    #[error("Feed error: {0}")]
    Feed(String),

    /// Redis bus failure
    #[error("Bus error: {0}")]
    Bus(#[from] cryptoflow_data::DataError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StreamError>;
