//! Common error types for tftstat

use thiserror::Error;

/// Common result type for tftstat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across tftstat crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization of a stored value failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input to a persistence operation
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
