//! Common error types for JobLens

use thiserror::Error;

/// Common result type for JobLens operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the JobLens crates
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

    /// Invalid credentials or invalid/expired token
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Search or detail feed failed mid-run
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Duplicate registration, malformed reattachment descriptor, etc.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
