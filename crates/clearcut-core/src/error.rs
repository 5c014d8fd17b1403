//! Error types for ClearCut.

use thiserror::Error;

/// Main error type for ClearCut operations.
#[derive(Error, Debug)]
pub enum ClearCutError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timeline error: {0}")]
    Timeline(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export cancelled")]
    Cancelled,
}

/// Result type alias for ClearCut operations.
pub type Result<T> = std::result::Result<T, ClearCutError>;
