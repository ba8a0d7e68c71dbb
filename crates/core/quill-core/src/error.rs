//! Error types for Quill core

use thiserror::Error;

/// Main error type for Quill operations
#[derive(Debug, Error)]
pub enum QuillError {
    /// Submission rejected before any network action
    #[error("Validation error: {0}")]
    Validation(String),

    /// Generation service answered with a non-success status
    #[error("Request failed with status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Server supplied error text, or the raw body
        message: String,
    },

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body could not be read to completion
    #[error("Stream error: {0}")]
    Stream(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Convenient Result type using QuillError
pub type Result<T> = std::result::Result<T, QuillError>;

impl QuillError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        QuillError::Validation(msg.into())
    }

    /// Create a status error
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        QuillError::Status {
            status,
            message: message.into(),
        }
    }

    /// Create a stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        QuillError::Stream(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        QuillError::Config(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        QuillError::Other(msg.into())
    }

    /// Whether the error came from the transport rather than from input validation
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            QuillError::Status { .. } | QuillError::Network(_) | QuillError::Stream(_)
        )
    }
}
