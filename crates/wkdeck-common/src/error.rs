//! Error types shared across wkdeck crates

use thiserror::Error;

/// Result type alias for wkdeck operations
pub type Result<T> = std::result::Result<T, WkError>;

/// Errors that are not specific to one pipeline stage
#[derive(Error, Debug)]
pub enum WkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl WkError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the error was raised while reading configuration
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
