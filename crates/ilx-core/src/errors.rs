use std::path::PathBuf;

use thiserror::Error;

/// Error types for ILX operations
#[derive(Error, Debug)]
pub enum IlxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid tree document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid reference token '{token}': {reason}")]
    InvalidReference { token: String, reason: String },

    #[error("Malformed markup: {message}")]
    MalformedMarkup { message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No project root above {path}")]
    NoProjectRoot { path: PathBuf },
}

impl IlxError {
    /// Create an invalid reference error
    pub fn invalid_reference(token: &str, reason: &str) -> Self {
        Self::InvalidReference {
            token: token.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a malformed markup error
    pub fn malformed_markup(message: impl Into<String>) -> Self {
        Self::MalformedMarkup {
            message: message.into(),
        }
    }
}

/// Result type for ILX operations
pub type Result<T> = std::result::Result<T, IlxError>;
