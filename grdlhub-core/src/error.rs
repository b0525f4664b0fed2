//! Error types for GrdlHub.

use thiserror::Error;

/// Errors that can occur in GrdlHub operations.
///
/// Every error is scoped to the single operation that raised it; nothing
/// here is fatal to the process.
#[derive(Error, Debug)]
pub enum HubError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error(
        "Appointment '{id}' was changed by someone else (expected revision {expected}, found {actual})"
    )]
    Conflict {
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl HubError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        HubError::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        HubError::Validation(msg.into())
    }
}

impl From<serde_json::Error> for HubError {
    fn from(e: serde_json::Error) -> Self {
        HubError::Serialization(e.to_string())
    }
}

/// Result type alias for GrdlHub operations.
pub type HubResult<T> = Result<T, HubError>;
