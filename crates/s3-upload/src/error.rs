//! Upload error types

use thiserror::Error;

/// Errors raised by upload and delete operations.
///
/// Configuration problems are detected before any client is built. Storage
/// client failures are carried through untouched so callers can inspect the
/// underlying `object_store` error.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Transport(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Whether the error was raised before talking to storage.
    pub fn is_configuration(&self) -> bool {
        matches!(self, UploadError::Configuration(_))
    }
}

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;
