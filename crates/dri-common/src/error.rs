//! Error types for DRI

use thiserror::Error;

/// Result type alias for DRI operations
pub type Result<T> = std::result::Result<T, DriError>;

/// Main error type for DRI
#[derive(Error, Debug)]
pub enum DriError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
