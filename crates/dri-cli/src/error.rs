//! Error types for the DRI CLI

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Error type for CLI operations
///
/// Pipeline errors carry their own user-facing messages; the CLI only adds
/// the exit-code handling around them.
#[derive(Error, Debug)]
pub enum CliError {
    /// Pipeline error (manifest, master document, repository, ...)
    #[error(transparent)]
    Ingest(#[from] dri_ingest::IngestError),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
