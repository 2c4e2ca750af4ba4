//! Error types for the ingest pipeline
//!
//! Manifest and master-document structural errors are fatal to a batch run.
//! Repository errors during ingest are caught per object by the orchestrator
//! and recorded in the batch report instead of aborting the run.

use thiserror::Error;

/// Result type alias for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Comprehensive error type for the batch ingest pipeline
#[derive(Error, Debug)]
pub enum IngestError {
    /// Manifest file does not exist
    #[error("Manifest not found: '{0}'. Verify the file path exists and you have read permissions.")]
    ManifestNotFound(String),

    /// Manifest has invalid YAML syntax or structure
    #[error("Failed to parse manifest: {0}. Check the file syntax at the indicated line/column.")]
    ManifestParse(#[from] serde_yaml::Error),

    /// Manifest parsed but violates a structural constraint
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// Object descriptor has no identifier
    #[error("Object has no identifier: {0}")]
    MissingIdentifier(String),

    /// Object descriptor has no model and the manifest declares no default
    #[error("Object '{0}' has no model and the manifest declares no default model")]
    MissingModel(String),

    /// No master document node matches the identifier
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// More than one master document node matches the identifier
    #[error("Multiple objects found: {0}")]
    MultipleObjectsFound(String),

    /// A PID was already assigned to this node in a prior call
    #[error("PID already assigned to '{identifier}': {pid}")]
    PidAlreadyAssigned { identifier: String, pid: String },

    /// Model string is not in the supported model set
    #[error("Unknown model: '{0}'")]
    UnknownModel(String),

    /// Declared parent reference matched no repository object
    #[error("Parent not found: no {model} matches {field} '{value}'")]
    ParentNotFound {
        model: String,
        field: String,
        value: String,
    },

    /// Master document file does not exist; run prep first
    #[error("Master document missing: '{0}'. Run 'dri prep' to generate it.")]
    MasterDocumentMissing(String),

    /// Master document file is malformed
    #[error("Failed to parse master document: {0}")]
    MasterParse(String),

    /// A metadata or content source file referenced by the batch is missing
    #[error("Source file not found: '{0}'")]
    SourceFileNotFound(String),

    /// XML read or write failed
    #[error("XML error: {0}")]
    Xml(String),

    /// Repository service call failed
    #[error("Repository error: {0}")]
    Repository(String),

    /// Repository service call exceeded the configured timeout
    #[error("Repository call timed out after {0}s")]
    RepositoryTimeout(u64),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Create a repository error
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Create an invalid manifest error
    pub fn invalid_manifest(msg: impl Into<String>) -> Self {
        Self::InvalidManifest(msg.into())
    }

    /// Create an XML error
    pub fn xml(msg: impl Into<String>) -> Self {
        Self::Xml(msg.into())
    }

    /// Create a master-document parse error
    pub fn master_parse(msg: impl Into<String>) -> Self {
        Self::MasterParse(msg.into())
    }
}
