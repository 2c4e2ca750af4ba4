//! Repository service client interface
//!
//! The repository that stores ingested objects is an external collaborator;
//! the pipeline only drives it through this interface. [`HttpRepository`]
//! talks to a live repository server, [`MemoryRepository`] backs tests and
//! dry runs.

use crate::error::Result;
use crate::hierarchy::{Model, ParentLookup};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod http;
pub mod memory;

pub use http::HttpRepository;
pub use memory::MemoryRepository;

/// Attributes supplied when creating a repository object
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ObjectAttributes {
    /// Display label
    pub label: Option<String>,

    /// Identifier values carried by the object
    pub identifiers: Vec<String>,
}

/// Opaque handle to a repository object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoHandle {
    pub id: String,
}

/// Client interface to the repository service
///
/// All calls are long-latency I/O; failures surface as
/// [`IngestError::Repository`](crate::error::IngestError::Repository).
#[async_trait]
pub trait Repository: Send + Sync {
    /// Create a new object of the given model
    async fn create(&self, model: Model, attributes: ObjectAttributes) -> Result<RepoHandle>;

    /// Find an object by identifier or persistent identifier
    async fn find(
        &self,
        model: Model,
        lookup: ParentLookup,
        value: &str,
    ) -> Result<Option<RepoHandle>>;

    /// Assign the governing parent relationship of a child object
    async fn set_parent(&self, child: &RepoHandle, parent: &RepoHandle) -> Result<()>;

    /// Attach a named datastream with the given content
    async fn attach_datastream(
        &self,
        handle: &RepoHandle,
        name: &str,
        content: &[u8],
        mime_type: &str,
    ) -> Result<()>;

    /// Persist the object, returning its assigned persistent identifier
    async fn save(&self, handle: &RepoHandle) -> Result<String>;
}

/// Guess a MIME type from a file extension
///
/// Covers the content formats batches actually carry; everything else is
/// attached as an opaque byte stream.
pub fn mime_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("xml") => "text/xml",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for(Path::new("a/b/metadata.xml")), "text/xml");
        assert_eq!(
            mime_type_for(Path::new("DigitizationGuide.xls")),
            "application/vnd.ms-excel"
        );
        assert_eq!(
            mime_type_for(Path::new("unknown.bin")),
            "application/octet-stream"
        );
        assert_eq!(mime_type_for(Path::new("no_extension")), "application/octet-stream");
    }
}
