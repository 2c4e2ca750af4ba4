//! DRI Ingest Library
//!
//! Client-side orchestration core for batch ingest into a digital-object
//! repository. The pipeline runs in two independently invokable phases over
//! a batch directory described by a YAML manifest:
//!
//! - **Prep** (`prep_for_ingest`): builds per-object Qualified Dublin Core
//!   metadata files and writes a durable master tracking document recording
//!   every object to be created.
//! - **Ingest** (`ingest`): walks the master document, creates repository
//!   objects, resolves parent/child hierarchy, attaches datastreams, and
//!   writes each newly assigned persistent identifier back into the master
//!   document so the run is resumable and idempotent.
//!
//! # Example
//!
//! ```no_run
//! use dri_ingest::orchestrator::IngestOrchestrator;
//! use dri_ingest::repository::MemoryRepository;
//! use dri_ingest::config::IngestConfig;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let repo = Arc::new(MemoryRepository::new());
//!     let orchestrator = IngestOrchestrator::new(repo, IngestConfig::default());
//!     orchestrator.prep_for_ingest("batch/manifest.yaml").await?;
//!     let report = orchestrator.ingest("batch/manifest.yaml").await?;
//!     println!("{} ingested, {} failed", report.ingested(), report.failed());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod manifest;
pub mod master;
pub mod metadata;
pub mod orchestrator;
pub mod repository;

// Re-export commonly used types
pub use config::{BatchLayout, IngestConfig};
pub use error::{IngestError, Result};
pub use manifest::Manifest;
pub use master::MasterDocument;
pub use orchestrator::IngestOrchestrator;
