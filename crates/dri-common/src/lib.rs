//! DRI Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities for the DRI workspace.
//!
//! # Overview
//!
//! This crate provides common functionality used across all DRI workspace
//! members:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Checksums**: Content integrity fingerprinting
//! - **Logging**: Structured logging configuration and initialization
//!
//! # Example
//!
//! ```no_run
//! use dri_common::{Result, DriError};
//! use dri_common::checksum;
//!
//! fn fingerprint(path: &str) -> Result<()> {
//!     let digest = checksum::compute_file_checksum(path)?;
//!     println!("File checksum: {}", digest);
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{DriError, Result};
