//! Batch layout and ingest configuration
//!
//! The original conventions ("metadata sources live under
//! `<basepath>/<sourcename>/`", "the master document lives under
//! `<basepath>/master/master.xml`") are carried here as explicit
//! configuration rather than hard-coded paths, so a batch can relocate a
//! source directory without renaming its source keys.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory and naming conventions for one batch tree
#[derive(Debug, Clone)]
pub struct BatchLayout {
    /// Subdirectory under the basepath for generated QDC files
    pub qdc_subdir: String,

    /// Subdirectory under the basepath for the master document
    pub master_subdir: String,

    /// Master document file name
    pub master_filename: String,

    /// Source-key to subdirectory overrides; a key without an override uses
    /// the key itself as its subdirectory name
    pub source_dirs: BTreeMap<String, String>,

    /// Source-key to datastream-name overrides for auxiliary content files;
    /// a key without an override is attached under the key itself
    pub datastream_names: BTreeMap<String, String>,
}

impl Default for BatchLayout {
    fn default() -> Self {
        let mut datastream_names = BTreeMap::new();
        datastream_names.insert(
            "digitizationguide".to_string(),
            "digitizationGuide".to_string(),
        );

        Self {
            qdc_subdir: "qdc".to_string(),
            master_subdir: "master".to_string(),
            master_filename: "master.xml".to_string(),
            source_dirs: BTreeMap::new(),
            datastream_names,
        }
    }
}

impl BatchLayout {
    /// Subdirectory name for a metadata/content source key
    pub fn subdir_for<'a>(&'a self, source_key: &'a str) -> &'a str {
        self.source_dirs
            .get(source_key)
            .map(String::as_str)
            .unwrap_or(source_key)
    }

    /// Datastream name for an auxiliary source key
    pub fn datastream_for<'a>(&'a self, source_key: &'a str) -> &'a str {
        self.datastream_names
            .get(source_key)
            .map(String::as_str)
            .unwrap_or(source_key)
    }

    /// Path of the master document for a batch
    pub fn master_path(&self, basepath: &Path) -> PathBuf {
        basepath.join(&self.master_subdir).join(&self.master_filename)
    }

    /// Path of the generated QDC file for a key identifier
    pub fn qdc_path(&self, basepath: &Path, key_identifier: &str) -> PathBuf {
        basepath
            .join(&self.qdc_subdir)
            .join(format!("{}.xml", key_identifier))
    }
}

/// Configuration for a batch ingest run
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Batch directory layout conventions
    pub layout: BatchLayout,

    /// Timeout applied to each repository service call
    pub repository_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            layout: BatchLayout::default(),
            repository_timeout: Duration::from_secs(300),
        }
    }
}
