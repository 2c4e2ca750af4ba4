//! Batch manifest handling
//!
//! The manifest is a YAML document describing one batch of objects to be
//! ingested: the batch directory, the default model and label, the ordered
//! metadata sources applied to every object, and one descriptor per object.
//! It is read-only for the duration of a run.

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One or more identifier values
///
/// The first value is the *key identifier* used for lookups and uniqueness
/// checks. An object listing several identifiers collapses several source
/// rows into a single repository object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Identifiers {
    One(String),
    Many(Vec<String>),
}

impl Identifiers {
    /// The key identifier, if any
    pub fn first(&self) -> Option<&str> {
        match self {
            Identifiers::One(id) => Some(id.as_str()),
            Identifiers::Many(ids) => ids.first().map(String::as_str),
        }
    }

    /// Iterate over all identifier values in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Identifiers::One(id) => std::slice::from_ref(id),
            Identifiers::Many(ids) => ids.as_slice(),
        };
        slice.iter().map(String::as_str)
    }

    /// All identifier values as owned strings
    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_string).collect()
    }
}

/// Per-object descriptor from the manifest `objects` sequence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectDescriptor {
    /// Identifier value(s); the first is the key identifier
    pub identifier: Identifiers,

    /// Model override for this object (falls back to the manifest default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Label override for this object (falls back to the manifest default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Primary metadata source key for QDC generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qdcsource: Option<String>,

    /// Per-object metadata source keys, appended after the manifest-level keys
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Vec<String>>,

    /// Parent reference by foreign identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parentid: Option<String>,

    /// Parent reference by persistent identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parentpid: Option<String>,

    /// Auxiliary content files to attach as raw-byte datastreams,
    /// keyed by source key (e.g. "digitizationguide")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<BTreeMap<String, String>>,

    /// Named metadata source files, keyed by source key. A bare filename
    /// resolves under the canonical subdirectory for its key; a value
    /// containing a path separator is used as given.
    #[serde(flatten)]
    pub sources: BTreeMap<String, String>,
}

/// Batch manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Root directory for this batch
    pub basepath: String,

    /// Default repository model for all objects (e.g. "afmodel:Item")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Default display label for all objects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Metadata source keys applied to every object, in order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Vec<String>>,

    /// Per-object descriptors, in ingest order
    #[serde(default)]
    pub objects: Vec<ObjectDescriptor>,
}

impl Manifest {
    /// Load a manifest from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IngestError::ManifestNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let manifest: Manifest = serde_yaml::from_str(&content)?;

        Ok(manifest)
    }

    /// Validate the manifest structure
    ///
    /// Checks the constraints a run depends on: a non-empty basepath, an
    /// identifier for every object, and a model for every object (its own
    /// or the manifest default).
    pub fn validate(&self) -> Result<()> {
        if self.basepath.is_empty() {
            return Err(IngestError::InvalidManifest(
                "basepath cannot be empty".to_string(),
            ));
        }

        for (position, object) in self.objects.iter().enumerate() {
            let key = match object.identifier.first() {
                Some(key) if !key.is_empty() => key,
                _ => {
                    return Err(IngestError::MissingIdentifier(format!(
                        "object at position {}",
                        position
                    )))
                },
            };

            if object.model.is_none() && self.model.is_none() {
                return Err(IngestError::MissingModel(key.to_string()));
            }
        }

        Ok(())
    }

    /// The effective model for an object descriptor
    pub fn model_for<'a>(&'a self, object: &'a ObjectDescriptor) -> Option<&'a str> {
        object.model.as_deref().or(self.model.as_deref())
    }

    /// The effective label for an object descriptor
    pub fn label_for<'a>(&'a self, object: &'a ObjectDescriptor) -> Option<&'a str> {
        object.label.as_deref().or(self.label.as_deref())
    }
}
