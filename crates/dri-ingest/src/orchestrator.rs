//! Batch ingest orchestration
//!
//! Drives the two pipeline phases over a batch directory. Prep builds the
//! master document and QDC files; ingest walks the master document, creates
//! repository objects, and writes each assigned PID back into the master
//! document immediately so a crashed or partially failed run can be resumed
//! by simply running ingest again.

use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::hierarchy::{self, Model, ParentLookup};
use crate::manifest::{Manifest, ObjectDescriptor};
use crate::master::{MasterDocument, ObjectNode};
use crate::metadata::{content_filepath, generate_qdc, key_identifier};
use crate::repository::{mime_type_for, ObjectAttributes, Repository};
use chrono::{DateTime, Utc};
use dri_common::checksum::compute_checksum;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Datastream name for the generated descriptive metadata
pub const DESC_METADATA: &str = "descMetadata";

/// Outcome of one object during an ingest run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectOutcome {
    /// Created and saved in this run
    Ingested { pid: String },
    /// Already had a PID from a prior run
    Skipped { pid: String },
    /// Failed in this run; the master node keeps no PID so a re-run retries it
    Failed { reason: String },
}

/// Per-object entry in the batch report
#[derive(Debug, Clone)]
pub struct ObjectReport {
    pub identifier: String,
    pub outcome: ObjectOutcome,
}

/// Report of a prep run
#[derive(Debug, Clone)]
pub struct PrepReport {
    pub objects: usize,
    pub master_path: PathBuf,
}

/// Report of an ingest run
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub objects: Vec<ObjectReport>,
}

impl IngestReport {
    pub fn ingested(&self) -> usize {
        self.count(|outcome| matches!(outcome, ObjectOutcome::Ingested { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, ObjectOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, ObjectOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&ObjectOutcome) -> bool) -> usize {
        self.objects
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }
}

/// Top-level driver for the two batch phases
pub struct IngestOrchestrator {
    repository: Arc<dyn Repository>,
    config: IngestConfig,
}

impl IngestOrchestrator {
    pub fn new(repository: Arc<dyn Repository>, config: IngestConfig) -> Self {
        Self { repository, config }
    }

    /// Phase 1: build the master document and per-object QDC files
    ///
    /// Fatal on manifest errors and missing metadata sources; phase 1 only
    /// produces inputs, so it is rerun from scratch rather than resumed.
    pub async fn prep_for_ingest(&self, manifest_path: impl AsRef<Path>) -> Result<PrepReport> {
        let manifest = Manifest::load(manifest_path)?;
        manifest.validate()?;

        let basepath = Path::new(&manifest.basepath);
        let layout = &self.config.layout;
        std::fs::create_dir_all(basepath.join(&layout.qdc_subdir))?;

        let mut master = MasterDocument::new();

        for descriptor in &manifest.objects {
            let key = key_identifier(descriptor)?;
            master.add_object(descriptor, manifest.model.as_deref())?;

            let qdc = generate_qdc(descriptor, manifest.metadata.as_deref(), layout, basepath)?;
            std::fs::write(layout.qdc_path(basepath, key), qdc)?;
            debug!(identifier = %key, "Prepared object");
        }

        let master_path = layout.master_path(basepath);
        master.persist(&master_path)?;

        info!(
            objects = manifest.objects.len(),
            master = %master_path.display(),
            "Prep complete"
        );

        Ok(PrepReport {
            objects: manifest.objects.len(),
            master_path,
        })
    }

    /// Phase 2: ingest every master node that does not carry a PID yet
    ///
    /// Nodes with a PID are skipped, which is what makes re-running safe.
    /// Per-object repository failures are recorded and the run continues;
    /// the master document is persisted after every successful object.
    pub async fn ingest(&self, manifest_path: impl AsRef<Path>) -> Result<IngestReport> {
        let manifest = Manifest::load(manifest_path)?;
        manifest.validate()?;

        let basepath = Path::new(&manifest.basepath);
        let master_path = self.config.layout.master_path(basepath);
        let mut master = MasterDocument::load(&master_path)?;

        let mut descriptors: HashMap<&str, &ObjectDescriptor> = HashMap::new();
        for descriptor in &manifest.objects {
            descriptors.insert(key_identifier(descriptor)?, descriptor);
        }

        let started_at = Utc::now();
        let mut reports = Vec::new();

        for position in 0..master.len() {
            let node = master.nodes()[position].clone();
            let key = node
                .key_identifier()
                .ok_or_else(|| {
                    IngestError::MissingIdentifier("master document node".to_string())
                })?
                .to_string();

            if let Some(pid) = &node.pid {
                info!(identifier = %key, pid = %pid, "Already ingested, skipping");
                reports.push(ObjectReport {
                    identifier: key,
                    outcome: ObjectOutcome::Skipped { pid: pid.clone() },
                });
                continue;
            }

            match self
                .ingest_object(&node, &key, &manifest, basepath, &descriptors)
                .await
            {
                Ok(pid) => {
                    master.add_pid(&key, &pid)?;
                    master.persist(&master_path)?;
                    info!(identifier = %key, pid = %pid, "Object ingested");
                    reports.push(ObjectReport {
                        identifier: key,
                        outcome: ObjectOutcome::Ingested { pid },
                    });
                },
                Err(e) => {
                    error!(identifier = %key, error = %e, "Object ingest failed");
                    reports.push(ObjectReport {
                        identifier: key,
                        outcome: ObjectOutcome::Failed {
                            reason: e.to_string(),
                        },
                    });
                },
            }
        }

        let report = IngestReport {
            started_at,
            finished_at: Utc::now(),
            objects: reports,
        };

        info!(
            ingested = report.ingested(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Ingest complete"
        );

        Ok(report)
    }

    /// Ingest one object: create, link parent, attach datastreams, save
    async fn ingest_object(
        &self,
        node: &ObjectNode,
        key: &str,
        manifest: &Manifest,
        basepath: &Path,
        descriptors: &HashMap<&str, &ObjectDescriptor>,
    ) -> Result<String> {
        let descriptor = descriptors
            .get(key)
            .copied()
            .ok_or_else(|| IngestError::ObjectNotFound(key.to_string()))?;
        let model = Model::parse(&node.model)?;

        let attributes = ObjectAttributes {
            label: manifest.label_for(descriptor).map(str::to_string),
            identifiers: node.identifiers.clone(),
        };
        let handle = self.call(self.repository.create(model, attributes)).await?;

        if let Some(value) = &descriptor.parentid {
            self.call(hierarchy::set_parent(
                self.repository.as_ref(),
                &handle,
                model,
                ParentLookup::Identifier,
                value,
            ))
            .await?;
        } else if let Some(value) = &descriptor.parentpid {
            self.call(hierarchy::set_parent(
                self.repository.as_ref(),
                &handle,
                model,
                ParentLookup::Pid,
                value,
            ))
            .await?;
        }

        let qdc_path = self.config.layout.qdc_path(basepath, key);
        let qdc = read_content(&qdc_path)?;
        self.call(self.repository.attach_datastream(
            &handle,
            DESC_METADATA,
            &qdc,
            "text/xml",
        ))
        .await?;

        if let Some(files) = &descriptor.files {
            for (source_key, file_ref) in files {
                let path = content_filepath(file_ref, source_key, &self.config.layout, basepath);
                let content = read_content(&path)?;
                let name = self.config.layout.datastream_for(source_key);
                debug!(
                    identifier = %key,
                    datastream = %name,
                    size = content.len(),
                    checksum = %compute_checksum(&content),
                    "Attaching content datastream"
                );
                self.call(self.repository.attach_datastream(
                    &handle,
                    name,
                    &content,
                    mime_type_for(&path),
                ))
                .await?;
            }
        }

        self.call(self.repository.save(&handle)).await
    }

    /// Wrap a repository call with the configured timeout
    async fn call<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        let timeout = self.config.repository_timeout;
        match tokio::time::timeout(timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(IngestError::RepositoryTimeout(timeout.as_secs())),
        }
    }
}

/// Read a batch content file, mapping a missing file to the source-file error
fn read_content(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::SourceFileNotFound(path.display().to_string())
        } else {
            IngestError::Io(e)
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;

    #[tokio::test]
    async fn test_prep_missing_manifest_is_fatal() {
        let orchestrator = IngestOrchestrator::new(
            Arc::new(MemoryRepository::new()),
            IngestConfig::default(),
        );
        let result = orchestrator.prep_for_ingest("/nonexistent/manifest.yaml").await;
        assert!(matches!(result, Err(IngestError::ManifestNotFound(_))));
    }

    #[test]
    fn test_report_counters() {
        let report = IngestReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            objects: vec![
                ObjectReport {
                    identifier: "a".to_string(),
                    outcome: ObjectOutcome::Ingested {
                        pid: "dri:1".to_string(),
                    },
                },
                ObjectReport {
                    identifier: "b".to_string(),
                    outcome: ObjectOutcome::Skipped {
                        pid: "dri:2".to_string(),
                    },
                },
                ObjectReport {
                    identifier: "c".to_string(),
                    outcome: ObjectOutcome::Failed {
                        reason: "boom".to_string(),
                    },
                },
            ],
        };

        assert_eq!(report.ingested(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
    }
}
