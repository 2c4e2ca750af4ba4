//! In-memory repository implementation
//!
//! Backs the test suite and dry runs. Assigns sequential `dri:N` persistent
//! identifiers and can be configured to fail object creation for specific
//! identifiers to exercise the per-object failure/continue policy.

use super::{ObjectAttributes, RepoHandle, Repository};
use crate::error::{IngestError, Result};
use crate::hierarchy::{Model, ParentLookup};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// A datastream held by a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datastream {
    pub content: Vec<u8>,
    pub mime_type: String,
}

/// One object held by the in-memory repository
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub id: String,
    pub model: Model,
    pub label: Option<String>,
    pub identifiers: Vec<String>,
    pub parent: Option<String>,
    pub datastreams: BTreeMap<String, Datastream>,
    pub saved: bool,
}

#[derive(Default)]
struct State {
    objects: Vec<StoredObject>,
    next_pid: u64,
    fail_identifiers: HashSet<String>,
}

/// In-memory repository
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository that fails `create` for objects carrying any of the
    /// given identifiers
    pub fn failing_for<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let repo = Self::new();
        repo.lock().fail_identifiers = identifiers.into_iter().map(Into::into).collect();
        repo
    }

    /// Stop injecting failures
    pub fn clear_failures(&self) {
        self.lock().fail_identifiers.clear();
    }

    /// Snapshot of all stored objects
    pub fn objects(&self) -> Vec<StoredObject> {
        self.lock().objects.clone()
    }

    /// Number of stored objects
    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create(&self, model: Model, attributes: ObjectAttributes) -> Result<RepoHandle> {
        let mut state = self.lock();

        if let Some(identifier) = attributes
            .identifiers
            .iter()
            .find(|id| state.fail_identifiers.contains(*id))
        {
            return Err(IngestError::repository(format!(
                "injected failure for identifier '{}'",
                identifier
            )));
        }

        state.next_pid += 1;
        let id = format!("dri:{}", state.next_pid);
        state.objects.push(StoredObject {
            id: id.clone(),
            model,
            label: attributes.label,
            identifiers: attributes.identifiers,
            parent: None,
            datastreams: BTreeMap::new(),
            saved: false,
        });

        Ok(RepoHandle { id })
    }

    async fn find(
        &self,
        model: Model,
        lookup: ParentLookup,
        value: &str,
    ) -> Result<Option<RepoHandle>> {
        let state = self.lock();
        let found = state.objects.iter().find(|object| {
            object.model == model
                && match lookup {
                    ParentLookup::Identifier => {
                        object.identifiers.iter().any(|id| id == value)
                    },
                    ParentLookup::Pid => object.id == value,
                }
        });
        Ok(found.map(|object| RepoHandle {
            id: object.id.clone(),
        }))
    }

    async fn set_parent(&self, child: &RepoHandle, parent: &RepoHandle) -> Result<()> {
        let mut state = self.lock();
        let object = state
            .objects
            .iter_mut()
            .find(|object| object.id == child.id)
            .ok_or_else(|| {
                IngestError::repository(format!("no such object: {}", child.id))
            })?;
        object.parent = Some(parent.id.clone());
        Ok(())
    }

    async fn attach_datastream(
        &self,
        handle: &RepoHandle,
        name: &str,
        content: &[u8],
        mime_type: &str,
    ) -> Result<()> {
        let mut state = self.lock();
        let object = state
            .objects
            .iter_mut()
            .find(|object| object.id == handle.id)
            .ok_or_else(|| {
                IngestError::repository(format!("no such object: {}", handle.id))
            })?;
        object.datastreams.insert(
            name.to_string(),
            Datastream {
                content: content.to_vec(),
                mime_type: mime_type.to_string(),
            },
        );
        Ok(())
    }

    async fn save(&self, handle: &RepoHandle) -> Result<String> {
        let mut state = self.lock();
        let object = state
            .objects
            .iter_mut()
            .find(|object| object.id == handle.id)
            .ok_or_else(|| {
                IngestError::repository(format!("no such object: {}", handle.id))
            })?;
        object.saved = true;
        Ok(object.id.clone())
    }
}
