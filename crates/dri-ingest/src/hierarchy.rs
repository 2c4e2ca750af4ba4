//! Parent/child hierarchy resolution
//!
//! The supported repository models form a closed set with a fixed parent
//! table: a Component belongs to an Item, an Item belongs to a Collection.
//! Model strings outside the set fail loudly instead of being matched
//! open-endedly.

use crate::error::{IngestError, Result};
use crate::repository::{RepoHandle, Repository};

/// Model URI namespace prefix used in master documents
const MODEL_NAMESPACE: &str = "info:fedora/";

/// Supported repository models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    Collection,
    Item,
    Component,
}

impl Model {
    /// The model string as declared in manifests (e.g. "afmodel:Item")
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Collection => "afmodel:Collection",
            Model::Item => "afmodel:Item",
            Model::Component => "afmodel:Component",
        }
    }

    /// The namespaced model URI as recorded in master documents
    pub fn namespaced(&self) -> String {
        format!("{}{}", MODEL_NAMESPACE, self.as_str())
    }

    /// Parse a model string, accepting the namespaced form
    pub fn parse(value: &str) -> Result<Self> {
        let bare = value.strip_prefix(MODEL_NAMESPACE).unwrap_or(value);
        match bare {
            "afmodel:Collection" => Ok(Model::Collection),
            "afmodel:Item" => Ok(Model::Item),
            "afmodel:Component" => Ok(Model::Component),
            _ => Err(IngestError::UnknownModel(value.to_string())),
        }
    }

    /// The parent model for a child of this model
    ///
    /// Collections are roots; asking for their parent model is an error.
    pub fn parent_model(&self) -> Result<Model> {
        match self {
            Model::Item => Ok(Model::Collection),
            Model::Component => Ok(Model::Item),
            Model::Collection => Err(IngestError::UnknownModel(self.as_str().to_string())),
        }
    }
}

impl std::str::FromStr for Model {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        Model::parse(s)
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Field used to look up a parent object in the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentLookup {
    /// Lookup by foreign identifier
    Identifier,
    /// Lookup by persistent identifier
    Pid,
}

impl ParentLookup {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParentLookup::Identifier => "identifier",
            ParentLookup::Pid => "pid",
        }
    }
}

/// Resolve and assign the governing parent of a child object
///
/// The parent type is derived from the child's model, the parent is looked
/// up in the repository by the given field, and the relationship is set on
/// the child. Returns the parent handle.
pub async fn set_parent(
    repository: &dyn Repository,
    child: &RepoHandle,
    child_model: Model,
    lookup: ParentLookup,
    value: &str,
) -> Result<RepoHandle> {
    let parent_model = child_model.parent_model()?;

    let parent = repository
        .find(parent_model, lookup, value)
        .await?
        .ok_or_else(|| IngestError::ParentNotFound {
            model: parent_model.as_str().to_string(),
            field: lookup.as_str().to_string(),
            value: value.to_string(),
        })?;

    repository.set_parent(child, &parent).await?;

    Ok(parent)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::repository::{MemoryRepository, ObjectAttributes};

    #[test]
    fn test_parent_model_table() {
        assert_eq!(
            Model::parse("afmodel:Item").unwrap().parent_model().unwrap(),
            Model::Collection
        );
        assert_eq!(
            Model::parse("afmodel:Component")
                .unwrap()
                .parent_model()
                .unwrap(),
            Model::Item
        );
    }

    #[test]
    fn test_collection_has_no_parent_model() {
        let result = Model::Collection.parent_model();
        assert!(matches!(result, Err(IngestError::UnknownModel(_))));
    }

    #[test]
    fn test_parse_unknown_model() {
        let result = Model::parse("afmodel:Widget");
        assert!(matches!(result, Err(IngestError::UnknownModel(_))));
    }

    #[test]
    fn test_parse_namespaced_model() {
        assert_eq!(
            Model::parse("info:fedora/afmodel:Item").unwrap(),
            Model::Item
        );
        assert_eq!(Model::Item.namespaced(), "info:fedora/afmodel:Item");
    }

    async fn seeded_repo() -> (MemoryRepository, RepoHandle) {
        let repo = MemoryRepository::new();
        let collection = repo
            .create(
                Model::Collection,
                ObjectAttributes {
                    label: None,
                    identifiers: vec!["collectionIdentifier".to_string()],
                },
            )
            .await
            .unwrap();
        repo.save(&collection).await.unwrap();
        (repo, collection)
    }

    #[tokio::test]
    async fn test_set_parent_by_identifier() {
        let (repo, collection) = seeded_repo().await;
        let item = repo
            .create(
                Model::Item,
                ObjectAttributes {
                    label: None,
                    identifiers: vec!["item_1".to_string()],
                },
            )
            .await
            .unwrap();

        let parent = set_parent(
            &repo,
            &item,
            Model::Item,
            ParentLookup::Identifier,
            "collectionIdentifier",
        )
        .await
        .unwrap();

        assert_eq!(parent, collection);
        let objects = repo.objects();
        let stored_item = objects.iter().find(|o| o.id == item.id).unwrap();
        assert_eq!(stored_item.parent.as_deref(), Some(collection.id.as_str()));
    }

    #[tokio::test]
    async fn test_set_parent_by_pid() {
        let (repo, collection) = seeded_repo().await;
        let item = repo
            .create(
                Model::Item,
                ObjectAttributes {
                    label: None,
                    identifiers: vec!["item_1".to_string()],
                },
            )
            .await
            .unwrap();

        let parent = set_parent(&repo, &item, Model::Item, ParentLookup::Pid, &collection.id)
            .await
            .unwrap();

        assert_eq!(parent, collection);
    }

    #[tokio::test]
    async fn test_set_parent_not_found() {
        let (repo, _collection) = seeded_repo().await;
        let item = repo
            .create(
                Model::Item,
                ObjectAttributes {
                    label: None,
                    identifiers: vec!["item_1".to_string()],
                },
            )
            .await
            .unwrap();

        let result = set_parent(
            &repo,
            &item,
            Model::Item,
            ParentLookup::Identifier,
            "noSuchCollection",
        )
        .await;

        assert!(matches!(result, Err(IngestError::ParentNotFound { .. })));
    }
}
