//! Master tracking document
//!
//! The master document records every object a batch will create and, once an
//! object has been ingested, the persistent identifier the repository
//! assigned to it. It is the durable state that makes a batch run resumable:
//! a node without a PID has not been ingested yet, a node with a PID is
//! skipped on re-runs.
//!
//! The document is an explicit in-memory tree (an ordered list of object
//! nodes) serialized to XML at `<basepath>/master/master.xml`. Persistence
//! is atomic: the file is written to a temporary sibling and renamed, so a
//! reader never observes a half-written master.

use crate::error::{IngestError, Result};
use crate::manifest::ObjectDescriptor;
use crate::metadata::key_identifier;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::path::Path;

/// Model URI namespace prefix applied to every object node
const MODEL_NAMESPACE: &str = "info:fedora/";

/// One object node in the master document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectNode {
    /// Namespaced model URI (e.g. "info:fedora/afmodel:Item")
    pub model: String,
    /// Identifier values, in declaration order
    pub identifiers: Vec<String>,
    /// Persistent identifier, present once the object has been ingested
    pub pid: Option<String>,
}

impl ObjectNode {
    /// The key identifier used for lookups
    pub fn key_identifier(&self) -> Option<&str> {
        self.identifiers.first().map(String::as_str)
    }
}

/// The master tracking document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MasterDocument {
    objects: Vec<ObjectNode>,
}

/// Identifier-to-position index over a master document
///
/// Lookups enforce identifier uniqueness: zero matches and multiple matches
/// both fail loudly.
pub struct IdentifierIndex {
    map: HashMap<String, Vec<usize>>,
}

impl IdentifierIndex {
    /// Build the index from a document
    pub fn build(document: &MasterDocument) -> Self {
        let mut map: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, node) in document.objects.iter().enumerate() {
            for identifier in &node.identifiers {
                map.entry(identifier.clone()).or_default().push(position);
            }
        }
        Self { map }
    }

    /// Position of the unique node matching an identifier
    pub fn lookup(&self, identifier: &str) -> Result<usize> {
        match self.map.get(identifier).map(Vec::as_slice) {
            None | Some([]) => Err(IngestError::ObjectNotFound(identifier.to_string())),
            Some([position]) => Ok(*position),
            Some(_) => Err(IngestError::MultipleObjectsFound(identifier.to_string())),
        }
    }
}

impl MasterDocument {
    /// Create an empty master document
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of object nodes
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the document has no object nodes
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The object nodes, in document order
    pub fn nodes(&self) -> &[ObjectNode] {
        &self.objects
    }

    /// Append one object node built from a manifest descriptor
    ///
    /// The model attribute is the descriptor's own model when present, else
    /// the supplied default, always namespaced. Pure append; existing nodes
    /// are never reordered or deduplicated.
    pub fn add_object(
        &mut self,
        descriptor: &ObjectDescriptor,
        default_model: Option<&str>,
    ) -> Result<()> {
        let key = key_identifier(descriptor)?;
        let model = descriptor
            .model
            .as_deref()
            .or(default_model)
            .ok_or_else(|| IngestError::MissingModel(key.to_string()))?;

        self.objects.push(ObjectNode {
            model: format!("{}{}", MODEL_NAMESPACE, model),
            identifiers: descriptor.identifier.to_vec(),
            pid: None,
        });

        Ok(())
    }

    /// The unique node matching an identifier
    pub fn find_object(&self, identifier: &str) -> Result<&ObjectNode> {
        let position = IdentifierIndex::build(self).lookup(identifier)?;
        Ok(&self.objects[position])
    }

    /// Record the assigned PID on the unique node matching an identifier
    ///
    /// Assigning a PID to a node that already has one is a caller error.
    pub fn add_pid(&mut self, identifier: &str, pid: &str) -> Result<()> {
        let position = IdentifierIndex::build(self).lookup(identifier)?;
        let node = &mut self.objects[position];
        if let Some(existing) = &node.pid {
            return Err(IngestError::PidAlreadyAssigned {
                identifier: identifier.to_string(),
                pid: existing.clone(),
            });
        }
        node.pid = Some(pid.to_string());
        Ok(())
    }

    /// Serialize the document to XML
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| IngestError::xml(e.to_string()))?;
        writer
            .write_event(Event::Start(BytesStart::new("objects")))
            .map_err(|e| IngestError::xml(e.to_string()))?;

        for node in &self.objects {
            let mut object = BytesStart::new("object");
            object.push_attribute(("model", node.model.as_str()));
            writer
                .write_event(Event::Start(object))
                .map_err(|e| IngestError::xml(e.to_string()))?;

            for identifier in &node.identifiers {
                write_text_element(&mut writer, "identifier", identifier)?;
            }
            if let Some(pid) = &node.pid {
                write_text_element(&mut writer, "pid", pid)?;
            }

            writer
                .write_event(Event::End(BytesEnd::new("object")))
                .map_err(|e| IngestError::xml(e.to_string()))?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("objects")))
            .map_err(|e| IngestError::xml(e.to_string()))?;

        String::from_utf8(writer.into_inner()).map_err(|e| IngestError::xml(e.to_string()))
    }

    /// Parse a master document from XML
    pub fn from_xml(content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut objects = Vec::new();
        let mut current: Option<ObjectNode> = None;
        let mut field: Option<String> = None;
        let mut text = String::new();
        let mut saw_root = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"objects" => saw_root = true,
                    b"object" => {
                        let model = e
                            .try_get_attribute("model")
                            .map_err(|err| IngestError::master_parse(err.to_string()))?
                            .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
                            .ok_or_else(|| {
                                IngestError::master_parse("object node lacks model attribute")
                            })?;
                        current = Some(ObjectNode {
                            model,
                            identifiers: Vec::new(),
                            pid: None,
                        });
                    },
                    name => {
                        field = Some(String::from_utf8_lossy(name).into_owned());
                        text.clear();
                    },
                },
                // an empty batch serializes as a self-closing root
                Ok(Event::Empty(e)) if e.name().as_ref() == b"objects" => saw_root = true,
                Ok(Event::Text(e)) => {
                    if field.is_some() {
                        let unescaped = e
                            .unescape()
                            .map_err(|err| IngestError::master_parse(err.to_string()))?;
                        text.push_str(&unescaped);
                    }
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"object" => {
                        if let Some(node) = current.take() {
                            objects.push(node);
                        }
                    },
                    b"objects" => {},
                    _ => {
                        let value = text.trim().to_string();
                        match (field.take().as_deref(), current.as_mut()) {
                            (Some("identifier"), Some(node)) => node.identifiers.push(value),
                            (Some("pid"), Some(node)) => node.pid = Some(value),
                            _ => {},
                        }
                    },
                },
                Ok(Event::Eof) => break,
                Ok(_) => {},
                Err(e) => return Err(IngestError::master_parse(e.to_string())),
            }
        }

        if !saw_root {
            return Err(IngestError::master_parse("missing objects root element"));
        }

        Ok(Self { objects })
    }

    /// Load a master document from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IngestError::MasterDocumentMissing(
                path.display().to_string(),
            ));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_xml(&content)
    }

    /// Write the document durably
    ///
    /// Writes to a temporary file in the destination directory, then renames
    /// it over the target path.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = path.parent().ok_or_else(|| {
            IngestError::master_parse(format!("master path has no parent: {}", path.display()))
        })?;
        std::fs::create_dir_all(dir)?;

        let xml = self.to_xml()?;
        let temp = tempfile::NamedTempFile::new_in(dir)?;
        std::fs::write(temp.path(), xml)?;
        temp.persist(path).map_err(|e| IngestError::Io(e.error))?;

        Ok(())
    }
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(|e| IngestError::xml(e.to_string()))?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(|e| IngestError::xml(e.to_string()))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| IngestError::xml(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::manifest::Identifiers;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn descriptor(identifier: Identifiers, model: Option<&str>) -> ObjectDescriptor {
        ObjectDescriptor {
            identifier,
            model: model.map(str::to_string),
            label: None,
            qdcsource: None,
            metadata: None,
            parentid: None,
            parentpid: None,
            files: None,
            sources: BTreeMap::new(),
        }
    }

    fn master_with_duplicates() -> MasterDocument {
        let mut master = MasterDocument::new();
        for identifier in [
            "object1Identifier",
            "duplicatedObjectIdentifier",
            "object2Identifier",
            "duplicatedObjectIdentifier",
        ] {
            master
                .add_object(
                    &descriptor(Identifiers::One(identifier.to_string()), None),
                    Some("objectModel"),
                )
                .unwrap();
        }
        master
    }

    #[test]
    fn test_new_master_is_empty() {
        let master = MasterDocument::new();
        assert!(master.is_empty());
        assert!(master.to_xml().unwrap().contains("<objects>"));
    }

    #[test]
    fn test_add_object_uses_model_override() {
        let mut master = MasterDocument::new();
        master
            .add_object(
                &descriptor(
                    Identifiers::One("addedObjectIdentifier".to_string()),
                    Some("addedObjectModel"),
                ),
                Some("manifestModel"),
            )
            .unwrap();

        let node = &master.nodes()[0];
        assert_eq!(node.model, "info:fedora/addedObjectModel");
        assert_eq!(node.identifiers, vec!["addedObjectIdentifier".to_string()]);
        assert_eq!(node.pid, None);
    }

    #[test]
    fn test_add_object_uses_default_model() {
        let mut master = MasterDocument::new();
        master
            .add_object(
                &descriptor(Identifiers::One("id".to_string()), None),
                Some("manifestModel"),
            )
            .unwrap();

        assert_eq!(master.nodes()[0].model, "info:fedora/manifestModel");
    }

    #[test]
    fn test_add_object_without_any_model() {
        let mut master = MasterDocument::new();
        let result = master.add_object(&descriptor(Identifiers::One("id".to_string()), None), None);
        assert!(matches!(result, Err(IngestError::MissingModel(_))));
    }

    #[test]
    fn test_add_object_appends_in_order() {
        let mut master = MasterDocument::new();
        master
            .add_object(
                &descriptor(Identifiers::One("existingObjectIdentifier".to_string()), None),
                Some("existingObjectModel"),
            )
            .unwrap();
        master
            .add_object(
                &descriptor(
                    Identifiers::One("addedObjectIdentifier".to_string()),
                    Some("addedObjectModel"),
                ),
                Some("manifestModel"),
            )
            .unwrap();

        assert_eq!(master.len(), 2);
        assert_eq!(
            master.nodes()[0].key_identifier(),
            Some("existingObjectIdentifier")
        );
        assert_eq!(
            master.nodes()[1].key_identifier(),
            Some("addedObjectIdentifier")
        );
    }

    #[test]
    fn test_find_object() {
        let master = master_with_duplicates();
        let node = master.find_object("object2Identifier").unwrap();
        assert_eq!(node.key_identifier(), Some("object2Identifier"));
    }

    #[test]
    fn test_find_object_not_found() {
        let master = master_with_duplicates();
        let result = master.find_object("nonExistentObjectIdentifier");
        assert!(matches!(result, Err(IngestError::ObjectNotFound(_))));
    }

    #[test]
    fn test_find_object_multiple_matches() {
        let master = master_with_duplicates();
        let result = master.find_object("duplicatedObjectIdentifier");
        assert!(matches!(result, Err(IngestError::MultipleObjectsFound(_))));
    }

    #[test]
    fn test_add_pid_updates_only_matching_node() {
        let mut master = master_with_duplicates();
        let before: Vec<ObjectNode> = master.nodes().to_vec();

        master.add_pid("object2Identifier", "object2Pid").unwrap();

        for (position, node) in master.nodes().iter().enumerate() {
            if node.key_identifier() == Some("object2Identifier") {
                assert_eq!(node.pid.as_deref(), Some("object2Pid"));
            } else {
                assert_eq!(node, &before[position]);
            }
        }
    }

    #[test]
    fn test_add_pid_not_found() {
        let mut master = master_with_duplicates();
        let result = master.add_pid("nonExistentObjectIdentifier", "objectPid");
        assert!(matches!(result, Err(IngestError::ObjectNotFound(_))));
    }

    #[test]
    fn test_add_pid_multiple_matches() {
        let mut master = master_with_duplicates();
        let result = master.add_pid("duplicatedObjectIdentifier", "objectPid");
        assert!(matches!(result, Err(IngestError::MultipleObjectsFound(_))));
    }

    #[test]
    fn test_add_pid_twice_is_a_caller_error() {
        let mut master = master_with_duplicates();
        master.add_pid("object2Identifier", "object2Pid").unwrap();
        let result = master.add_pid("object2Identifier", "anotherPid");
        assert!(matches!(
            result,
            Err(IngestError::PidAlreadyAssigned { .. })
        ));
    }

    #[test]
    fn test_xml_roundtrip() {
        let mut master = master_with_duplicates();
        master.add_pid("object2Identifier", "object2Pid").unwrap();

        let xml = master.to_xml().unwrap();
        let reparsed = MasterDocument::from_xml(&xml).unwrap();
        assert_eq!(reparsed, master);
    }

    #[test]
    fn test_from_xml_fixture_shape() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<objects>
  <object model="info:fedora/afmodel:Item">
    <identifier>item_2</identifier>
    <identifier>item_3</identifier>
    <pid>dri:42</pid>
  </object>
</objects>"#;

        let master = MasterDocument::from_xml(xml).unwrap();
        assert_eq!(master.len(), 1);
        let node = &master.nodes()[0];
        assert_eq!(node.model, "info:fedora/afmodel:Item");
        assert_eq!(
            node.identifiers,
            vec!["item_2".to_string(), "item_3".to_string()]
        );
        assert_eq!(node.pid.as_deref(), Some("dri:42"));
    }

    #[test]
    fn test_from_xml_empty_root() {
        let master = MasterDocument::from_xml("<objects/>").unwrap();
        assert!(master.is_empty());
    }

    #[test]
    fn test_from_xml_rejects_missing_root() {
        let result = MasterDocument::from_xml("<!-- nothing here -->");
        assert!(matches!(result, Err(IngestError::MasterParse(_))));
    }

    #[test]
    fn test_persist_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("master").join("master.xml");

        let master = master_with_duplicates();
        master.persist(&path).unwrap();

        let loaded = MasterDocument::load(&path).unwrap();
        assert_eq!(loaded, master);
    }

    #[test]
    fn test_load_missing_master() {
        let result = MasterDocument::load("/nonexistent/master.xml");
        assert!(matches!(
            result,
            Err(IngestError::MasterDocumentMissing(_))
        ));
    }

    #[test]
    fn test_persist_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("master.xml");

        let master = master_with_duplicates();
        master.persist(&path).unwrap();
        master.persist(&path).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("master.xml")]);
    }
}
