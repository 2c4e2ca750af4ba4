//! Metadata resolution and Qualified Dublin Core generation
//!
//! Computes the effective metadata set for an object by merging manifest-level
//! and object-level metadata sources, resolves each source to a file path
//! honoring the canonical-location conventions of the batch layout, and
//! generates the per-object QDC document attached as `descMetadata` during
//! ingest. Generation is deterministic given identical inputs.

use crate::config::BatchLayout;
use crate::error::{IngestError, Result};
use crate::manifest::ObjectDescriptor;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::path::{Path, PathBuf};

const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const DCTERMS_NS: &str = "http://purl.org/dc/terms/";

/// One Dublin Core term extracted from a metadata source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DcTerm {
    /// Element name as it appears in the source (e.g. "dc:title" or "title")
    pub name: String,
    /// Text value
    pub value: String,
}

/// The key identifier of an object descriptor
///
/// The first identifier when the descriptor holds several, else the single
/// value.
pub fn key_identifier(object: &ObjectDescriptor) -> Result<&str> {
    object
        .identifier
        .first()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| IngestError::MissingIdentifier("object descriptor".to_string()))
}

/// Effective metadata source keys for an object
///
/// Manifest-level keys in document order, followed by object-level keys in
/// document order. Additive; never deduplicated or reordered.
pub fn effective_metadata(
    object: &ObjectDescriptor,
    manifest_metadata: Option<&[String]>,
) -> Vec<String> {
    let mut keys: Vec<String> = manifest_metadata.unwrap_or(&[]).to_vec();
    if let Some(object_metadata) = &object.metadata {
        keys.extend(object_metadata.iter().cloned());
    }
    keys
}

/// Resolve the file path of a metadata source for an object
///
/// A value named in the descriptor that contains a path separator is used as
/// given; a bare named value resolves under the canonical subdirectory for
/// its source key; an unnamed source defaults to an identifier-named file in
/// the canonical location.
pub fn metadata_filepath(
    object: &ObjectDescriptor,
    source_key: &str,
    layout: &BatchLayout,
    basepath: &Path,
) -> Result<PathBuf> {
    match object.sources.get(source_key) {
        Some(named) => Ok(content_filepath(named, source_key, layout, basepath)),
        None => {
            let key = key_identifier(object)?;
            Ok(basepath
                .join(layout.subdir_for(source_key))
                .join(format!("{}.xml", key)))
        },
    }
}

/// Resolve the file path of a named content reference
///
/// A value containing a path separator is used as given; a bare filename
/// resolves under the canonical subdirectory for its source key.
pub fn content_filepath(
    named: &str,
    source_key: &str,
    layout: &BatchLayout,
    basepath: &Path,
) -> PathBuf {
    if named.contains(std::path::MAIN_SEPARATOR) {
        PathBuf::from(named)
    } else {
        basepath.join(layout.subdir_for(source_key)).join(named)
    }
}

/// Parse a metadata source file into Dublin Core terms
///
/// The element children of the document root become term/value pairs, in
/// document order. Deeper structure is ignored.
pub fn read_source_terms(path: &Path) -> Result<Vec<DcTerm>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::SourceFileNotFound(path.display().to_string())
        } else {
            IngestError::Io(e)
        }
    })?;

    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut current: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                if depth == 2 {
                    current = Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                    text.clear();
                }
            },
            Ok(Event::Empty(e)) => {
                if depth == 1 {
                    terms.push(DcTerm {
                        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                        value: String::new(),
                    });
                }
            },
            Ok(Event::Text(e)) => {
                if depth == 2 {
                    let unescaped = e
                        .unescape()
                        .map_err(|err| IngestError::xml(err.to_string()))?;
                    text.push_str(&unescaped);
                }
            },
            Ok(Event::End(_)) => {
                if depth == 2 {
                    if let Some(name) = current.take() {
                        terms.push(DcTerm {
                            name,
                            value: text.trim().to_string(),
                        });
                    }
                }
                depth = depth.saturating_sub(1);
            },
            Ok(Event::Eof) => break,
            Ok(_) => {},
            Err(e) => return Err(IngestError::xml(e.to_string())),
        }
    }

    Ok(terms)
}

/// Generate the Qualified Dublin Core document for an object
///
/// Folds in the `qdcsource` file first when declared, then every effective
/// metadata source in order, and closes with one `dc:identifier` per
/// descriptor identifier.
pub fn generate_qdc(
    object: &ObjectDescriptor,
    manifest_metadata: Option<&[String]>,
    layout: &BatchLayout,
    basepath: &Path,
) -> Result<String> {
    let mut terms = Vec::new();

    let effective = effective_metadata(object, manifest_metadata);
    let source_keys = object
        .qdcsource
        .as_deref()
        .into_iter()
        .chain(effective.iter().map(String::as_str));

    for source_key in source_keys {
        let path = metadata_filepath(object, source_key, layout, basepath)?;
        terms.extend(read_source_terms(&path)?);
    }

    write_qdc(&terms, object)
}

/// Serialize terms and identifiers into a QDC document
fn write_qdc(terms: &[DcTerm], object: &ObjectDescriptor) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| IngestError::xml(e.to_string()))?;

    let mut root = BytesStart::new("dcterms:qdc");
    root.push_attribute(("xmlns:dc", DC_NS));
    root.push_attribute(("xmlns:dcterms", DCTERMS_NS));
    writer
        .write_event(Event::Start(root))
        .map_err(|e| IngestError::xml(e.to_string()))?;

    for term in terms {
        let name = qualified_name(&term.name);
        write_element(&mut writer, &name, &term.value)?;
    }

    for identifier in object.identifier.iter() {
        write_element(&mut writer, "dc:identifier", identifier)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("dcterms:qdc")))
        .map_err(|e| IngestError::xml(e.to_string()))?;

    String::from_utf8(writer.into_inner()).map_err(|e| IngestError::xml(e.to_string()))
}

/// Qualify a bare term name under the dc namespace
fn qualified_name(name: &str) -> String {
    if name.contains(':') {
        name.to_string()
    } else {
        format!("dc:{}", name)
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<()> {
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

    fn descriptor(identifier: Identifiers) -> ObjectDescriptor {
        ObjectDescriptor {
            identifier,
            model: None,
            label: None,
            qdcsource: None,
            metadata: None,
            parentid: None,
            parentpid: None,
            files: None,
            sources: BTreeMap::new(),
        }
    }

    #[test]
    fn test_key_identifier_single() {
        let object = descriptor(Identifiers::One("identifier".to_string()));
        assert_eq!(key_identifier(&object).unwrap(), "identifier");
    }

    #[test]
    fn test_key_identifier_multiple() {
        let object = descriptor(Identifiers::Many(vec![
            "identifier1".to_string(),
            "identifier2".to_string(),
        ]));
        assert_eq!(key_identifier(&object).unwrap(), "identifier1");
    }

    #[test]
    fn test_key_identifier_missing() {
        let object = descriptor(Identifiers::Many(vec![]));
        assert!(matches!(
            key_identifier(&object),
            Err(IngestError::MissingIdentifier(_))
        ));
    }

    #[test]
    fn test_effective_metadata_both_empty() {
        let object = descriptor(Identifiers::One("id".to_string()));
        let metadata = effective_metadata(&object, None);
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_effective_metadata_manifest_only() {
        let object = descriptor(Identifiers::One("id".to_string()));
        let manifest_metadata = vec!["m1".to_string(), "m2".to_string()];
        let metadata = effective_metadata(&object, Some(&manifest_metadata));
        assert_eq!(metadata, vec!["m1".to_string(), "m2".to_string()]);
    }

    #[test]
    fn test_effective_metadata_object_only() {
        let mut object = descriptor(Identifiers::One("id".to_string()));
        object.metadata = Some(vec!["m3".to_string(), "m4".to_string()]);
        let metadata = effective_metadata(&object, None);
        assert_eq!(metadata, vec!["m3".to_string(), "m4".to_string()]);
    }

    #[test]
    fn test_effective_metadata_concatenation() {
        let mut object = descriptor(Identifiers::One("id".to_string()));
        object.metadata = Some(vec!["m3".to_string(), "m4".to_string()]);
        let manifest_metadata = vec!["m1".to_string(), "m2".to_string()];
        let metadata = effective_metadata(&object, Some(&manifest_metadata));
        assert_eq!(
            metadata,
            vec![
                "m1".to_string(),
                "m2".to_string(),
                "m3".to_string(),
                "m4".to_string()
            ]
        );
    }

    #[test]
    fn test_metadata_filepath_unnamed() {
        let object = descriptor(Identifiers::One("item_1".to_string()));
        let layout = BatchLayout::default();
        let path = metadata_filepath(&object, "qdc", &layout, Path::new("/base/")).unwrap();
        assert_eq!(path, PathBuf::from("/base/qdc/item_1.xml"));
    }

    #[test]
    fn test_metadata_filepath_named_relative() {
        let mut object = descriptor(Identifiers::One("item_1".to_string()));
        object
            .sources
            .insert("qdc".to_string(), "x.xml".to_string());
        let layout = BatchLayout::default();
        let path = metadata_filepath(&object, "qdc", &layout, Path::new("/base/")).unwrap();
        assert_eq!(path, PathBuf::from("/base/qdc/x.xml"));
    }

    #[test]
    fn test_metadata_filepath_named_absolute() {
        let mut object = descriptor(Identifiers::One("item_1".to_string()));
        object
            .sources
            .insert("qdc".to_string(), "/other/y.xml".to_string());
        let layout = BatchLayout::default();
        let path = metadata_filepath(&object, "qdc", &layout, Path::new("/base/")).unwrap();
        assert_eq!(path, PathBuf::from("/other/y.xml"));
    }

    #[test]
    fn test_read_source_terms() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("source.xml");
        std::fs::write(
            &path,
            r#"<record>
  <dc:title>A Title</dc:title>
  <creator>Someone &amp; Co</creator>
</record>"#,
        )
        .unwrap();

        let terms = read_source_terms(&path).unwrap();
        assert_eq!(
            terms,
            vec![
                DcTerm {
                    name: "dc:title".to_string(),
                    value: "A Title".to_string()
                },
                DcTerm {
                    name: "creator".to_string(),
                    value: "Someone & Co".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_read_source_terms_missing_file() {
        let result = read_source_terms(Path::new("/nonexistent/source.xml"));
        assert!(matches!(
            result,
            Err(IngestError::SourceFileNotFound(_))
        ));
    }

    #[test]
    fn test_generate_qdc() {
        let dir = TempDir::new().unwrap();
        let marcxml_dir = dir.path().join("marcxml");
        std::fs::create_dir_all(&marcxml_dir).unwrap();
        std::fs::write(
            marcxml_dir.join("item_1.xml"),
            "<record><dc:title>First Item</dc:title></record>",
        )
        .unwrap();

        let mut object = descriptor(Identifiers::Many(vec![
            "item_1".to_string(),
            "item_1b".to_string(),
        ]));
        object.qdcsource = Some("marcxml".to_string());

        let layout = BatchLayout::default();
        let qdc = generate_qdc(&object, None, &layout, dir.path()).unwrap();

        assert!(qdc.contains("<dcterms:qdc"));
        assert!(qdc.contains("<dc:title>First Item</dc:title>"));
        assert!(qdc.contains("<dc:identifier>item_1</dc:identifier>"));
        assert!(qdc.contains("<dc:identifier>item_1b</dc:identifier>"));
        // identifiers follow source terms
        assert!(qdc.find("dc:title").unwrap() < qdc.find("dc:identifier").unwrap());
    }

    #[test]
    fn test_generate_qdc_deterministic() {
        let dir = TempDir::new().unwrap();
        let marcxml_dir = dir.path().join("marcxml");
        std::fs::create_dir_all(&marcxml_dir).unwrap();
        std::fs::write(
            marcxml_dir.join("item_1.xml"),
            "<record><dc:title>First Item</dc:title></record>",
        )
        .unwrap();

        let mut object = descriptor(Identifiers::One("item_1".to_string()));
        object.metadata = Some(vec!["marcxml".to_string()]);

        let layout = BatchLayout::default();
        let first = generate_qdc(&object, None, &layout, dir.path()).unwrap();
        let second = generate_qdc(&object, None, &layout, dir.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_generate_qdc_no_sources() {
        let object = descriptor(Identifiers::One("item_1".to_string()));
        let layout = BatchLayout::default();
        let qdc = generate_qdc(&object, None, &layout, Path::new("/base")).unwrap();
        assert!(qdc.contains("<dc:identifier>item_1</dc:identifier>"));
    }
}
