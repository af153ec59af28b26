//! List document decoder
//!
//! Parses one input document into an [`InputList`]. The root must be an
//! object with `kind: "List"` (when present), may carry `apiVersion` and
//! `metadata` (ignored) and holds the elements in `items`. Each element is
//! captured as raw bytes, re-indented, and then scanned a second time for
//! the two routing fields only. Any failure rejects the whole document.

use crate::error::{DecodeError, DecodeResult};
use crate::list::object::Object;
use crate::list::reindent::reindent;
use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::value::RawValue;
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::trace;

/// Root `kind` accepted for input documents
pub const LIST_KIND: &str = "List";

/// Objects decoded from one input document, in array order
#[derive(Debug, Default)]
pub struct InputList {
    items: Vec<Object>,
}

impl InputList {
    /// Number of decoded objects
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the document had no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Borrow the decoded objects
    pub fn items(&self) -> &[Object] {
        &self.items
    }
}

impl IntoIterator for InputList {
    type Item = Object;
    type IntoIter = std::vec::IntoIter<Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ListDocument<'a> {
    /// Outer `None`: field absent. `Some(None)`: explicit `null`.
    #[serde(default, deserialize_with = "present")]
    kind: Option<Option<String>>,

    #[serde(default)]
    #[allow(dead_code)]
    api_version: Option<IgnoredAny>,

    #[serde(default)]
    #[allow(dead_code)]
    metadata: Option<IgnoredAny>,

    #[serde(default, borrow)]
    items: Option<Vec<&'a RawValue>>,
}

/// Keep a field that is present, even as `null`, apart from a missing one
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Decode an input file from disk
pub fn decode_file(path: &Path) -> DecodeResult<InputList> {
    let bytes = std::fs::read(path)?;
    decode_list(&bytes)
}

/// Decode a List document from a reader
pub fn decode_reader<R: Read>(mut reader: R) -> DecodeResult<InputList> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_list(&bytes)
}

/// Decode a List document held in memory
pub fn decode_list(bytes: &[u8]) -> DecodeResult<InputList> {
    if first_token(bytes) != Some(b'{') {
        // An empty or non-object document still reports the parser's message
        // when it is not even valid JSON.
        serde_json::from_slice::<IgnoredAny>(bytes)?;
        return Err(DecodeError::RootNotObject);
    }

    let doc: ListDocument<'_> = serde_json::from_slice(bytes)?;

    match doc.kind {
        None => {}
        Some(Some(kind)) if kind == LIST_KIND => {}
        Some(kind) => return Err(DecodeError::NotAList(kind.unwrap_or_default())),
    }

    let raw_items = doc.items.unwrap_or_default();
    let mut items = Vec::with_capacity(raw_items.len());

    for (index, raw) in raw_items.into_iter().enumerate() {
        items.push(decode_item(index, raw.get().as_bytes())?);
    }

    trace!(items = items.len(), "List decoded");

    Ok(InputList { items })
}

/// Decode one element of `items`
///
/// The element is re-indented first; the routing fields are then extracted
/// from the re-indented bytes, which are kept as the object's payload.
pub fn decode_item(index: usize, raw: &[u8]) -> DecodeResult<Object> {
    if first_token(raw) != Some(b'{') {
        return Err(DecodeError::ItemNotObject { index });
    }

    let indented = reindent(raw).map_err(|reason| DecodeError::Reindent { index, reason })?;

    let fields: RoutingFields = serde_json::from_slice(&indented)
        .map_err(|source| DecodeError::Field { index, source })?;

    Ok(Object::new(indented, fields.namespace, fields.kind))
}

fn first_token(bytes: &[u8]) -> Option<u8> {
    bytes
        .iter()
        .copied()
        .find(|c| !matches!(c, b' ' | b'\t' | b'\n' | b'\r'))
}

/// The two routing fields of an item; everything else is skipped unparsed
#[derive(Debug, Default)]
struct RoutingFields {
    kind: String,
    namespace: String,
}

#[derive(Deserialize)]
#[serde(field_identifier, rename_all = "lowercase")]
enum ItemField {
    Kind,
    Metadata,
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
#[serde(field_identifier, rename_all = "lowercase")]
enum MetadataField {
    Namespace,
    #[serde(other)]
    Other,
}

impl<'de> Deserialize<'de> for RoutingFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RoutingVisitor)
    }
}

struct RoutingVisitor;

impl<'de> Visitor<'de> for RoutingVisitor {
    type Value = RoutingFields;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut fields = RoutingFields::default();

        while let Some(key) = map.next_key::<ItemField>()? {
            match key {
                ItemField::Kind => {
                    fields.kind = map.next_value::<Option<String>>()?.unwrap_or_default();
                }
                ItemField::Metadata => {
                    fields.namespace = map
                        .next_value::<Option<Namespace>>()?
                        .map(|ns| ns.0)
                        .unwrap_or_default();
                }
                ItemField::Other => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        Ok(fields)
    }
}

/// `metadata.namespace`, empty when absent
struct Namespace(String);

impl<'de> Deserialize<'de> for Namespace {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(NamespaceVisitor)
    }
}

struct NamespaceVisitor;

impl<'de> Visitor<'de> for NamespaceVisitor {
    type Value = Namespace;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a metadata object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut namespace = String::new();

        while let Some(key) = map.next_key::<MetadataField>()? {
            match key {
                MetadataField::Namespace => {
                    namespace = map.next_value::<Option<String>>()?.unwrap_or_default();
                }
                MetadataField::Other => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        Ok(Namespace(namespace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_list_basic() {
        let doc = br#"{"kind":"List","apiVersion":"v1","metadata":{"resourceVersion":""},
            "items":[{"kind":"Pod","metadata":{"namespace":"ops","name":"a"}},{"kind":"ConfigMap"}]}"#;
        let list = decode_list(doc).unwrap();
        assert_eq!(list.len(), 2);

        let items = list.items();
        assert_eq!(items[0].namespace(), "ops");
        assert_eq!(items[0].kind(), "Pod");
        assert_eq!(items[1].namespace(), "default");
        assert_eq!(items[1].kind(), "ConfigMap");
        assert_eq!(
            std::str::from_utf8(items[1].raw()).unwrap(),
            "{\n  \"kind\": \"ConfigMap\"\n}"
        );
    }

    #[test]
    fn test_kind_is_optional() {
        let list = decode_list(br#"{"items":[{"metadata":{"namespace":"x"}}]}"#).unwrap();
        assert_eq!(list.items()[0].kind(), "_unknown_");
        assert_eq!(list.items()[0].decoded_kind(), "");
    }

    #[test]
    fn test_missing_items_is_empty_list() {
        assert!(decode_list(br#"{"kind":"List"}"#).unwrap().is_empty());
        assert!(decode_list(br#"{"kind":"List","items":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_wrong_root_kind_rejected() {
        let err = decode_list(br#"{"items":[{"kind":"Pod"}],"kind":"Pod"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::NotAList(ref k) if k == "Pod"));
    }

    #[test]
    fn test_null_root_kind_rejected() {
        let err = decode_list(br#"{"kind":null,"items":[{"kind":"Pod"}]}"#).unwrap_err();
        assert!(matches!(err, DecodeError::NotAList(ref k) if k.is_empty()));

        // Absent is still fine
        assert_eq!(decode_list(br#"{"items":[{"kind":"Pod"}]}"#).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_root_field_rejected() {
        let err = decode_list(br#"{"kind":"List","items":[],"extra":1}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
        assert!(err.to_string().contains("extra"));
    }

    #[test]
    fn test_root_must_be_object() {
        assert!(matches!(
            decode_list(br#"["List"]"#).unwrap_err(),
            DecodeError::RootNotObject
        ));
        assert!(matches!(decode_list(b"{").unwrap_err(), DecodeError::Json(_)));
        assert!(matches!(decode_list(b"").unwrap_err(), DecodeError::Json(_)));
    }

    #[test]
    fn test_items_must_be_array() {
        let err = decode_list(br#"{"kind":"List","items":{"kind":"Pod"}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn test_non_object_item_fails_whole_document() {
        let err = decode_list(br#"{"kind":"List","items":[{"kind":"Pod"},5]}"#).unwrap_err();
        assert!(matches!(err, DecodeError::ItemNotObject { index: 1 }));
    }

    #[test]
    fn test_malformed_routing_field() {
        let err = decode_list(br#"{"items":[{"kind":7}]}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Field { index: 0, .. }));

        let err = decode_list(br#"{"items":[{"metadata":["ns"]}]}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Field { index: 0, .. }));

        let err = decode_list(br#"{"items":[{"metadata":{"namespace":{}}}]}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Field { index: 0, .. }));
    }

    #[test]
    fn test_null_routing_fields_are_absent() {
        let list = decode_list(br#"{"items":[{"kind":null,"metadata":null}]}"#).unwrap();
        assert_eq!(list.items()[0].kind(), "_unknown_");
        assert_eq!(list.items()[0].namespace(), "default");
    }

    #[test]
    fn test_unrelated_fields_ignored() {
        let doc = br#"{"items":[{"spec":{"kind":"Nested","namespace":"no"},"kind":"Deployment",
            "metadata":{"labels":{"namespace":"no"},"namespace":"apps"}}]}"#;
        let list = decode_list(doc).unwrap();
        assert_eq!(list.items()[0].kind(), "Deployment");
        assert_eq!(list.items()[0].namespace(), "apps");
    }

    #[test]
    fn test_item_order_preserved() {
        let doc = br#"{"items":[{"kind":"A"},{"kind":"B"},{"kind":"C"}]}"#;
        let kinds: Vec<String> = decode_list(doc)
            .unwrap()
            .into_iter()
            .map(|o| o.kind().to_string())
            .collect();
        assert_eq!(kinds, ["A", "B", "C"]);
    }

    #[test]
    fn test_decode_reader() {
        let doc: &[u8] = br#"{"kind":"List","items":[{"kind":"Secret"}]}"#;
        assert_eq!(decode_reader(doc).unwrap().len(), 1);
    }

    #[test]
    fn test_decode_missing_file() {
        let err = decode_file(Path::new("/nonexistent/krossa/input.json")).unwrap_err();
        assert!(matches!(err, DecodeError::Read(_)));
    }
}
