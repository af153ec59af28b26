//! Decoded list item

/// Namespace reported for objects without `metadata.namespace`
///
/// An empty namespace is equivalent to the "default" namespace in
/// Kubernetes, and "default" is its canonical representation.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Kind reported for objects without `kind`
pub const UNKNOWN_KIND: &str = "_unknown_";

/// One item of a List document
///
/// `raw` holds the item re-indented with two spaces and is written to the
/// output verbatim. The routing fields are stored exactly as decoded (empty
/// when absent); defaults are only substituted by the accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    raw: Vec<u8>,
    namespace: String,
    kind: String,
}

impl Object {
    /// Create an object from its re-indented bytes and decoded routing fields
    pub fn new(raw: Vec<u8>, namespace: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            raw,
            namespace: namespace.into(),
            kind: kind.into(),
        }
    }

    /// Re-indented JSON bytes of the item
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Namespace, `default` if none was decoded
    pub fn namespace(&self) -> &str {
        if self.namespace.is_empty() {
            DEFAULT_NAMESPACE
        } else {
            &self.namespace
        }
    }

    /// Kind, `_unknown_` if none was decoded
    pub fn kind(&self) -> &str {
        if self.kind.is_empty() {
            UNKNOWN_KIND
        } else {
            &self.kind
        }
    }

    /// Namespace exactly as decoded (possibly empty)
    pub fn decoded_namespace(&self) -> &str {
        &self.namespace
    }

    /// Kind exactly as decoded (possibly empty)
    pub fn decoded_kind(&self) -> &str {
        &self.kind
    }
}
