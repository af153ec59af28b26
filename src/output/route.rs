//! Partition routing
//!
//! Every object lands in exactly three output files:
//!
//! ```text
//! __all__.json
//! <namespace>/__all__.json
//! <namespace>/<kind>.json
//! ```
//!
//! Namespace and kind are escaped like URL path segments so that no value
//! can introduce a separator or leave the output directory.

use crate::list::Object;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::path::{Path, PathBuf};

/// File name of the aggregate partitions
pub const ALL_FILE_NAME: &str = "__all__.json";

const AGGREGATE_STEM: &str = "__all__";

/// Separator used to build map keys; never produced by escaping
const KEY_SEPARATOR: char = '\0';

/// Characters kept as-is in a path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

/// Path components identifying one output file, relative to the output root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    components: Vec<String>,
}

impl PartitionKey {
    fn new(components: Vec<String>) -> Self {
        Self { components }
    }

    /// All components; the last one is the file name
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Directory components (everything but the file name)
    pub fn dirs(&self) -> &[String] {
        &self.components[..self.components.len().saturating_sub(1)]
    }

    /// Unique string form used to index the output file set
    pub fn map_key(&self) -> String {
        self.components.join(&KEY_SEPARATOR.to_string())
    }

    /// Full path of the file below `base`
    pub fn path_in(&self, base: &Path) -> PathBuf {
        let mut path = base.to_path_buf();
        path.extend(&self.components);
        path
    }
}

/// Key of the partition receiving every object
pub fn global_key() -> PartitionKey {
    PartitionKey::new(vec![ALL_FILE_NAME.to_string()])
}

/// Compute the three partition keys of an object
pub fn route(obj: &Object) -> [PartitionKey; 3] {
    let ns = escape_component(obj.namespace());
    let mut kind = escape_component(obj.kind());

    if kind == AGGREGATE_STEM {
        kind = kind.replace('_', "%5F");
    }

    [
        global_key(),
        PartitionKey::new(vec![ns.clone(), ALL_FILE_NAME.to_string()]),
        PartitionKey::new(vec![ns, format!("{kind}.json")]),
    ]
}

/// Escape a namespace or kind for use as a single path component
pub fn escape_component(value: &str) -> String {
    if !value.is_empty() && value.bytes().all(|b| b == b'.') {
        return value.replace('.', "%2E");
    }

    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}
