//! Input side: the object model and the List document decoder
//!
//! ```text
//! input file ──► decode_list ──► items[i] (raw bytes)
//!                                   │
//!                                   ├── reindent (2 spaces)
//!                                   └── routing scan: kind, metadata.namespace
//!                                   ▼
//!                                 Object
//! ```

pub mod decode;
pub mod object;
pub mod reindent;

pub use decode::{decode_file, decode_list, decode_reader, InputList};
pub use object::{Object, DEFAULT_NAMESPACE, UNKNOWN_KIND};
