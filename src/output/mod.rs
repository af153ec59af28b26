//! Output side: partition routing and the single-owner output file set
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Decoder Workers (N)                    │
//! │  - Send objects via bounded channel                 │
//! └─────────────────────┬───────────────────────────────┘
//!                       │ Object
//!                       ▼
//! ┌─────────────────────────────────────────────────────┐
//! │              Output Writer Thread                   │
//! │  - Owns OutputFileSet exclusively                   │
//! │  - route(object) → 3 partition keys                 │
//! │  - Opens files lazily, keeps them open              │
//! └─────────────────────┬───────────────────────────────┘
//!                       │
//!                       ▼
//! ┌─────────────────────────────────────────────────────┐
//! │  D/__all__.json                                     │
//! │  D/<namespace>/__all__.json                         │
//! │  D/<namespace>/<kind>.json                          │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod file;
pub mod route;
pub mod writer;

pub use file::{OutputFile, DEFAULT_BUFFER_SIZE, OUTPUT_FOOTER, OUTPUT_HEADER};
pub use route::{escape_component, global_key, route, PartitionKey, ALL_FILE_NAME};
pub use writer::{OutputFileSet, OutputWriter, WriterStats};
