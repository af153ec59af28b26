//! krossa - Split Kubernetes List documents by namespace and kind
//!
//! Reads any number of JSON documents of kind `List` (as produced by
//! `kubectl get ... -o json`) and repartitions their items into:
//!
//! - `D/__all__.json`: every item
//! - `D/<namespace>/__all__.json`: every item of one namespace
//! - `D/<namespace>/<kind>.json`: every item of one kind in one namespace
//!
//! Items are copied verbatim apart from whitespace, which is normalized to a
//! two-space indentation.
//!
//! # Features
//!
//! - **Parallel Decoding**: Multiple reader threads decode input files
//!   concurrently.
//!
//! - **Single Writer**: One thread owns every output file; no locks are
//!   involved in writing.
//!
//! - **Bounded Memory**: All queues are bounded, so fast readers are throttled
//!   by the writer.
//!
//! - **Partial Failure**: A broken input file is reported and skipped; the
//!   other inputs are unaffected.
//!
//! # Example
//!
//! ```bash
//! kubectl get all --all-namespaces -o json > all.json
//! krossa out/ all.json
//! ls out/kube-system/
//! ```

pub mod config;
pub mod error;
pub mod list;
pub mod messages;
pub mod output;
pub mod pipeline;
pub mod progress;

pub use config::{CliArgs, KrossaConfig};
pub use error::{KrossaError, Result};
pub use list::{InputList, Object};
pub use messages::MessageCollector;
pub use pipeline::{SplitCoordinator, SplitResult};
