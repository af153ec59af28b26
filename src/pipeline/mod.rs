//! Concurrent decode → route → write pipeline
//!
//! ```text
//!   path feeder ──► path queue (bounded)
//!                        │
//!       ┌────────────────┼────────────────┐
//! ┌─────▼─────┐    ┌─────▼─────┐    ┌─────▼─────┐
//! │ Decoder 1 │    │ Decoder 2 │    │ Decoder N │
//! └─────┬─────┘    └─────┬─────┘    └─────┬─────┘
//!       └────────────────┼────────────────┘
//!                        ▼
//!              objects queue (bounded) ──► output writer ──► finalizer
//!
//!   every stage ──► error queue (bounded) ──► message collector
//! ```

pub mod coordinator;
pub mod queue;
pub mod worker;

pub use coordinator::{SplitCoordinator, SplitProgress, SplitResult};
pub use queue::{path_queue, PathQueueReceiver, PathQueueSender, QueueStats};
pub use worker::{DecoderPool, PoolStats, Worker};
