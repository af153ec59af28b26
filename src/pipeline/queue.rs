//! Bounded input path queue
//!
//! The feeder pushes every input path, then drops its sender, which closes
//! the queue. Workers receive until the queue is closed and empty. A full
//! queue blocks the feeder, so at most `capacity` paths wait at any time.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for the path queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total paths enqueued
    pub enqueued: AtomicU64,

    /// Total paths dequeued
    pub dequeued: AtomicU64,
}

impl QueueStats {
    /// Paths handed to workers so far
    pub fn throughput(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    /// Paths accepted by the queue so far
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }
}

/// Create a path queue with the specified capacity
pub fn path_queue(capacity: usize) -> (PathQueueSender, PathQueueReceiver) {
    let (sender, receiver) = bounded(capacity);
    let stats = Arc::new(QueueStats::default());

    (
        PathQueueSender {
            sender,
            stats: Arc::clone(&stats),
        },
        PathQueueReceiver { receiver, stats },
    )
}

/// Sending half; dropping it closes the queue
pub struct PathQueueSender {
    sender: Sender<PathBuf>,
    stats: Arc<QueueStats>,
}

impl PathQueueSender {
    /// Send a path, blocking while the queue is full
    ///
    /// Fails only when every receiver is gone; the path is handed back.
    pub fn send(&self, path: PathBuf) -> Result<(), PathBuf> {
        self.sender.send(path).map_err(|e| e.into_inner())?;
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Get queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

/// Receiving half (clone for each worker)
#[derive(Clone)]
pub struct PathQueueReceiver {
    receiver: Receiver<PathBuf>,
    stats: Arc<QueueStats>,
}

impl PathQueueReceiver {
    /// Receive a path from the queue
    ///
    /// Blocks until a path is available; `None` once the queue is closed and
    /// drained.
    pub fn recv(&self) -> Option<PathBuf> {
        match self.receiver.recv() {
            Ok(path) => {
                self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                Some(path)
            }
            Err(_) => None,
        }
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Get queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}
