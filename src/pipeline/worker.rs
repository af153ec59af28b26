//! Decoder workers
//!
//! Each worker:
//! - Pulls input paths from the shared path queue
//! - Decodes the List document
//! - Forwards its objects, in array order, to the writer (blocking when the
//!   objects queue is full)
//! - Sends one error per failed file to the error queue
//!
//! Workers stop forwarding once the abort flag is raised but keep taking
//! paths until the queue is closed, so the feeder never blocks forever.

use crate::error::{InputOutcome, KrossaError, WorkerError};
use crate::list::{decode_file, Object};
use crate::pipeline::queue::PathQueueReceiver;
use crossbeam_channel::Sender;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

/// Statistics shared by all workers of a pool
#[derive(Debug, Default)]
pub struct PoolStats {
    /// Input files whose objects were all forwarded
    pub inputs_decoded: AtomicU64,

    /// Input files that failed to decode
    pub inputs_failed: AtomicU64,

    /// Input files not processed because of an abort
    pub inputs_skipped: AtomicU64,

    /// Objects handed to the writer
    pub objects_forwarded: AtomicU64,

    /// Workers currently decoding or forwarding
    pub active_workers: AtomicUsize,
}

impl PoolStats {
    fn record(&self, outcome: &InputOutcome) {
        match outcome {
            InputOutcome::Forwarded { .. } => {
                self.inputs_decoded.fetch_add(1, Ordering::Relaxed);
            }
            InputOutcome::Skipped { .. } => {
                self.inputs_skipped.fetch_add(1, Ordering::Relaxed);
            }
            InputOutcome::Failed { .. } => {
                self.inputs_failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Input files decoded successfully
    pub fn inputs_decoded(&self) -> u64 {
        self.inputs_decoded.load(Ordering::Relaxed)
    }

    /// Input files that failed
    pub fn inputs_failed(&self) -> u64 {
        self.inputs_failed.load(Ordering::Relaxed)
    }

    /// Input files skipped after an abort
    pub fn inputs_skipped(&self) -> u64 {
        self.inputs_skipped.load(Ordering::Relaxed)
    }

    /// Objects forwarded to the writer
    pub fn objects_forwarded(&self) -> u64 {
        self.objects_forwarded.load(Ordering::Relaxed)
    }

    /// Workers currently busy
    pub fn active_workers(&self) -> usize {
        self.active_workers.load(Ordering::Relaxed)
    }
}

/// RAII guard marking a worker as busy
struct ActiveGuard<'a> {
    stats: &'a PoolStats,
}

impl<'a> ActiveGuard<'a> {
    fn new(stats: &'a PoolStats) -> Self {
        stats.active_workers.fetch_add(1, Ordering::SeqCst);
        Self { stats }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.stats.active_workers.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A worker thread that decodes input files
pub struct Worker {
    id: usize,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn(
        id: usize,
        paths: PathQueueReceiver,
        objects: Sender<Object>,
        errors: Sender<KrossaError>,
        abort: Arc<AtomicBool>,
        stats: Arc<PoolStats>,
    ) -> Result<Self, WorkerError> {
        let name = format!("decoder-{}", id);

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker_loop(id, paths, objects, errors, abort, stats))
            .map_err(|e| WorkerError::SpawnFailed {
                name,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
        })
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::Panicked {
                name: format!("decoder-{}", self.id),
                message: "Worker thread panicked".into(),
            }),
            None => Ok(()),
        }
    }
}

/// Main worker loop
fn worker_loop(
    id: usize,
    paths: PathQueueReceiver,
    objects: Sender<Object>,
    errors: Sender<KrossaError>,
    abort: Arc<AtomicBool>,
    stats: Arc<PoolStats>,
) {
    debug!(worker = id, "Worker starting");

    while let Some(path) = paths.recv() {
        let outcome = {
            let _guard = ActiveGuard::new(&stats);
            process_path(id, path, &objects, &errors, &abort, &stats)
        };

        stats.record(&outcome);

        match &outcome {
            InputOutcome::Forwarded { path, objects } => {
                trace!(worker = id, path = %path.display(), objects = objects, "Input forwarded");
            }
            InputOutcome::Skipped { path } => {
                debug!(worker = id, path = %path.display(), "Input skipped after abort");
            }
            InputOutcome::Failed { path } => {
                debug!(worker = id, path = %path.display(), "Input failed");
            }
        }
    }

    debug!(worker = id, "Worker finished");
}

/// Decode one input file and forward its objects
fn process_path(
    id: usize,
    path: PathBuf,
    objects: &Sender<Object>,
    errors: &Sender<KrossaError>,
    abort: &AtomicBool,
    stats: &PoolStats,
) -> InputOutcome {
    if abort.load(Ordering::Relaxed) {
        return InputOutcome::Skipped { path };
    }

    let list = match decode_file(&path) {
        Ok(list) => list,
        Err(e) => {
            let err = KrossaError::input(&path, e);
            if errors.send(err).is_err() {
                warn!(worker = id, path = %path.display(), "Error queue closed");
            }
            return InputOutcome::Failed { path };
        }
    };

    let total = list.len();
    let mut forwarded = 0;

    for obj in list {
        if abort.load(Ordering::Relaxed) {
            debug!(
                worker = id,
                path = %path.display(),
                dropped = total - forwarded,
                "Abort raised while forwarding"
            );
            return InputOutcome::Skipped { path };
        }

        if objects.send(obj).is_err() {
            warn!(worker = id, path = %path.display(), "Objects queue closed");
            return InputOutcome::Skipped { path };
        }

        forwarded += 1;
        stats.objects_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    InputOutcome::Forwarded {
        path,
        objects: forwarded,
    }
}

/// A fixed set of decoder workers sharing one path queue
pub struct DecoderPool {
    workers: Vec<Worker>,
    stats: Arc<PoolStats>,
}

impl DecoderPool {
    /// Spawn `count` workers (at least one)
    ///
    /// `objects` is consumed: once every worker has exited, the last sender
    /// is gone and the writer sees the objects queue closed.
    pub fn spawn(
        count: usize,
        paths: PathQueueReceiver,
        objects: Sender<Object>,
        errors: Sender<KrossaError>,
        abort: Arc<AtomicBool>,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(PoolStats::default());
        let mut workers = Vec::with_capacity(count.max(1));

        for id in 0..count.max(1) {
            workers.push(Worker::spawn(
                id,
                paths.clone(),
                objects.clone(),
                errors.clone(),
                Arc::clone(&abort),
                Arc::clone(&stats),
            )?);
        }

        info!(count = workers.len(), "Decoder workers spawned");

        Ok(Self { workers, stats })
    }

    /// Number of workers
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// True if the pool has no workers
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Get pool statistics
    pub fn stats(&self) -> Arc<PoolStats> {
        Arc::clone(&self.stats)
    }

    /// Wait for every worker to exit; returns one error per panicked worker
    pub fn join(self) -> Vec<WorkerError> {
        self.workers
            .into_iter()
            .filter_map(|worker| worker.join().err())
            .collect()
    }
}
