//! Split coordinator - wires the pipeline together and shuts it down
//!
//! Roles and shutdown order:
//!
//! 1. The path feeder enqueues every input path, then closes the path queue.
//! 2. Decoder workers drain the path queue and exit; the last one to exit
//!    drops the last objects sender, closing the objects queue. A pool
//!    supervisor joins them and reports panics.
//! 3. The writer receives objects until the queue closes. After a write
//!    failure it keeps draining and discarding.
//! 4. The finalizer joins the writer, closes every output file and reports
//!    each close failure.
//! 5. The calling thread collects errors until every error sender is gone.
//!
//! No state is shared between these threads except through bounded
//! channels, the abort flag and statistics counters.

use crate::config::{KrossaConfig, ERROR_QUEUE_SIZE};
use crate::error::{KrossaError, Result, WorkerError};
use crate::messages::MessageCollector;
use crate::output::{OutputFileSet, OutputWriter, WriterStats};
use crate::pipeline::queue::{path_queue, PathQueueSender, QueueStats};
use crate::pipeline::worker::{DecoderPool, PoolStats};
use crossbeam_channel::{bounded, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of a completed split run
#[derive(Debug)]
pub struct SplitResult {
    /// Input paths given
    pub inputs: u64,

    /// Inputs whose objects were all forwarded
    pub inputs_decoded: u64,

    /// Inputs that failed to decode
    pub inputs_failed: u64,

    /// Inputs skipped after an abort
    pub inputs_skipped: u64,

    /// Objects handed to the writer
    pub objects_forwarded: u64,

    /// Objects written to their partitions
    pub objects_written: u64,

    /// Objects dropped after an abort
    pub objects_discarded: u64,

    /// Output files created
    pub files_created: u64,

    /// Bytes written to output files
    pub bytes_written: u64,

    /// Whether a write failure aborted the run
    pub aborted: bool,

    /// Time taken
    pub duration: Duration,

    /// Every collected error
    pub errors: MessageCollector,
}

impl SplitResult {
    /// True if no error was collected
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Progress information for display
#[derive(Debug, Clone, Default)]
pub struct SplitProgress {
    /// Input paths given
    pub inputs: u64,

    /// Inputs processed (decoded, failed or skipped)
    pub inputs_done: u64,

    /// Inputs that failed
    pub inputs_failed: u64,

    /// Objects written
    pub objects: u64,

    /// Output files created
    pub files: u64,

    /// Bytes written
    pub bytes: u64,

    /// Workers currently busy
    pub active_workers: usize,

    /// Total workers
    pub total_workers: usize,

    /// Elapsed time
    pub elapsed: Duration,
}

impl SplitProgress {
    /// Objects written per second
    pub fn objects_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.objects as f64 / secs
        } else {
            0.0
        }
    }
}

/// Coordinates a split run
pub struct SplitCoordinator {
    config: Arc<KrossaConfig>,
    abort: Arc<AtomicBool>,
}

impl SplitCoordinator {
    /// Create a new coordinator
    pub fn new(config: KrossaConfig) -> Self {
        Self {
            config: Arc::new(config),
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run the split to completion
    pub fn run(&self) -> Result<SplitResult> {
        self.run_inner(None::<fn(SplitProgress)>)
    }

    /// Run the split, reporting progress every 100ms from a separate thread
    pub fn run_with_progress<F>(&self, progress_callback: F) -> Result<SplitResult>
    where
        F: Fn(SplitProgress) + Send + 'static,
    {
        self.run_inner(Some(progress_callback))
    }

    fn run_inner<F>(&self, progress_callback: Option<F>) -> Result<SplitResult>
    where
        F: Fn(SplitProgress) + Send + 'static,
    {
        let start = Instant::now();
        let config = &self.config;

        info!(
            output = %config.output_dir.display(),
            inputs = config.inputs.len(),
            readers = config.reader_count,
            "Starting split"
        );

        let (path_tx, path_rx) = path_queue(config.path_queue_size);
        let queue_stats = path_tx.stats();
        let (object_tx, object_rx) = bounded(config.queue_size);
        let (error_tx, error_rx) = bounded::<KrossaError>(ERROR_QUEUE_SIZE);

        // Writer owns the output file set for the whole run
        let files = OutputFileSet::new(&config.output_dir, config.buffer_size);
        let writer = OutputWriter::spawn(
            files,
            object_rx,
            error_tx.clone(),
            Arc::clone(&self.abort),
        )?;
        let writer_stats = writer.stats();
        let finalizer = spawn_named("output-finalizer", {
            let errors = error_tx.clone();
            move || finalize_output(writer, errors)
        })?;

        // Decoder pool; `object_tx` moves in so the pool holds every sender
        let pool = DecoderPool::spawn(
            config.reader_count,
            path_rx,
            object_tx,
            error_tx.clone(),
            Arc::clone(&self.abort),
        )?;
        let pool_stats = pool.stats();
        let total_workers = pool.len();
        let supervisor = spawn_named("pool-supervisor", {
            let errors = error_tx.clone();
            move || supervise_pool(pool, errors)
        })?;

        let feeder = spawn_named("path-feeder", {
            let inputs = config.inputs.clone();
            move || feed_paths(path_tx, inputs)
        })?;

        // Only the stage threads may keep the error queue open
        drop(error_tx);

        let done = Arc::new(AtomicBool::new(false));
        let reporter = match progress_callback {
            Some(callback) => Some(spawn_named("progress", {
                let done = Arc::clone(&done);
                let pool_stats = Arc::clone(&pool_stats);
                let writer_stats = Arc::clone(&writer_stats);
                let inputs = config.inputs.len() as u64;
                move || {
                    while !done.load(Ordering::Relaxed) {
                        callback(snapshot(
                            inputs,
                            &pool_stats,
                            &writer_stats,
                            total_workers,
                            start.elapsed(),
                        ));
                        thread::sleep(Duration::from_millis(100));
                    }
                }
            })?),
            None => None,
        };

        let mut errors = MessageCollector::new();
        for err in error_rx.iter() {
            errors.append_error(err);
        }
        debug!(errors = errors.len(), "Error queue closed");

        join_quietly(feeder, "path-feeder");
        join_quietly(supervisor, "pool-supervisor");
        join_quietly(finalizer, "output-finalizer");

        done.store(true, Ordering::SeqCst);
        if let Some(reporter) = reporter {
            join_quietly(reporter, "progress");
        }

        let result = build_result(
            config.inputs.len() as u64,
            &queue_stats,
            &pool_stats,
            &writer_stats,
            self.abort.load(Ordering::SeqCst),
            start.elapsed(),
            errors,
        );

        info!(
            objects = result.objects_written,
            files = result.files_created,
            errors = result.errors.len(),
            duration_ms = result.duration.as_millis() as u64,
            "Split completed"
        );

        Ok(result)
    }
}

fn spawn_named<F>(name: &str, f: F) -> std::result::Result<JoinHandle<()>, WorkerError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(f)
        .map_err(|e| WorkerError::SpawnFailed {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

fn join_quietly(handle: JoinHandle<()>, name: &str) {
    if handle.join().is_err() {
        warn!(thread = name, "Thread panicked");
    }
}

/// Enqueue every input path, then close the queue by dropping the sender
fn feed_paths(paths: PathQueueSender, inputs: Vec<PathBuf>) {
    let total = inputs.len();

    for (i, path) in inputs.into_iter().enumerate() {
        if let Err(path) = paths.send(path) {
            warn!(
                path = %path.display(),
                remaining = total - i,
                "No decoder left to receive input paths"
            );
            break;
        }
    }
}

/// Join every decoder worker and report panics
fn supervise_pool(pool: DecoderPool, errors: Sender<KrossaError>) {
    for err in pool.join() {
        warn!(error = %err, "Decoder worker failed");
        report(&errors, err.into(), "pool-supervisor");
    }
}

/// Wait for the writer, close all output files and report failures
fn finalize_output(writer: OutputWriter, errors: Sender<KrossaError>) {
    match writer.finish() {
        Ok(failures) => {
            for err in failures {
                report(&errors, err.into(), "output-finalizer");
            }
        }
        Err(err) => report(&errors, err.into(), "output-finalizer"),
    }
}

fn report(errors: &Sender<KrossaError>, err: KrossaError, stage: &str) {
    if let Err(lost) = errors.send(err) {
        warn!(stage = stage, error = %lost.into_inner(), "Error queue closed, error not reported");
    }
}

fn snapshot(
    inputs: u64,
    pool: &PoolStats,
    writer: &WriterStats,
    total_workers: usize,
    elapsed: Duration,
) -> SplitProgress {
    SplitProgress {
        inputs,
        inputs_done: pool.inputs_decoded() + pool.inputs_failed() + pool.inputs_skipped(),
        inputs_failed: pool.inputs_failed(),
        objects: writer.objects_written(),
        files: writer.files_created(),
        bytes: writer.bytes_written(),
        active_workers: pool.active_workers(),
        total_workers,
        elapsed,
    }
}

fn build_result(
    inputs: u64,
    queue: &QueueStats,
    pool: &PoolStats,
    writer: &WriterStats,
    aborted: bool,
    duration: Duration,
    errors: MessageCollector,
) -> SplitResult {
    let fed = queue.enqueued();
    if fed < inputs {
        warn!(fed = fed, inputs = inputs, "Not every input path was queued");
    }

    SplitResult {
        inputs,
        inputs_decoded: pool.inputs_decoded(),
        inputs_failed: pool.inputs_failed(),
        inputs_skipped: pool.inputs_skipped(),
        objects_forwarded: pool.objects_forwarded(),
        objects_written: writer.objects_written(),
        objects_discarded: writer.objects_discarded(),
        files_created: writer.files_created(),
        bytes_written: writer.bytes_written(),
        aborted,
        duration,
        errors,
    }
}
