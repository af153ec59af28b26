//! Output file set and its dedicated writer thread
//!
//! The set of open output files is owned by exactly one thread for the whole
//! run. Decoder workers never see it; they hand objects over a bounded
//! channel and the writer thread routes each one to its three partitions.
//! When the channel closes the thread returns the set to whoever joins it,
//! which then closes every file.
//!
//! On the first write failure the writer reports the error, raises the shared
//! abort flag and keeps draining the channel (discarding objects) so no
//! worker stays blocked on a full queue.

use crate::error::{KrossaError, OutputError, OutputResult, WorkerError};
use crate::list::Object;
use crate::output::file::OutputFile;
use crate::output::route::{global_key, route, PartitionKey};
use crossbeam_channel::{Receiver, Sender};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::DirBuilder;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Lazily opened output files, one per partition key
pub struct OutputFileSet {
    base_dir: PathBuf,
    buffer_size: usize,
    files: HashMap<String, OutputFile>,
    bytes_written: u64,
}

impl OutputFileSet {
    /// Create an empty set rooted at `base_dir`; nothing is touched on disk yet
    pub fn new(base_dir: impl Into<PathBuf>, buffer_size: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            buffer_size,
            files: HashMap::new(),
            bytes_written: 0,
        }
    }

    /// Write an object to all of its partitions
    ///
    /// Stops at the first failure. Partitions written before the failure
    /// keep the object.
    pub fn write(&mut self, obj: &Object) -> OutputResult<()> {
        for key in route(obj) {
            let buffer_size = self.buffer_size;
            let file = open_output_file(&mut self.files, &self.base_dir, &key, buffer_size)?;

            let before = file.bytes();
            let result = file.write_item(obj.raw());
            self.bytes_written += file.bytes() - before;
            result?;
        }

        Ok(())
    }

    /// Open the global partition, which exists even when no object arrives
    pub fn open_global(&mut self) -> OutputResult<()> {
        open_output_file(&mut self.files, &self.base_dir, &global_key(), self.buffer_size)?;
        Ok(())
    }

    /// Close every file, attempting all of them
    ///
    /// Returns every failure; an empty vector means all files were written
    /// out completely.
    pub fn close(self) -> Vec<OutputError> {
        let mut failures = Vec::new();

        for (_, file) in self.files {
            let path = file.path().to_path_buf();
            let count = file.count();

            match file.close() {
                Ok(()) => debug!(path = %path.display(), items = count, "Output file closed"),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to close output file");
                    failures.push(e);
                }
            }
        }

        failures
    }

    /// Number of files opened so far
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True if no file has been opened
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Bytes handed to the file buffers so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Output root
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// Look up the file for `key`, creating its directories and the file itself
/// on first use. Once opened, files stay open until the set is closed.
fn open_output_file<'a>(
    files: &'a mut HashMap<String, OutputFile>,
    base_dir: &Path,
    key: &PartitionKey,
    buffer_size: usize,
) -> OutputResult<&'a mut OutputFile> {
    match files.entry(key.map_key()) {
        Entry::Occupied(entry) => Ok(entry.into_mut()),
        Entry::Vacant(entry) => {
            make_output_dirs(base_dir, key)?;

            let path = key.path_in(base_dir);
            let file = OutputFile::create(&path, buffer_size)?;
            debug!(path = %path.display(), "Output file created");

            Ok(entry.insert(file))
        }
    }
}

/// Ensure every directory component of `key` exists below `base_dir`
fn make_output_dirs(base_dir: &Path, key: &PartitionKey) -> OutputResult<()> {
    let mut builder = DirBuilder::new();

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    let mut path = base_dir.to_path_buf();

    for component in key.dirs() {
        if component.is_empty() {
            return Err(OutputError::EmptyPathComponent {
                key: key.components().join("/"),
            });
        }

        path.push(component);

        match builder.create(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(source) => return Err(OutputError::CreateDir { path, source }),
        }
    }

    Ok(())
}

/// Counters shared between the writer thread and observers
#[derive(Debug, Default)]
pub struct WriterStats {
    /// Objects written to all three partitions
    pub objects_written: AtomicU64,

    /// Objects received after an abort and dropped
    pub objects_discarded: AtomicU64,

    /// Output files opened
    pub files_created: AtomicU64,

    /// Bytes handed to output buffers
    pub bytes_written: AtomicU64,
}

impl WriterStats {
    /// Objects written so far
    pub fn objects_written(&self) -> u64 {
        self.objects_written.load(Ordering::Relaxed)
    }

    /// Objects discarded after an abort
    pub fn objects_discarded(&self) -> u64 {
        self.objects_discarded.load(Ordering::Relaxed)
    }

    /// Output files created
    pub fn files_created(&self) -> u64 {
        self.files_created.load(Ordering::Relaxed)
    }

    /// Bytes written
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }
}

/// Writer thread owning the output file set
pub struct OutputWriter {
    handle: Option<JoinHandle<OutputFileSet>>,
    stats: Arc<WriterStats>,
}

impl OutputWriter {
    /// Spawn the writer thread
    ///
    /// The thread receives objects until `objects` is closed. Write errors
    /// are sent to `errors`.
    pub fn spawn(
        files: OutputFileSet,
        objects: Receiver<Object>,
        errors: Sender<KrossaError>,
        abort: Arc<AtomicBool>,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(WriterStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name("output-writer".into())
            .spawn(move || writer_loop(files, objects, errors, abort, stats_clone))
            .map_err(|e| WorkerError::SpawnFailed {
                name: "output-writer".into(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            handle: Some(handle),
            stats,
        })
    }

    /// Get writer statistics
    pub fn stats(&self) -> Arc<WriterStats> {
        Arc::clone(&self.stats)
    }

    /// Wait for the writer thread to finish, then close every output file
    ///
    /// Returns all close failures.
    pub fn finish(mut self) -> Result<Vec<OutputError>, WorkerError> {
        let files = match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::Panicked {
                name: "output-writer".into(),
                message: "Writer thread panicked".into(),
            })?,
            None => return Ok(Vec::new()),
        };

        let count = files.len();
        let failures = files.close();

        info!(
            files = count,
            failed = failures.len(),
            "Output files closed"
        );

        Ok(failures)
    }
}

/// Internal writer thread function
fn writer_loop(
    mut files: OutputFileSet,
    objects: Receiver<Object>,
    errors: Sender<KrossaError>,
    abort: Arc<AtomicBool>,
    stats: Arc<WriterStats>,
) -> OutputFileSet {
    debug!(dir = %files.base_dir().display(), "Writer started");

    if let Err(e) = files.open_global() {
        abort_writer(e, &objects, &errors, &abort, &stats);
        return files;
    }
    stats.files_created.store(files.len() as u64, Ordering::Relaxed);

    for obj in objects.iter() {
        let result = files.write(&obj);

        stats.files_created.store(files.len() as u64, Ordering::Relaxed);
        stats.bytes_written.store(files.bytes_written(), Ordering::Relaxed);

        if let Err(e) = result {
            abort_writer(e, &objects, &errors, &abort, &stats);
            break;
        }

        stats.objects_written.fetch_add(1, Ordering::Relaxed);
    }

    files
}

/// Report a write failure, raise the abort flag and drain the queue
fn abort_writer(
    err: OutputError,
    objects: &Receiver<Object>,
    errors: &Sender<KrossaError>,
    abort: &AtomicBool,
    stats: &WriterStats,
) {
    error!(error = %err, "Write failed, aborting");
    abort.store(true, Ordering::SeqCst);

    if errors.send(err.into()).is_err() {
        warn!("Error queue closed, write failure not reported");
    }

    // Keep the queue moving so blocked workers can observe the abort
    let discarded = objects.iter().count() as u64;
    stats.objects_discarded.store(discarded, Ordering::Relaxed);
    if discarded > 0 {
        warn!(objects = discarded, "Discarded objects after abort");
    }
}
