//! Configuration types for krossa
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use crate::output::DEFAULT_BUFFER_SIZE;
use clap::Parser;
use std::path::PathBuf;

/// Default objects queue capacity
pub const DEFAULT_QUEUE_SIZE: usize = 16;

/// Default path queue capacity
pub const DEFAULT_PATH_QUEUE_SIZE: usize = 4;

/// Error queue capacity
pub const ERROR_QUEUE_SIZE: usize = 4;

/// Smallest accepted output buffer
const MIN_BUFFER_SIZE: usize = 4 * 1024;

/// Split Kubernetes List documents by namespace and kind
#[derive(Parser, Debug, Clone)]
#[command(
    name = "krossa",
    version,
    about = "Split Kubernetes List documents by namespace and kind",
    long_about = "Reads one or more JSON documents of kind List and writes their items to\n\
                  <output-dir>/__all__.json, <output-dir>/<namespace>/__all__.json and\n\
                  <output-dir>/<namespace>/<kind>.json.\n\n\
                  Item order within an output file is unpredictable.",
    after_help = "EXAMPLES:\n    \
        krossa out/ cluster-dump.json\n    \
        krossa -r 8 out/ dumps/*.json\n    \
        kubectl get all -A -o json > all.json && krossa -p out/ all.json"
)]
pub struct CliArgs {
    /// Directory receiving the output files
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Input List documents
    #[arg(value_name = "INPUT", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Number of reader threads (values below 1 are treated as 1)
    #[arg(
        short = 'r',
        long,
        default_value_t = default_readers(),
        allow_negative_numbers = true,
        value_name = "NUM"
    )]
    pub readers: i64,

    /// Capacity of the decoded objects queue
    #[arg(long, default_value_t = DEFAULT_QUEUE_SIZE, value_name = "NUM")]
    pub queue_size: usize,

    /// Capacity of the input path queue
    #[arg(long, default_value_t = DEFAULT_PATH_QUEUE_SIZE, value_name = "NUM")]
    pub path_queue_size: usize,

    /// Write buffer size per output file, in bytes
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE, value_name = "BYTES")]
    pub buffer_size: usize,

    /// Show progress and a summary
    #[arg(short = 'p', long)]
    pub progress: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_readers() -> i64 {
    num_cpus::get() as i64
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct KrossaConfig {
    /// Output root
    pub output_dir: PathBuf,

    /// Input files, in command-line order
    pub inputs: Vec<PathBuf>,

    /// Number of decoder threads
    pub reader_count: usize,

    /// Objects queue capacity
    pub queue_size: usize,

    /// Path queue capacity
    pub path_queue_size: usize,

    /// Per-file write buffer
    pub buffer_size: usize,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl KrossaConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        // Non-positive reader counts fall back to a single reader
        let reader_count = usize::try_from(args.readers).unwrap_or(0).max(1);

        if args.queue_size < 1 {
            return Err(ConfigError::InvalidQueueSize {
                name: "queue",
                size: args.queue_size,
                min: 1,
            });
        }

        if args.path_queue_size < 1 {
            return Err(ConfigError::InvalidQueueSize {
                name: "path queue",
                size: args.path_queue_size,
                min: 1,
            });
        }

        if args.buffer_size < MIN_BUFFER_SIZE {
            return Err(ConfigError::InvalidBufferSize {
                size: args.buffer_size,
                min: MIN_BUFFER_SIZE,
            });
        }

        if !args.output_dir.is_dir() {
            let reason = if args.output_dir.exists() {
                "Not a directory"
            } else {
                "Directory does not exist"
            };
            return Err(ConfigError::InvalidOutputDir {
                path: args.output_dir.clone(),
                reason: reason.to_string(),
            });
        }

        Ok(Self {
            output_dir: args.output_dir,
            inputs: args.inputs,
            reader_count,
            queue_size: args.queue_size,
            path_queue_size: args.path_queue_size,
            buffer_size: args.buffer_size,
            show_progress: args.progress,
            verbose: args.verbose,
        })
    }

    /// Configuration with default settings for the given directories
    pub fn new(output_dir: impl Into<PathBuf>, inputs: Vec<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            inputs,
            reader_count: num_cpus::get().max(1),
            queue_size: DEFAULT_QUEUE_SIZE,
            path_queue_size: DEFAULT_PATH_QUEUE_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            show_progress: false,
            verbose: false,
        }
    }

    /// Override the number of decoder threads (at least one)
    pub fn with_readers(mut self, readers: usize) -> Self {
        self.reader_count = readers.max(1);
        self
    }

    /// Override the objects queue capacity (at least one)
    pub fn with_queue_size(mut self, size: usize) -> Self {
        self.queue_size = size.max(1);
        self
    }
}
