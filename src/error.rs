//! Error types for krossa
//!
//! This module defines the error hierarchy for a split run:
//! - Input decoding errors (one per failed input file)
//! - Output file set errors (directory creation, open, write, close)
//! - Configuration errors
//! - Worker thread errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Every error that reaches the message collector renders as a single line
//! - Preserve error chains for debugging

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for krossa
#[derive(Error, Debug)]
pub enum KrossaError {
    /// An input file could not be decoded; it contributes no objects
    #[error("{}: {source}", path.display())]
    Input { path: PathBuf, source: DecodeError },

    /// Output errors
    #[error(transparent)]
    Output(#[from] OutputError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

impl KrossaError {
    /// Wrap a decode failure with the path of the offending input file
    pub fn input(path: impl Into<PathBuf>, source: DecodeError) -> Self {
        KrossaError::Input {
            path: path.into(),
            source,
        }
    }
}

/// Errors produced while decoding one input List document
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Input could not be opened or read
    #[error("{0}")]
    Read(#[from] std::io::Error),

    /// Malformed JSON, unknown root field or wrong value type
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// Root value is not a JSON object
    #[error("Expected JSON object at document root")]
    RootNotObject,

    /// Root `kind` is present but is not `List`
    #[error("Expected list object, found kind {0:?}")]
    NotAList(String),

    /// An element of `items` is not a JSON object
    #[error("Item {index}: expected JSON object")]
    ItemNotObject { index: usize },

    /// Re-indenting an element failed
    #[error("Item {index}: {reason}")]
    Reindent { index: usize, reason: String },

    /// `kind` or `metadata.namespace` has the wrong shape
    #[error("Item {index}: {source}")]
    Field {
        index: usize,
        source: serde_json::Error,
    },
}

/// Errors raised by the output file set
#[derive(Error, Debug)]
pub enum OutputError {
    /// A directory component of a partition key is empty
    #[error("Empty output path component in '{key}'")]
    EmptyPathComponent { key: String },

    /// Creating an output directory failed
    #[error("Failed to create directory '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Opening (creating/truncating) an output file failed
    #[error("Failed to open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing to an output file failed
    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Finishing an output file failed
    #[error("Failed to close '{}': {source}", path.display())]
    Close {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid queue size
    #[error("Invalid {name} size {size}: must be at least {min}")]
    InvalidQueueSize {
        name: &'static str,
        size: usize,
        min: usize,
    },

    /// Invalid output buffer size
    #[error("Invalid buffer size {size}: must be at least {min}")]
    InvalidBufferSize { size: usize, min: usize },

    /// Output directory error
    #[error("Invalid output directory '{}': {reason}", path.display())]
    InvalidOutputDir { path: PathBuf, reason: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Thread panicked
    #[error("Thread '{name}' panicked: {message}")]
    Panicked { name: String, message: String },

    /// Thread could not be started
    #[error("Failed to spawn thread '{name}': {reason}")]
    SpawnFailed { name: String, reason: String },
}

/// Result type alias for KrossaError
pub type Result<T> = std::result::Result<T, KrossaError>;

/// Result type alias for DecodeError
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Result type alias for OutputError
pub type OutputResult<T> = std::result::Result<T, OutputError>;

/// Outcome of decoding a single input path
#[derive(Debug)]
pub enum InputOutcome {
    /// Every object of the file was forwarded
    Forwarded { path: PathBuf, objects: usize },

    /// Not decoded because the run was aborted
    Skipped { path: PathBuf },

    /// Decoding failed; the error went to the error queue
    Failed { path: PathBuf },
}
