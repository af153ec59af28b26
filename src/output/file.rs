//! A single partitioned output file
//!
//! Layout on disk:
//!
//! ```text
//! {header}{item},\n{item},\n...{item}{footer}
//! ```
//!
//! The header is written when the file is opened; the footer only when it
//! is closed. Until then the file is not valid JSON.

use crate::error::{OutputError, OutputResult};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default write buffer per output file
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// Annotation key carried in every output document
pub const ORDER_ANNOTATION: &str = "krossa.appuio.ch/comment";

/// Opening of every output document, up to the items array
pub const OUTPUT_HEADER: &str = r#"{
  "kind": "List",
  "apiVersion": "v1",
  "metadata": {
    "annotations": {
      "krossa.appuio.ch/comment": "Object order is unpredictable"
    }
  },
  "items": [
"#;

/// Closing of every output document
pub const OUTPUT_FOOTER: &str = "\n]}";

/// Separator between two items
pub const ITEM_SEPARATOR: &[u8] = b",\n";

/// An open output file
pub struct OutputFile {
    path: PathBuf,
    writer: BufWriter<File>,
    count: u64,
    bytes: u64,
}

impl OutputFile {
    /// Create or truncate `path` and write the list header
    pub fn create(path: &Path, buffer_size: usize) -> OutputResult<Self> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let file = options.open(path).map_err(|source| OutputError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut out = Self {
            path: path.to_path_buf(),
            writer: BufWriter::with_capacity(buffer_size, file),
            count: 0,
            bytes: 0,
        };
        out.write_all(OUTPUT_HEADER.as_bytes())?;

        Ok(out)
    }

    /// Append one item, preceded by a separator unless it is the first
    pub fn write_item(&mut self, raw: &[u8]) -> OutputResult<()> {
        if self.count > 0 {
            self.write_all(ITEM_SEPARATOR)?;
        }

        self.count += 1;
        self.write_all(raw)
    }

    /// Write the footer, flush, sync and close the file
    ///
    /// The sync surfaces write-back failures that the implicit close on
    /// drop would swallow.
    pub fn close(mut self) -> OutputResult<()> {
        let footer = self.writer.write_all(OUTPUT_FOOTER.as_bytes());
        if let Err(source) = footer {
            return Err(OutputError::Close {
                path: self.path,
                source,
            });
        }

        let file = match self.writer.into_inner() {
            Ok(file) => file,
            Err(err) => {
                return Err(OutputError::Close {
                    path: self.path,
                    source: err.into_error(),
                })
            }
        };

        file.sync_all().map_err(|source| OutputError::Close {
            path: self.path,
            source,
        })
    }

    /// Path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Items written so far
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Bytes handed to the writer so far, header included
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    fn write_all(&mut self, buf: &[u8]) -> OutputResult<()> {
        self.writer
            .write_all(buf)
            .map_err(|source| OutputError::Write {
                path: self.path.clone(),
                source,
            })?;
        self.bytes += buf.len() as u64;
        Ok(())
    }
}
