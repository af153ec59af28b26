//! Error message collection
//!
//! Errors from every stage end up here exactly once. They are reported
//! together at the end of the run, sorted, one per line.

use crate::error::KrossaError;
use std::io::{self, Write};

/// Accumulates errors for the final report
#[derive(Debug, Default)]
pub struct MessageCollector {
    collected: Vec<KrossaError>,
}

impl MessageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one error
    pub fn append_error(&mut self, err: KrossaError) {
        self.collected.push(err);
    }

    /// Number of errors collected
    pub fn len(&self) -> usize {
        self.collected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }

    /// Rendered messages, sorted lexicographically
    pub fn messages(&self) -> Vec<String> {
        let mut messages: Vec<String> = self.collected.iter().map(|e| e.to_string()).collect();
        messages.sort();
        messages
    }

    /// Print all messages to `out`, one per line
    ///
    /// Returns the exit status: 0 when nothing was collected, 1 otherwise.
    pub fn print<W: Write>(&self, mut out: W) -> io::Result<i32> {
        if self.collected.is_empty() {
            return Ok(0);
        }

        for message in self.messages() {
            writeln!(out, "{message}")?;
        }

        Ok(1)
    }
}
