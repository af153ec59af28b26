//! Progress reporting for a split run
//!
//! Provides a spinner on stderr using indicatif and a summary on stdout.

use crate::pipeline::SplitProgress;
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Progress reporter that displays split status
#[derive(Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &SplitProgress) {
        let msg = format!(
            "Inputs: {}/{} | Objects: {} | Files: {} | Written: {} | Rate: {:.0}/s | Readers: {}/{}",
            format_number(progress.inputs_done),
            format_number(progress.inputs),
            format_number(progress.objects),
            format_number(progress.files),
            format_size(progress.bytes, BINARY),
            progress.objects_per_second(),
            progress.active_workers,
            progress.total_workers,
        );

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Figures shown in the final summary
#[derive(Debug, Clone, Default)]
pub struct Summary<'a> {
    pub inputs: u64,
    pub inputs_failed: u64,
    pub inputs_skipped: u64,
    pub objects: u64,
    pub files: u64,
    pub bytes: u64,
    pub errors: usize,
    pub duration: Duration,
    pub output_dir: &'a str,
}

/// Print a summary of the split results
pub fn print_summary(summary: &Summary<'_>) {
    let secs = summary.duration.as_secs_f64();
    let rate = if secs > 0.0 {
        summary.objects as f64 / secs
    } else {
        0.0
    };

    println!();
    if summary.errors == 0 {
        println!("{}", style("Split Complete").green().bold());
    } else {
        println!("{}", style("Split Finished With Errors").yellow().bold());
    }
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Inputs:").bold(), format_number(summary.inputs));
    if summary.inputs_failed > 0 {
        println!(
            "  {} {}",
            style("Failed inputs:").yellow().bold(),
            format_number(summary.inputs_failed)
        );
    }
    if summary.inputs_skipped > 0 {
        println!(
            "  {} {}",
            style("Skipped inputs:").yellow().bold(),
            format_number(summary.inputs_skipped)
        );
    }
    println!("  {} {}", style("Objects:").bold(), format_number(summary.objects));
    println!("  {} {}", style("Files:").bold(), format_number(summary.files));
    println!(
        "  {} {}",
        style("Written:").bold(),
        format_size(summary.bytes, BINARY)
    );
    println!(
        "  {} {:.1}s ({:.0} objects/sec)",
        style("Duration:").bold(),
        secs,
        rate
    );
    if summary.errors > 0 {
        println!(
            "  {} {}",
            style("Errors:").yellow().bold(),
            format_number(summary.errors as u64)
        );
    }
    println!("  {} {}", style("Output:").bold(), summary.output_dir);
    println!();
}

/// Print a header at the start of the split
pub fn print_header(inputs: usize, readers: usize, output: &str) {
    println!();
    println!(
        "{} {}",
        style("krossa").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Inputs:").bold(), inputs);
    println!("  {} {}", style("Readers:").bold(), readers);
    println!("  {} {}", style("Output:").bold(), output);
    println!();
}
