//! krossa - Split Kubernetes List documents by namespace and kind
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use krossa::config::{CliArgs, KrossaConfig};
use krossa::pipeline::SplitCoordinator;
use krossa::progress::{print_header, print_summary, ProgressReporter, Summary};
use std::io;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<u8> {
    // Usage errors exit with status 2 from inside clap
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    let config = KrossaConfig::from_args(args).context("Invalid configuration")?;

    if config.show_progress {
        print_header(
            config.inputs.len(),
            config.reader_count,
            &config.output_dir.display().to_string(),
        );
    }

    let coordinator = SplitCoordinator::new(config.clone());

    let result = if config.show_progress {
        let progress = ProgressReporter::new();
        progress.set_status("Starting readers...");

        let reporter = progress.clone();
        let result = coordinator
            .run_with_progress(move |p| reporter.update(&p))
            .context("Split failed")?;

        if result.aborted {
            progress.finish("Split aborted");
        } else {
            progress.finish("Split completed");
        }
        result
    } else {
        coordinator.run().context("Split failed")?
    };

    if config.show_progress {
        print_summary(&Summary {
            inputs: result.inputs,
            inputs_failed: result.inputs_failed,
            inputs_skipped: result.inputs_skipped,
            objects: result.objects_written,
            files: result.files_created,
            bytes: result.bytes_written,
            errors: result.errors.len(),
            duration: result.duration,
            output_dir: &config.output_dir.display().to_string(),
        });
    }

    if result.aborted {
        info!(
            discarded = result.objects_discarded,
            "Split was aborted after a write failure"
        );
    }

    let code = result
        .errors
        .print(io::stderr().lock())
        .context("Failed to report errors")?;

    Ok(u8::try_from(code).unwrap_or(1))
}

fn setup_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "krossa=debug" } else { "krossa=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
