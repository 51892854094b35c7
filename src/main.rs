//! dirjob - Coordinator-free batch job runner
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use dirjob::config::{CliArgs, WorkerConfig};
use dirjob::progress::{print_header, print_summary, ProgressReporter};
use dirjob::worker::{PollLoop, StopReason};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit code after an interrupt, matching the shell's 128 + SIGINT
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    match run() {
        Ok(StopReason::Interrupted) => ExitCode::from(EXIT_INTERRUPTED),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<StopReason> {
    // Prints usage and exits on bad flags, --help and --version
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    let config = WorkerConfig::from_args(args).context("Invalid configuration")?;
    info!("Worker ID: {}", config.worker_id);

    if config.show_progress {
        print_header(&config);
    }

    let poll = PollLoop::new(config);

    // First Ctrl+C stops after the running job, second one exits now
    let shutdown = poll.shutdown_flag();
    ctrlc::set_handler(move || {
        if shutdown.load(Ordering::Relaxed) {
            eprintln!("\nForce shutdown!");
            std::process::exit(EXIT_INTERRUPTED as i32);
        }
        eprintln!("\nInterrupt received, stopping after the current job... (press Ctrl+C again to force)");
        shutdown.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let progress = poll.config().show_progress.then(ProgressReporter::new);
    if let Some(ref p) = progress {
        p.set_status("Scanning for work...");
    }

    let summary = poll
        .run_with_progress(|update| {
            if let Some(ref p) = progress {
                p.update(update);
            }
        })
        .context("Worker failed")?;

    if let Some(ref p) = progress {
        p.finish_and_clear();
        print_summary(&summary);
    }

    Ok(summary.stop_reason)
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("dirjob=debug,warn")
    } else {
        EnvFilter::new("dirjob=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
