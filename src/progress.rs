//! Console output for a worker run
//!
//! Spinner while jobs run, plus a header and summary, using indicatif and
//! console styling.

use crate::config::WorkerConfig;
use crate::worker::{RunSummary, StopReason, WorkerProgress};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner showing the job currently running
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &WorkerProgress) {
        let msg = match &progress.current_dir {
            Some(dir) => format!(
                "Pass {} | Jobs: {} | Running: {}",
                progress.pass,
                progress.jobs_processed,
                style(dir.display()).yellow()
            ),
            None => format!(
                "Pass {} | Jobs: {} | Scanning...",
                progress.pass, progress.jobs_processed
            ),
        };

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Remove the spinner from the terminal
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a duration as `1h 02m 03s`
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

/// Print a header at worker start
pub fn print_header(config: &WorkerConfig) {
    println!();
    println!(
        "{} {}",
        style("dirjob").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Worker:").bold(), config.worker_id);
    for pattern in &config.patterns {
        println!("  {} {}", style("Pattern:").bold(), pattern);
    }
    println!("  {} {}", style("Command:").bold(), config.command_line());
    println!("  {} {}", style("Label:").bold(), config.label);
    if let Some(max) = config.max_jobs {
        println!("  {} {}", style("Max jobs:").bold(), max);
    }
    if let Some(max) = config.max_duration {
        println!("  {} {}", style("Max time:").bold(), format_duration(max));
    }
    println!();
}

/// Print a summary of the run
pub fn print_summary(summary: &RunSummary) {
    let stats = &summary.stats;
    let title = match summary.stop_reason {
        StopReason::Interrupted => style("Worker Interrupted").yellow().bold(),
        _ => style("Worker Complete").green().bold(),
    };

    println!();
    println!("{}", title);
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Stopped:").bold(), summary.stop_reason);
    println!("  {} {}", style("Jobs run:").bold(), stats.jobs_processed);
    if stats.jobs_failed > 0 {
        println!(
            "  {} {}",
            style("Non-zero exits:").yellow().bold(),
            stats.jobs_failed
        );
    }
    if stats.claims_lost > 0 {
        println!("  {} {}", style("Claims lost:").bold(), stats.claims_lost);
    }
    println!("  {} {}", style("Passes:").bold(), stats.passes);
    println!(
        "  {} {}",
        style("Duration:").bold(),
        format_duration(summary.duration)
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 05s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h 02m 03s");
    }
}
