//! Poll loop: scan, claim, run, repeat
//!
//! One pass walks every pattern in order. For each candidate directory the
//! loop skips it if a marker is already present, otherwise tries to claim
//! it and runs the job on success. Limits are checked only after a job
//! finishes, so the job that crosses a budget always runs to completion.
//!
//! The loop ends when a full pass runs no job, when a local limit is
//! reached, or when shutdown is requested between jobs.

use crate::claim::{ClaimOutcome, ClaimStore};
use crate::config::WorkerConfig;
use crate::discovery::DiscoveryScanner;
use crate::error::Result;
use crate::worker::runner::{CommandRunner, JobExecutor, JobOutcome};

use humansize::{format_size, BINARY};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Why the worker stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A full pass ran no job
    Exhausted,
    /// `max_jobs` jobs have run
    JobLimit,
    /// Elapsed time reached `max_duration`
    TimeLimit,
    /// Shutdown was requested
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Exhausted => write!(f, "no unclaimed work left"),
            StopReason::JobLimit => write!(f, "job limit reached"),
            StopReason::TimeLimit => write!(f, "time limit reached"),
            StopReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Counters for this worker process only
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Jobs run to completion, whatever their exit code
    pub jobs_processed: u64,
    /// Jobs that exited non-zero or were killed
    pub jobs_failed: u64,
    /// Claims lost to another worker between the marker check and the create
    pub claims_lost: u64,
    /// Candidates skipped because a marker was already present
    pub already_claimed: u64,
    /// Passes started
    pub passes: u64,
    started: Instant,
}

impl RunStats {
    fn new() -> Self {
        Self {
            jobs_processed: 0,
            jobs_failed: 0,
            claims_lost: 0,
            already_claimed: 0,
            passes: 0,
            started: Instant::now(),
        }
    }

    /// Wall-clock time since the worker started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Final result of a worker run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stats: RunStats,
    pub stop_reason: StopReason,
    pub duration: Duration,
}

/// Progress information for display
#[derive(Debug, Clone, Default)]
pub struct WorkerProgress {
    pub jobs_processed: u64,
    pub pass: u64,
    /// Directory whose job is running, if any
    pub current_dir: Option<PathBuf>,
}

enum PassResult {
    FoundWork,
    NoWork,
    Stop(StopReason),
}

/// The worker's main loop
pub struct PollLoop<E = CommandRunner> {
    config: WorkerConfig,
    scanner: DiscoveryScanner,
    claims: ClaimStore,
    executor: E,
    shutdown: Arc<AtomicBool>,
}

impl PollLoop<CommandRunner> {
    /// Create a loop that runs the configured command
    pub fn new(config: WorkerConfig) -> Self {
        let executor = CommandRunner::from_config(&config);
        Self::with_executor(config, executor)
    }
}

impl<E: JobExecutor> PollLoop<E> {
    /// Create a loop that hands claimed directories to `executor`
    pub fn with_executor(config: WorkerConfig, executor: E) -> Self {
        let claims = ClaimStore::new(config.label.clone());
        Self {
            config,
            scanner: DiscoveryScanner::new(),
            claims,
            executor,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops the loop before the next job when set
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Configuration this loop runs with
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run without progress reporting
    pub fn run(&self) -> Result<RunSummary> {
        self.run_with_progress(|_| {})
    }

    /// Run until exhaustion, a limit, or shutdown
    ///
    /// Claim I/O failures and job launch failures end the run with an error.
    pub fn run_with_progress<F>(&self, mut on_progress: F) -> Result<RunSummary>
    where
        F: FnMut(&WorkerProgress),
    {
        let mut stats = RunStats::new();

        let stop_reason = loop {
            stats.passes += 1;
            match self.scan_pass(&mut stats, &mut on_progress)? {
                PassResult::FoundWork => continue,
                PassResult::NoWork => break StopReason::Exhausted,
                PassResult::Stop(reason) => break reason,
            }
        };

        info!(
            jobs = stats.jobs_processed,
            failed = stats.jobs_failed,
            passes = stats.passes,
            "Done: {}",
            stop_reason
        );

        Ok(RunSummary {
            duration: stats.elapsed(),
            stats,
            stop_reason,
        })
    }

    fn scan_pass<F>(&self, stats: &mut RunStats, on_progress: &mut F) -> Result<PassResult>
    where
        F: FnMut(&WorkerProgress),
    {
        let mut found_work = false;
        info!(
            "Pass {}: searching {} patterns for available work",
            stats.passes,
            self.config.patterns.len()
        );

        for (i, pattern) in self.config.patterns.iter().enumerate() {
            info!("Pattern[{}]: {}", i, pattern);

            for dir in self.scanner.scan(pattern) {
                if self.is_shutdown() {
                    return Ok(PassResult::Stop(StopReason::Interrupted));
                }

                if self.claims.is_claimed(&dir) {
                    info!("Marker in {} exists, skipping", dir.display());
                    stats.already_claimed += 1;
                    continue;
                }

                match self.claims.try_claim(&dir, &self.config.worker_id)? {
                    ClaimOutcome::Acquired { marker } => {
                        info!("Claimed {}", marker.display());
                    }
                    ClaimOutcome::Contended => {
                        warn!("Could not claim {}, another worker took it", dir.display());
                        stats.claims_lost += 1;
                        continue;
                    }
                }

                on_progress(&WorkerProgress {
                    jobs_processed: stats.jobs_processed,
                    pass: stats.passes,
                    current_dir: Some(dir.clone()),
                });

                let outcome = self.executor.execute(&dir)?;
                self.record_job(stats, &dir, &outcome);
                found_work = true;

                on_progress(&WorkerProgress {
                    jobs_processed: stats.jobs_processed,
                    pass: stats.passes,
                    current_dir: None,
                });

                if let Some(reason) = self.limit_reached(stats) {
                    return Ok(PassResult::Stop(reason));
                }
                if self.is_shutdown() {
                    return Ok(PassResult::Stop(StopReason::Interrupted));
                }
            }
        }

        Ok(if found_work {
            PassResult::FoundWork
        } else {
            PassResult::NoWork
        })
    }

    fn record_job(&self, stats: &mut RunStats, dir: &Path, outcome: &JobOutcome) {
        stats.jobs_processed += 1;
        if !outcome.success {
            stats.jobs_failed += 1;
        }

        let exit = outcome
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        info!(
            "Job in {} finished (exit {}) in {:.1}s, out {}, err {}",
            dir.display(),
            exit,
            outcome.duration.as_secs_f64(),
            format_size(outcome.stdout_bytes, BINARY),
            format_size(outcome.stderr_bytes, BINARY),
        );
    }

    fn limit_reached(&self, stats: &RunStats) -> Option<StopReason> {
        if let Some(max) = self.config.max_jobs {
            if stats.jobs_processed >= max {
                return Some(StopReason::JobLimit);
            }
        }
        if let Some(max) = self.config.max_duration {
            if stats.elapsed() >= max {
                return Some(StopReason::TimeLimit);
            }
        }
        None
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}
