//! Worker module: job execution and the poll loop
//!
//! A worker is single-threaded. Scanning, claiming and running never
//! overlap, and each job blocks the loop until its process exits.

mod poll;
mod runner;

pub use poll::{PollLoop, RunStats, RunSummary, StopReason, WorkerProgress};
pub use runner::{run_job, CommandRunner, JobExecutor, JobOutcome};
