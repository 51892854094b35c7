//! dirjob - Coordinator-free batch job runner
//!
//! Many independent worker processes drain a pool of job directories
//! together. They share no memory and talk to no coordinator. The only
//! shared state is the filesystem.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        PollLoop                          │
//! │  pass: for each pattern                                  │
//! │    DiscoveryScanner ──► candidate dirs (fresh every pass)│
//! │         │                                                │
//! │         ▼                                                │
//! │    ClaimStore::try_claim  (create <label>.lock, O_EXCL)  │
//! │         │ acquired                                       │
//! │         ▼                                                │
//! │    CommandRunner  (cwd = dir, <label>.out / .err)        │
//! │         │                                                │
//! │         ▼                                                │
//! │    RunStats ──► job / time limit?                        │
//! │  stop when a whole pass runs nothing                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Start as many of these as you like, on as many hosts as share the tree
//! dirjob -p 'runs/sim_*' -c 'R CMD BATCH launch.R' --maxhours 11.5
//! ```
//!
//! Claimed directories are never released. A job that fails stays claimed
//! and is not retried. Delete its `<label>.lock` to make it eligible again.

pub mod claim;
pub mod config;
pub mod discovery;
pub mod error;
pub mod identity;
pub mod progress;
pub mod worker;

pub use config::{CliArgs, Label, MatchMode, Pattern, WorkerConfig};
pub use error::{DirJobError, Result};
pub use worker::{PollLoop, RunSummary, StopReason};
