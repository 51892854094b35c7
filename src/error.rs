//! Error types for dirjob
//!
//! This module defines the error hierarchy for:
//! - Configuration and CLI validation
//! - Claim marker creation
//! - Job launch and output capture
//!
//! Losing a claim race is not represented here. It is an expected outcome
//! and is returned as [`crate::claim::ClaimOutcome::Contended`].

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for dirjob
#[derive(Error, Debug)]
pub enum DirJobError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Claim marker errors
    #[error("Claim error: {0}")]
    Claim(#[from] ClaimError),

    /// Job launch errors
    #[error("Job error: {0}")]
    Job(#[from] JobError),
}

/// Configuration errors, all raised before any scanning begins
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No pattern given
    #[error("At least one pattern is required")]
    NoPatterns,

    /// Command string had no tokens
    #[error("Command is empty")]
    EmptyCommand,

    /// Regular expression failed to compile
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    /// Glob expression failed to parse
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },

    /// Basepath list does not pair up with the pattern list
    #[error("Length {basepaths} of basepaths is not equal to length {patterns} of patterns")]
    BasepathMismatch { basepaths: usize, patterns: usize },

    /// Basepaths only make sense when matching sibling names
    #[error("--basepath is only valid with --mode regex")]
    BasepathInGlobMode,

    /// Job limit of zero
    #[error("Invalid --maxjobs {0}: must be at least 1")]
    InvalidMaxJobs(u64),

    /// Time limit that is not a positive finite number
    #[error("Invalid --maxhours {0}: must be a positive number")]
    InvalidMaxHours(f64),

    /// Label that cannot be used as a file name prefix
    #[error("Invalid label '{label}': {reason}")]
    InvalidLabel { label: String, reason: String },
}

/// Claim marker errors other than contention
#[derive(Error, Debug)]
pub enum ClaimError {
    /// Marker could not be created or written
    #[error("Failed to create claim marker '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Job execution errors
///
/// A job that runs and exits non-zero is not an error.
#[derive(Error, Debug)]
pub enum JobError {
    /// Command could not be launched
    #[error("Failed to launch '{program}' in '{dir}': {source}")]
    Spawn {
        program: String,
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output capture file could not be opened
    #[error("Failed to open output file '{path}': {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child failed
    #[error("Failed to wait for job in '{dir}': {source}")]
    Wait {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for dirjob operations
pub type Result<T> = std::result::Result<T, DirJobError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basepath_mismatch_message() {
        let err = ConfigError::BasepathMismatch {
            basepaths: 2,
            patterns: 3,
        };
        assert_eq!(
            err.to_string(),
            "Length 2 of basepaths is not equal to length 3 of patterns"
        );
    }

    #[test]
    fn test_claim_error_wraps_into_top_level() {
        let err: DirJobError = ClaimError::Io {
            path: PathBuf::from("/jobs/a/worker.lock"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();

        assert!(matches!(err, DirJobError::Claim(_)));
        assert!(err.to_string().contains("/jobs/a/worker.lock"));
    }
}
