//! Configuration types for dirjob
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Compiled directory patterns (glob or regex mode)
//! - The validated, immutable worker configuration

use crate::error::ConfigError;
use crate::identity;
use clap::{Parser, ValueEnum};
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default label for marker and output files
pub const DEFAULT_LABEL: &str = "worker";

/// Basepath used by regex patterns when none is given
pub const DEFAULT_BASEPATH: &str = "./";

const SECS_PER_HOUR: f64 = 3600.0;

/// Cooperatively drain a pool of batch job directories
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dirjob",
    version,
    disable_version_flag = true,
    about = "Claim and run batch job directories without a central coordinator",
    long_about = "Repeatedly scans for job directories, claims one by atomically creating\n\
                  <label>.lock inside it, and runs the command there with stdout/stderr\n\
                  captured to <label>.out and <label>.err.\n\n\
                  Any number of workers may run against the same directories. A directory\n\
                  with a lock file is never run again.",
    after_help = "EXAMPLES:\n    \
        dirjob -p 'runs/sim_*' -c 'R CMD BATCH launch.R'\n    \
        dirjob -p 'runs/sim_*' -p 'runs/fit_*' -c './run.sh' --maxjobs 10\n    \
        dirjob --mode regex -b runs -p 'sim_laplace(.*)_sigma(.*)' -c 'make' --maxhours 11.5"
)]
pub struct CliArgs {
    /// Pattern selecting candidate job directories (can be repeated)
    #[arg(
        short = 'p',
        long = "pattern",
        value_name = "PATTERN",
        required = true,
        action = clap::ArgAction::Append
    )]
    pub patterns: Vec<String>,

    /// Command to run inside each claimed directory, split on whitespace
    #[arg(short = 'c', long = "cmd", value_name = "COMMAND", allow_hyphen_values = true)]
    pub cmd: String,

    /// Stop after this many jobs have been run by this worker
    #[arg(long = "maxjobs", value_name = "NUM")]
    pub max_jobs: Option<u64>,

    /// Stop starting new jobs after this many hours since worker start
    #[arg(long = "maxhours", value_name = "HOURS")]
    pub max_hours: Option<f64>,

    /// Prefix for <label>.lock, <label>.out and <label>.err
    #[arg(long, default_value = DEFAULT_LABEL, value_name = "LABEL")]
    pub label: String,

    /// How patterns are matched
    #[arg(long, value_enum, default_value_t = MatchMode::Glob)]
    pub mode: MatchMode,

    /// Directory whose children are matched against the pattern at the same
    /// position (regex mode only, can be repeated)
    #[arg(
        short = 'b',
        long = "basepath",
        value_name = "DIR",
        action = clap::ArgAction::Append
    )]
    pub basepaths: Vec<PathBuf>,

    /// Worker ID written into claim markers (generated if not specified)
    #[arg(long, value_name = "ID")]
    pub worker_id: Option<String>,

    /// Quiet mode - suppress header, spinner and summary
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(long)]
    pub verbose: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    pub version: Option<bool>,
}

/// Pattern matching mode for a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MatchMode {
    /// Glob expression resolved relative to the current directory
    Glob,
    /// Regular expression searched in the names of a basepath's children
    Regex,
}

/// A compiled directory pattern
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Glob expression, e.g. `runs/sim_*`
    Glob(glob::Pattern),
    /// Regex searched (unanchored) in each child name of `basepath`
    Regex { basepath: PathBuf, regex: Regex },
}

impl Pattern {
    /// Parse a glob expression
    pub fn glob(pattern: &str) -> Result<Self, ConfigError> {
        glob::Pattern::new(pattern)
            .map(Pattern::Glob)
            .map_err(|e| ConfigError::InvalidGlob {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Compile a regex matched against the children of `basepath`
    pub fn regex(basepath: impl Into<PathBuf>, pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Pattern::Regex {
            basepath: basepath.into(),
            regex,
        })
    }

    /// Matching mode of this pattern
    pub fn mode(&self) -> MatchMode {
        match self {
            Pattern::Glob(_) => MatchMode::Glob,
            Pattern::Regex { .. } => MatchMode::Regex,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Glob(p) => write!(f, "{}", p.as_str()),
            Pattern::Regex { basepath, regex } => {
                write!(f, "{} in {}", regex.as_str(), basepath.display())
            }
        }
    }
}

/// File name prefix shared by the claim marker and the output files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label(String);

impl Label {
    /// Validate a label
    pub fn new(label: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidLabel {
            label: label.to_string(),
            reason: reason.to_string(),
        };

        if label.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if label == "." || label == ".." {
            return Err(invalid("must not be a relative directory name"));
        }
        if label.contains('/') || label.contains(std::path::MAIN_SEPARATOR) {
            return Err(invalid("must not contain a path separator"));
        }

        Ok(Self(label.to_string()))
    }

    /// Label text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Claim marker path inside `dir`
    pub fn lock_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.lock", self.0))
    }

    /// Captured stdout path inside `dir`
    pub fn stdout_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.out", self.0))
    }

    /// Captured stderr path inside `dir`
    pub fn stderr_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.err", self.0))
    }
}

impl Default for Label {
    fn default() -> Self {
        Self(DEFAULT_LABEL.to_string())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated runtime configuration, built once and shared by every component
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Patterns scanned in order on every pass
    pub patterns: Vec<Pattern>,

    /// Program followed by its arguments
    pub command: Vec<String>,

    /// Local job budget
    pub max_jobs: Option<u64>,

    /// Local wall-clock budget
    pub max_duration: Option<Duration>,

    /// Marker and output file prefix
    pub label: Label,

    /// Diagnostic identity written into claim markers
    pub worker_id: String,

    /// Show header, spinner and summary
    pub show_progress: bool,
}

impl WorkerConfig {
    /// Create a configuration with no limits and the default label
    pub fn new(patterns: Vec<Pattern>, command: Vec<String>) -> Result<Self, ConfigError> {
        if patterns.is_empty() {
            return Err(ConfigError::NoPatterns);
        }
        if command.is_empty() {
            return Err(ConfigError::EmptyCommand);
        }

        Ok(Self {
            patterns,
            command,
            max_jobs: None,
            max_duration: None,
            label: Label::default(),
            worker_id: identity::generate(),
            show_progress: false,
        })
    }

    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let patterns = compile_patterns(args.mode, &args.patterns, &args.basepaths)?;
        let command = tokenize_command(&args.cmd);

        let mut config = Self::new(patterns, command)?;
        config.label = Label::new(&args.label)?;

        if let Some(max_jobs) = args.max_jobs {
            config = config.with_max_jobs(max_jobs)?;
        }
        if let Some(max_hours) = args.max_hours {
            config = config.with_max_hours(max_hours)?;
        }
        if let Some(worker_id) = args.worker_id {
            config.worker_id = worker_id;
        }

        config.show_progress = !args.quiet;

        Ok(config)
    }

    /// Stop after `max_jobs` jobs
    pub fn with_max_jobs(mut self, max_jobs: u64) -> Result<Self, ConfigError> {
        if max_jobs == 0 {
            return Err(ConfigError::InvalidMaxJobs(max_jobs));
        }
        self.max_jobs = Some(max_jobs);
        Ok(self)
    }

    /// Stop starting jobs after `max_hours` of wall-clock time
    pub fn with_max_hours(mut self, max_hours: f64) -> Result<Self, ConfigError> {
        if !max_hours.is_finite() || max_hours <= 0.0 {
            return Err(ConfigError::InvalidMaxHours(max_hours));
        }
        let duration = Duration::try_from_secs_f64(max_hours * SECS_PER_HOUR)
            .map_err(|_| ConfigError::InvalidMaxHours(max_hours))?;
        self.max_duration = Some(duration);
        Ok(self)
    }

    /// Stop starting jobs after `duration`
    pub fn with_max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = Some(duration);
        self
    }

    /// Use `label` for marker and output file names
    pub fn with_label(mut self, label: Label) -> Self {
        self.label = label;
        self
    }

    /// Override the generated worker ID
    pub fn with_worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = worker_id.into();
        self
    }

    /// Command as a single display string
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

/// Split a command string on whitespace into program and arguments
pub fn tokenize_command(cmd: &str) -> Vec<String> {
    cmd.split_whitespace().map(str::to_string).collect()
}

/// Compile raw pattern strings for the configured mode
///
/// In regex mode each pattern pairs with the basepath at the same position,
/// or with `./` when no basepaths are given.
pub fn compile_patterns(
    mode: MatchMode,
    patterns: &[String],
    basepaths: &[PathBuf],
) -> Result<Vec<Pattern>, ConfigError> {
    if patterns.is_empty() {
        return Err(ConfigError::NoPatterns);
    }

    match mode {
        MatchMode::Glob => {
            if !basepaths.is_empty() {
                return Err(ConfigError::BasepathInGlobMode);
            }
            patterns.iter().map(|p| Pattern::glob(p)).collect()
        }
        MatchMode::Regex => {
            if basepaths.is_empty() {
                return patterns
                    .iter()
                    .map(|p| Pattern::regex(DEFAULT_BASEPATH, p))
                    .collect();
            }
            if basepaths.len() != patterns.len() {
                return Err(ConfigError::BasepathMismatch {
                    basepaths: basepaths.len(),
                    patterns: patterns.len(),
                });
            }
            basepaths
                .iter()
                .zip(patterns)
                .map(|(base, p)| Pattern::regex(base.clone(), p))
                .collect()
        }
    }
}
