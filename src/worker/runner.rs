//! Job execution inside a claimed directory
//!
//! The command runs with its working directory set to the job directory
//! through [`Command::current_dir`]. The worker's own working directory is
//! never changed, so there is nothing to restore on any exit path.

use crate::config::{Label, WorkerConfig};
use crate::error::JobError;

use std::fs::{self, File};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// What happened when a job ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// Exit code, `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Whether the process exited with status zero
    pub success: bool,
    /// Wall-clock time of the job
    pub duration: Duration,
    /// Size of `<label>.out` after the job
    pub stdout_bytes: u64,
    /// Size of `<label>.err` after the job
    pub stderr_bytes: u64,
}

/// Runs a job in a directory the caller has already claimed
pub trait JobExecutor {
    fn execute(&self, dir: &Path) -> Result<JobOutcome, JobError>;
}

/// Runs the configured external command
#[derive(Debug, Clone)]
pub struct CommandRunner {
    command: Vec<String>,
    label: Label,
}

impl CommandRunner {
    /// Create a runner for `command` writing output under `label`
    pub fn new(command: Vec<String>, label: Label) -> Self {
        Self { command, label }
    }

    /// Create a runner from the worker configuration
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(config.command.clone(), config.label.clone())
    }
}

impl JobExecutor for CommandRunner {
    fn execute(&self, dir: &Path) -> Result<JobOutcome, JobError> {
        run_job(dir, &self.command, &self.label)
    }
}

/// Run `command` in `dir`, capturing output to `<label>.out` and `<label>.err`
///
/// Blocks until the process exits. No timeout is applied. A non-zero exit
/// is reported in the outcome, not as an error.
pub fn run_job(dir: &Path, command: &[String], label: &Label) -> Result<JobOutcome, JobError> {
    let Some((program, args)) = command.split_first() else {
        return Err(JobError::Spawn {
            program: String::new(),
            dir: dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        });
    };

    let stdout_path = label.stdout_path(dir);
    let stderr_path = label.stderr_path(dir);

    let stdout = File::create(&stdout_path).map_err(|e| JobError::Output {
        path: stdout_path.clone(),
        source: e,
    })?;
    let stderr = File::create(&stderr_path).map_err(|e| JobError::Output {
        path: stderr_path.clone(),
        source: e,
    })?;

    debug!("Launching {:?} in {}", command, dir.display());
    let start = Instant::now();

    let mut child = match Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            // Leave the reason next to the marker for whoever finds this directory
            if let Err(write_err) =
                fs::write(&stderr_path, format!("Failed to launch '{}': {}\n", program, e))
            {
                warn!(
                    "Could not record launch failure in {}: {}",
                    stderr_path.display(),
                    write_err
                );
            }
            return Err(JobError::Spawn {
                program: program.clone(),
                dir: dir.to_path_buf(),
                source: e,
            });
        }
    };

    let status = child.wait().map_err(|e| JobError::Wait {
        dir: dir.to_path_buf(),
        source: e,
    })?;

    Ok(JobOutcome {
        exit_code: status.code(),
        success: status.success(),
        duration: start.elapsed(),
        stdout_bytes: file_len(&stdout_path),
        stderr_bytes: file_len(&stderr_path),
    })
}

fn file_len(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_captures_stdout_and_stderr() {
        let dir = tempdir().unwrap();
        let label = Label::default();

        let outcome = run_job(dir.path(), &sh("printf ok; printf oops >&2"), &label).unwrap();

        assert_eq!(outcome.exit_code, Some(0));
        assert!(outcome.success);
        assert_eq!(fs::read_to_string(dir.path().join("worker.out")).unwrap(), "ok");
        assert_eq!(fs::read_to_string(dir.path().join("worker.err")).unwrap(), "oops");
        assert_eq!(outcome.stdout_bytes, 2);
        assert_eq!(outcome.stderr_bytes, 4);
    }

    #[test]
    fn test_runs_inside_job_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("input.txt"), "from job dir").unwrap();
        let cwd_before = std::env::current_dir().unwrap();

        run_job(dir.path(), &sh("cat input.txt"), &Label::default()).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("worker.out")).unwrap(),
            "from job dir"
        );
        assert_eq!(std::env::current_dir().unwrap(), cwd_before);
    }

    #[test]
    fn test_nonzero_exit_is_not_an_error() {
        let dir = tempdir().unwrap();
        let outcome = run_job(dir.path(), &sh("exit 3"), &Label::default()).unwrap();

        assert_eq!(outcome.exit_code, Some(3));
        assert!(!outcome.success);
    }

    #[test]
    fn test_output_files_are_truncated() {
        let dir = tempdir().unwrap();
        let label = Label::new("fit").unwrap();
        fs::write(dir.path().join("fit.out"), "stale output from an earlier run").unwrap();

        run_job(dir.path(), &sh("printf new"), &label).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("fit.out")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dir.path().join("fit.err")).unwrap(), "");
    }

    #[test]
    fn test_launch_failure() {
        let dir = tempdir().unwrap();
        let cwd_before = std::env::current_dir().unwrap();
        let command = vec!["dirjob-test-no-such-program".to_string()];

        let result = run_job(dir.path(), &command, &Label::default());

        assert!(matches!(result, Err(JobError::Spawn { .. })));
        let err_text = fs::read_to_string(dir.path().join("worker.err")).unwrap();
        assert!(err_text.contains("dirjob-test-no-such-program"));
        assert_eq!(std::env::current_dir().unwrap(), cwd_before);
    }

    #[test]
    fn test_command_runner_uses_config_label() {
        let dir = tempdir().unwrap();
        let runner = CommandRunner::new(sh("echo hi"), Label::new("post").unwrap());

        let outcome = runner.execute(dir.path()).unwrap();

        assert!(outcome.success);
        assert_eq!(fs::read_to_string(dir.path().join("post.out")).unwrap(), "hi\n");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_launch_failure_when_note_cannot_be_written() {
        let dir = tempdir().unwrap();
        std::os::unix::fs::symlink("/dev/full", dir.path().join("worker.err")).unwrap();
        let command = vec!["dirjob-test-no-such-program".to_string()];

        let result = run_job(dir.path(), &command, &Label::default());

        assert!(matches!(result, Err(JobError::Spawn { .. })));
    }
}
