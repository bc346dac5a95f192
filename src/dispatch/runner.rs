//! External pipeline invocation.
//!
//! The analysis pipeline is an out-of-process executable. It receives the
//! interchange artifact paths as trailing arguments in canonical category
//! order; exit code zero is success. Stdout/stderr are captured for
//! diagnostics only and never parsed for data. The run is bounded by a
//! timeout; on expiry the child is killed and the dispatch is treated as a
//! failure.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// How much stderr to keep in a failure detail.
const STDERR_TAIL_MAX_BYTES: usize = 2048;

/// Dispatch failures. All of these surface only to the triggering caller;
/// the cycle resets regardless.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to write interchange artifact {}: {}", .path.display(), .source)]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch pipeline '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("pipeline exited with {status}: {stderr}")]
    NonZeroExit { status: String, stderr: String },

    #[error("pipeline timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to collect pipeline output: {0}")]
    Wait(#[from] std::io::Error),
}

/// Captured output of a successful run.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub stdout: String,
}

/// Seam over the external processor, so the coordinator can be exercised
/// without spawning real child processes.
#[async_trait]
pub trait PipelineRunner: Send + Sync {
    /// Run the pipeline once over the given artifacts. Success is a zero
    /// exit status; everything else is a [`DispatchError`].
    async fn run(&self, artifacts: &[PathBuf]) -> Result<RunOutput, DispatchError>;
}

/// The production runner: spawns the configured executable.
pub struct ProcessRunner {
    program: String,
    base_args: Vec<String>,
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>, base_args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            base_args,
            timeout,
        }
    }
}

#[async_trait]
impl PipelineRunner for ProcessRunner {
    async fn run(&self, artifacts: &[PathBuf]) -> Result<RunOutput, DispatchError> {
        debug!(
            program = %self.program,
            artifacts = artifacts.len(),
            timeout_secs = self.timeout.as_secs(),
            "Launching analysis pipeline"
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .args(artifacts)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| DispatchError::Launch {
            program: self.program.clone(),
            source,
        })?;

        // On timeout the future is dropped and kill_on_drop reaps the child.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    program = %self.program,
                    timeout_secs = self.timeout.as_secs(),
                    "Pipeline run timed out — child killed"
                );
                return Err(DispatchError::Timeout(self.timeout));
            }
        };

        if !output.status.success() {
            return Err(DispatchError::NonZeroExit {
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        info!(program = %self.program, "Pipeline run succeeded");
        Ok(RunOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Last `STDERR_TAIL_MAX_BYTES` of stderr, lossily decoded.
fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL_MAX_BYTES);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}

/// Shell-based runner factory used by tests: runs `sh -c <script>` with the
/// artifact paths as `$1..$3`.
#[cfg(test)]
pub fn sh_runner(script: &str, timeout: Duration) -> ProcessRunner {
    ProcessRunner::new(
        "sh",
        vec!["-c".to_string(), script.to_string(), "sh".to_string()],
        timeout,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn paths(dir: &Path) -> Vec<PathBuf> {
        vec![dir.join("a.csv"), dir.join("b.csv"), dir.join("c.csv")]
    }

    #[tokio::test]
    async fn test_zero_exit_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let runner = sh_runner("exit 0", Duration::from_secs(5));
        let result = runner.run(&paths(dir.path())).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_stdout_is_captured() {
        let dir = tempfile::tempdir().unwrap();
        let runner = sh_runner("echo processed", Duration::from_secs(5));
        let output = runner.run(&paths(dir.path())).await.unwrap();
        assert_eq!(output.stdout.trim(), "processed");
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let runner = sh_runner("echo boom >&2; exit 3", Duration::from_secs(5));
        match runner.run(&paths(dir.path())).await {
            Err(DispatchError::NonZeroExit { stderr, .. }) => {
                assert!(stderr.contains("boom"));
            }
            other => panic!("expected NonZeroExit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new(
            "/nonexistent/pipeline-binary",
            Vec::new(),
            Duration::from_secs(5),
        );
        match runner.run(&paths(dir.path())).await {
            Err(DispatchError::Launch { .. }) => {}
            other => panic!("expected Launch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_pipeline_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let runner = sh_runner("sleep 10", Duration::from_millis(100));
        match runner.run(&paths(dir.path())).await {
            Err(DispatchError::Timeout(_)) => {}
            other => panic!("expected Timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_artifacts_arrive_as_positional_args() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("seen.txt");
        let script = format!("printf '%s\\n' \"$1\" \"$2\" \"$3\" > {}", marker.display());
        let runner = sh_runner(&script, Duration::from_secs(5));
        runner.run(&paths(dir.path())).await.unwrap();

        let seen = std::fs::read_to_string(&marker).unwrap();
        let lines: Vec<&str> = seen.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("a.csv"));
        assert!(lines[2].ends_with("c.csv"));
    }
}
