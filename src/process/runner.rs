//! Child process execution with cancellation
//!
//! `ProcessRunner` is the seam between the wrappers and the operating
//! system: wrappers describe what to run as a `ProcessSpec`, a runner
//! executes it. `SystemRunner` spawns real processes through
//! `tokio::process`; tests substitute a scripted runner.

use std::fmt;
use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::error::ProcessError;

/// Where the child's standard input comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdinMode {
    /// The controlling terminal
    Inherit,
    Null,
    /// Bytes written to a pipe, which is then closed
    Bytes(Vec<u8>),
}

/// Where the child's stdout/stderr goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// The controlling terminal
    Inherit,
    /// Collected into `ProcessOutput`
    Capture,
    Discard,
}

impl OutputMode {
    fn stdio(self) -> Stdio {
        match self {
            Self::Inherit => Stdio::inherit(),
            Self::Capture => Stdio::piped(),
            Self::Discard => Stdio::null(),
        }
    }
}

/// Description of one child process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: StdinMode,
    pub stdout: OutputMode,
    pub stderr: OutputMode,
}

impl ProcessSpec {
    /// A spec wired entirely to the controlling terminal
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            stdin: StdinMode::Inherit,
            stdout: OutputMode::Inherit,
            stderr: OutputMode::Inherit,
        }
    }

    pub fn stdin(mut self, mode: StdinMode) -> Self {
        self.stdin = mode;
        self
    }

    pub fn stdout(mut self, mode: OutputMode) -> Self {
        self.stdout = mode;
        self
    }

    pub fn stderr(mut self, mode: OutputMode) -> Self {
        self.stderr = mode;
        self
    }
}

impl fmt::Display for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured output of a finished process
///
/// Streams that were not captured are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Runs a process to completion
///
/// Implementations must return `ProcessError::Canceled` when `cancel` fires
/// before the process exits, and must not leave the child running.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        spec: &ProcessSpec,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, ProcessError>;
}

/// Runner backed by real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    #[instrument(skip_all, fields(command = %spec))]
    async fn run(
        &self,
        spec: &ProcessSpec,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, ProcessError> {
        if cancel.is_cancelled() {
            return Err(ProcessError::Canceled {
                command: spec.to_string(),
            });
        }

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdout(spec.stdout.stdio())
            .stderr(spec.stderr.stdio())
            .kill_on_drop(true);

        let input = match &spec.stdin {
            StdinMode::Inherit => {
                cmd.stdin(Stdio::inherit());
                None
            }
            StdinMode::Null => {
                cmd.stdin(Stdio::null());
                None
            }
            StdinMode::Bytes(bytes) => {
                cmd.stdin(Stdio::piped());
                Some(bytes.clone())
            }
        };

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProcessError::NotFound {
                program: spec.program.clone(),
            },
            _ => ProcessError::Spawn {
                program: spec.program.clone(),
                source: e,
            },
        })?;

        debug!(pid = ?child.id(), "Spawned child process");

        let stdin = child.stdin.take();
        let finished = async move {
            if let (Some(mut pipe), Some(bytes)) = (stdin, input) {
                // The child may exit without reading all of its input
                match pipe.write_all(&bytes).await {
                    Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(e),
                    _ => {}
                }
                drop(pipe);
            }
            child.wait_with_output().await
        };

        // Dropping `finished` drops the child, and kill_on_drop terminates it
        let output = tokio::select! {
            result = finished => result.map_err(|e| ProcessError::Spawn {
                program: spec.program.clone(),
                source: e,
            })?,
            _ = cancel.cancelled() => {
                warn!("Canceled, killing child process");
                return Err(ProcessError::Canceled {
                    command: spec.to_string(),
                });
            }
        };

        if !output.status.success() {
            return Err(ProcessError::Failed {
                command: spec.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(ProcessOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn sh(script: &str) -> ProcessSpec {
        ProcessSpec::new("sh", ["-c", script])
            .stdin(StdinMode::Null)
            .stdout(OutputMode::Capture)
            .stderr(OutputMode::Capture)
    }

    #[test]
    fn test_spec_display() {
        let spec = ProcessSpec::new("tmux", ["attach", "-t", "app"]);
        assert_eq!(spec.to_string(), "tmux attach -t app");
        assert_eq!(spec.stdin, StdinMode::Inherit);
        assert_eq!(spec.stdout, OutputMode::Inherit);
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let out = SystemRunner
            .run(&sh("printf 'a\\nb\\n'"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out.stdout, b"a\nb\n");
    }

    #[tokio::test]
    async fn test_feeds_stdin() {
        let spec = ProcessSpec::new("cat", Vec::<String>::new())
            .stdin(StdinMode::Bytes(b"one\ntwo\n".to_vec()))
            .stdout(OutputMode::Capture);

        let out = SystemRunner
            .run(&spec, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out.stdout, b"one\ntwo\n");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failed() {
        let err = SystemRunner
            .run(&sh("echo boom >&2; exit 3"), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            ProcessError::Failed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_not_found() {
        let spec = ProcessSpec::new("definitely-not-a-real-program-7f3a", ["x"]);
        let err = SystemRunner
            .run(&spec, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancel_before_run_does_not_spawn() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let spec = ProcessSpec::new("definitely-not-a-real-program-7f3a", ["x"]);
        let err = SystemRunner.run(&spec, &cancel).await.unwrap_err();
        assert!(err.is_canceled());
    }

    #[tokio::test]
    async fn test_cancel_kills_running_child() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = SystemRunner.run(&sh("sleep 30"), &cancel).await.unwrap_err();

        assert!(err.is_canceled());
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
