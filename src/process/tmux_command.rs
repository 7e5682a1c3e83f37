//! tmux command wrapper
//!
//! Interactive subcommands (`attach`, `switch-client`, `new-session`) need a
//! real terminal, so by default the child inherits stdin/stdout/stderr.
//! Query subcommands read tmux's answer from an output buffer, which has to
//! be wired with `with_output_buffer` before `run`.

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{OutputMode, ProcessRunner, ProcessSpec, StdinMode};
use crate::error::ProcessError;

/// Default tmux executable
pub const DEFAULT_TMUX: &str = "tmux";

/// Subcommands whose result is read from stdout or the exit code
pub const QUERY_SUBCOMMANDS: &[&str] = &["list-sessions", "has-session"];

/// One tmux invocation
#[derive(Debug, Clone)]
pub struct TmuxCommand {
    program: String,
    args: Vec<String>,
    out_buf: Option<Vec<u8>>,
}

impl TmuxCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            out_buf: None,
        }
    }

    /// Capture stdout and stderr instead of using the terminal
    pub fn with_output_buffer(mut self) -> Self {
        self.out_buf = Some(Vec::new());
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    pub fn is_query(&self) -> bool {
        self.subcommand()
            .is_some_and(|sub| QUERY_SUBCOMMANDS.contains(&sub))
    }

    /// Captured stdout, if an output buffer is wired
    pub fn out_buf(&self) -> Option<&[u8]> {
        self.out_buf.as_deref()
    }

    /// Captured stdout as text
    pub fn output(&self) -> Option<String> {
        self.out_buf
            .as_deref()
            .map(|buf| String::from_utf8_lossy(buf).into_owned())
    }

    pub fn spec(&self) -> ProcessSpec {
        let spec = ProcessSpec::new(self.program.clone(), self.args.clone());
        if self.out_buf.is_some() {
            spec.stdin(StdinMode::Null)
                .stdout(OutputMode::Capture)
                .stderr(OutputMode::Capture)
        } else {
            spec
        }
    }

    pub async fn run(
        &mut self,
        runner: &dyn ProcessRunner,
        cancel: &CancellationToken,
    ) -> Result<(), ProcessError> {
        if self.is_query() && self.out_buf.is_none() {
            return Err(ProcessError::NoOutputBufferConfigured {
                command: self.to_string(),
            });
        }

        let spec = self.spec();
        debug!(command = %spec, "Running tmux");

        let output = runner.run(&spec, cancel).await?;
        if let Some(buf) = self.out_buf.as_mut() {
            *buf = output.stdout;
        }
        Ok(())
    }
}

impl fmt::Display for TmuxCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::{Reply, ScriptedRunner};

    #[test]
    fn test_interactive_command_uses_terminal() {
        let cmd = TmuxCommand::new(DEFAULT_TMUX, ["attach", "-t", "app"]);
        let spec = cmd.spec();

        assert!(!cmd.is_query());
        assert_eq!(spec.stdin, StdinMode::Inherit);
        assert_eq!(spec.stdout, OutputMode::Inherit);
        assert_eq!(spec.stderr, OutputMode::Inherit);
        assert!(cmd.output().is_none());
    }

    #[test]
    fn test_buffered_command_captures() {
        let cmd = TmuxCommand::new(DEFAULT_TMUX, ["has-session", "-t", "app"]).with_output_buffer();
        let spec = cmd.spec();

        assert!(cmd.is_query());
        assert_eq!(spec.stdin, StdinMode::Null);
        assert_eq!(spec.stdout, OutputMode::Capture);
        assert_eq!(spec.stderr, OutputMode::Capture);
    }

    #[tokio::test]
    async fn test_query_without_buffer_is_rejected_before_spawn() {
        let runner = ScriptedRunner::new();
        let mut cmd = TmuxCommand::new(DEFAULT_TMUX, ["list-sessions"]);

        let err = cmd
            .run(&runner, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessError::NoOutputBufferConfigured { .. }));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_query_fills_buffer() {
        let runner =
            ScriptedRunner::new().on("tmux list-sessions", Reply::Stdout("a:/a\n".into()));
        let mut cmd = TmuxCommand::new(DEFAULT_TMUX, ["list-sessions"]).with_output_buffer();

        cmd.run(&runner, &CancellationToken::new()).await.unwrap();

        assert_eq!(cmd.out_buf(), Some(b"a:/a\n".as_slice()));
        assert_eq!(cmd.output().as_deref(), Some("a:/a\n"));
    }

    #[test]
    fn test_display() {
        let cmd = TmuxCommand::new("tmux", ["new-session", "-ds", "app", "-c", "/home/u/app"]);
        assert_eq!(cmd.to_string(), "tmux new-session -ds app -c /home/u/app");
        assert_eq!(cmd.subcommand(), Some("new-session"));
    }
}
