//! Fuzzy-picker wrapper
//!
//! The picker reads newline-separated candidates on stdin and prints the
//! chosen line on stdout. Its stderr stays on the terminal because that is
//! where fzf draws its interface.

use std::io::Write;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{OutputMode, ProcessRunner, ProcessSpec, StdinMode};
use crate::error::{ProcessError, SessionError};
use crate::session::normalize;

/// Default picker executable
pub const DEFAULT_PICKER: &str = "fzf";

/// One picker invocation with its own input and output buffers
#[derive(Debug, Clone)]
pub struct PickerCommand {
    program: String,
    args: Vec<String>,
    in_buf: Vec<u8>,
    out_buf: Vec<u8>,
}

impl PickerCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            in_buf: Vec::new(),
            out_buf: Vec::new(),
        }
    }

    /// Plain `fzf` with no extra arguments
    pub fn fzf() -> Self {
        Self::new(DEFAULT_PICKER, Vec::new())
    }

    /// Buffer fed to the picker's stdin; fill it before `run`
    pub fn in_buf(&mut self) -> &mut Vec<u8> {
        &mut self.in_buf
    }

    /// What the picker printed; valid after `run`
    pub fn out_buf(&self) -> &[u8] {
        &self.out_buf
    }

    /// Append one candidate per line to the input buffer
    pub fn write_candidates<I, S>(&mut self, candidates: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for candidate in candidates {
            // Writing into a Vec cannot fail
            let _ = writeln!(self.in_buf, "{}", candidate.as_ref());
        }
    }

    pub fn spec(&self) -> ProcessSpec {
        ProcessSpec::new(self.program.clone(), self.args.clone())
            .stdin(StdinMode::Bytes(self.in_buf.clone()))
            .stdout(OutputMode::Capture)
            .stderr(OutputMode::Inherit)
    }

    /// Run the picker and store its stdout in the output buffer
    pub async fn run(
        &mut self,
        runner: &dyn ProcessRunner,
        cancel: &CancellationToken,
    ) -> Result<(), ProcessError> {
        let spec = self.spec();
        debug!(command = %spec, bytes = self.in_buf.len(), "Running picker");

        let output = runner.run(&spec, cancel).await?;
        self.out_buf = output.stdout;
        Ok(())
    }

    /// The selected line, trimmed
    ///
    /// `None` when the picker printed nothing. More than one non-empty line
    /// is rejected so a multi-select never reaches the registry.
    pub fn selection(&self) -> Result<Option<String>, SessionError> {
        let text = String::from_utf8_lossy(&self.out_buf);
        let mut lines = text.lines().map(normalize).filter(|l| !l.is_empty());

        let Some(first) = lines.next() else {
            return Ok(None);
        };

        if lines.next().is_some() {
            return Err(SessionError::AmbiguousSelection(text.trim().to_string()));
        }

        Ok(Some(first.to_string()))
    }
}

impl Default for PickerCommand {
    fn default() -> Self {
        Self::fzf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::{Reply, ScriptedRunner};

    #[test]
    fn test_write_candidates() {
        let mut picker = PickerCommand::fzf();
        picker.write_candidates(["/a", "/b"]);
        assert_eq!(picker.in_buf().as_slice(), b"/a\n/b\n");
    }

    #[test]
    fn test_spec_pipes_stdin_and_stdout_only() {
        let mut picker = PickerCommand::new("fzf", vec!["--reverse".to_string()]);
        picker.write_candidates(["x"]);
        let spec = picker.spec();

        assert_eq!(spec.to_string(), "fzf --reverse");
        assert_eq!(spec.stdin, StdinMode::Bytes(b"x\n".to_vec()));
        assert_eq!(spec.stdout, OutputMode::Capture);
        assert_eq!(spec.stderr, OutputMode::Inherit);
    }

    #[tokio::test]
    async fn test_run_fills_output_buffer() {
        let runner = ScriptedRunner::new().on("fzf", Reply::Stdout("/home/u/app\n".into()));
        let mut picker = PickerCommand::fzf();
        picker.write_candidates(["/home/u/app", "/home/u/lib"]);

        picker.run(&runner, &CancellationToken::new()).await.unwrap();

        assert_eq!(picker.out_buf(), b"/home/u/app\n");
        assert_eq!(picker.selection().unwrap().as_deref(), Some("/home/u/app"));
        assert_eq!(runner.stdin_of("fzf").as_deref(), Some("/home/u/app\n/home/u/lib\n"));
    }

    #[tokio::test]
    async fn test_run_propagates_abort() {
        // fzf exits 130 when the user presses Esc
        let runner = ScriptedRunner::new().on("fzf", Reply::Exit(130));
        let mut picker = PickerCommand::fzf();

        let err = picker
            .run(&runner, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Failed { code: Some(130), .. }));
    }

    #[test]
    fn test_selection_empty_and_ambiguous() {
        let mut picker = PickerCommand::fzf();
        assert_eq!(picker.selection().unwrap(), None);

        picker.out_buf = b"\n  \n".to_vec();
        assert_eq!(picker.selection().unwrap(), None);

        picker.out_buf = b"/a\n/b\n".to_vec();
        assert!(matches!(
            picker.selection(),
            Err(SessionError::AmbiguousSelection(_))
        ));
    }
}
