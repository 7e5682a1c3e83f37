//! Scripted `ProcessRunner` for unit tests

use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{ProcessOutput, ProcessRunner, ProcessSpec, StdinMode};
use crate::error::ProcessError;

/// Canned response for commands matching a prefix
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Stdout(String),
    Exit(i32),
    NotFound,
    /// Fire the cancellation token, as Ctrl-C would mid-run
    Cancel,
}

/// Records every spec it is asked to run and answers from a script
///
/// The first entry whose prefix matches the rendered command line wins;
/// unmatched commands succeed with empty output.
#[derive(Debug, Default)]
pub(crate) struct ScriptedRunner {
    script: Vec<(String, Reply)>,
    calls: Mutex<Vec<ProcessSpec>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(mut self, prefix: &str, reply: Reply) -> Self {
        self.script.push((prefix.to_string(), reply));
        self
    }

    /// Rendered command lines, in call order
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Stdin bytes handed to the first call matching `prefix`
    pub(crate) fn stdin_of(&self, prefix: &str) -> Option<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|spec| spec.to_string().starts_with(prefix))
            .and_then(|spec| match &spec.stdin {
                StdinMode::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(
        &self,
        spec: &ProcessSpec,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, ProcessError> {
        let command = spec.to_string();
        if cancel.is_cancelled() {
            return Err(ProcessError::Canceled { command });
        }

        self.calls.lock().unwrap().push(spec.clone());

        let reply = self
            .script
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or(Reply::Stdout(String::new()));

        match reply {
            Reply::Stdout(out) => Ok(ProcessOutput {
                stdout: out.into_bytes(),
                stderr: Vec::new(),
            }),
            Reply::Exit(code) => Err(ProcessError::Failed {
                command,
                code: Some(code),
                stderr: String::new(),
            }),
            Reply::NotFound => Err(ProcessError::NotFound {
                program: spec.program.clone(),
            }),
            Reply::Cancel => {
                cancel.cancel();
                Err(ProcessError::Canceled { command })
            }
        }
    }
}
