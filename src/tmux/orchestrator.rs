//! tmux façade
//!
//! Turns `Session` values into tmux invocations and decides between
//! attach, switch and create based on whether we are already inside tmux
//! and whether the target session exists:
//!
//! | inside tmux | session exists | action                          |
//! |-------------|----------------|---------------------------------|
//! | no          | no             | `new-session -s`, attached      |
//! | no          | yes            | `attach -t`                     |
//! | yes         | no             | `new-session -ds`, then switch  |
//! | yes         | yes            | `switch-client -t`              |

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::{LIST_FORMAT, parse_session_list};
use crate::error::{Error, ProcessError, Result, TmuxError};
use crate::process::{DEFAULT_TMUX, ProcessRunner, TmuxCommand};
use crate::session::Session;

/// Environment variable tmux sets inside a session
pub const DEFAULT_SESSION_ENV: &str = "TMUX";

/// What `enter` ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterAction {
    CreatedAndAttached,
    Attached,
    CreatedAndSwitched,
    Switched,
}

impl fmt::Display for EnterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreatedAndAttached => write!(f, "created and attached"),
            Self::Attached => write!(f, "attached"),
            Self::CreatedAndSwitched => write!(f, "created and switched"),
            Self::Switched => write!(f, "switched"),
        }
    }
}

/// Builds and runs tmux commands for sessions
#[derive(Clone)]
pub struct Tmux {
    runner: Arc<dyn ProcessRunner>,
    cancel: CancellationToken,
    program: String,
    session_env: String,
    in_session: Option<bool>,
}

impl Tmux {
    pub fn new(runner: Arc<dyn ProcessRunner>, cancel: CancellationToken) -> Self {
        Self {
            runner,
            cancel,
            program: DEFAULT_TMUX.to_string(),
            session_env: DEFAULT_SESSION_ENV.to_string(),
            in_session: None,
        }
    }

    /// Use a different tmux executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Read the inside-tmux signal from a different environment variable
    pub fn with_session_env(mut self, name: impl Into<String>) -> Self {
        self.session_env = name.into();
        self
    }

    /// Fix the inside-tmux answer instead of reading the environment
    pub fn with_in_session(mut self, in_session: bool) -> Self {
        self.in_session = Some(in_session);
        self
    }

    /// Whether this process runs inside a tmux session
    pub fn is_in_session(&self) -> bool {
        self.in_session.unwrap_or_else(|| {
            std::env::var_os(&self.session_env).is_some_and(|v| !v.is_empty())
        })
    }

    /// Sessions currently known to the tmux server
    ///
    /// A failing `list-sessions` (no server, no sessions) is reported as
    /// `TmuxError::Query` so callers can treat it as an empty list.
    #[instrument(skip(self))]
    pub async fn gather_existing_sessions(&self) -> Result<Vec<Session>> {
        let mut cmd = self.command(&["list-sessions", "-F", LIST_FORMAT]).with_output_buffer();

        match cmd.run(self.runner.as_ref(), &self.cancel).await {
            Ok(()) => {}
            Err(e @ ProcessError::Failed { .. }) => return Err(TmuxError::Query(e).into()),
            Err(e) => return Err(e.into()),
        }

        let sessions = parse_session_list(&cmd.output().unwrap_or_default())?;
        debug!(count = sessions.len(), "Gathered existing sessions");
        Ok(sessions)
    }

    /// Like `gather_existing_sessions`, with a query failure meaning "none"
    pub async fn gather_existing_sessions_or_empty(&self) -> Result<Vec<Session>> {
        match self.gather_existing_sessions().await {
            Err(Error::Tmux(TmuxError::Query(e))) => {
                debug!("No tmux sessions available: {}", e);
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Create a session and attach the terminal to it
    #[instrument(skip_all, fields(session = %session.name()))]
    pub async fn create_and_attach(&self, session: &Session) -> Result<()> {
        let path = session.project_path().to_string_lossy();
        self.exec(&["new-session", "-s", session.name(), "-c", &*path])
            .await
    }

    #[instrument(skip_all, fields(session = %session.name()))]
    pub async fn attach(&self, session: &Session) -> Result<()> {
        self.exec(&["attach", "-t", session.name()]).await
    }

    #[instrument(skip_all, fields(session = %session.name()))]
    pub async fn switch_client(&self, session: &Session) -> Result<()> {
        self.exec(&["switch-client", "-t", session.name()]).await
    }

    /// Create a detached session, then switch the current client to it
    ///
    /// Nothing is switched if the create step fails or is canceled.
    #[instrument(skip_all, fields(session = %session.name()))]
    pub async fn switch_to_new_client(&self, session: &Session) -> Result<()> {
        let path = session.project_path().to_string_lossy();
        self.exec(&["new-session", "-ds", session.name(), "-c", &*path])
            .await?;
        self.switch_client(session).await
    }

    /// Kill the target session
    pub async fn delete(&self, target: Option<&Session>) -> Result<()> {
        let session = target.ok_or(TmuxError::MissingTarget {
            operation: "kill-session",
        })?;

        info!("Killing tmux session '{}'", session.name());
        self.exec(&["kill-session", "-t", session.name()]).await
    }

    /// Whether tmux has a session with the target's name
    ///
    /// A missing target or a nonzero exit means no; a missing executable or
    /// cancellation is an error.
    pub async fn has_session(&self, target: Option<&Session>) -> Result<bool> {
        let Some(session) = target else {
            return Ok(false);
        };

        let mut cmd = self
            .command(&["has-session", "-t", session.name()])
            .with_output_buffer();

        match cmd.run(self.runner.as_ref(), &self.cancel).await {
            Ok(()) => Ok(true),
            Err(ProcessError::Failed { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the user into `session`, creating it if needed
    #[instrument(skip_all, fields(session = %session.name()))]
    pub async fn enter(&self, session: &Session) -> Result<EnterAction> {
        let in_session = self.is_in_session();
        let exists = self.has_session(Some(session)).await?;
        debug!(in_session, exists, "Choosing how to enter session");

        let action = match (in_session, exists) {
            (false, false) => {
                self.create_and_attach(session).await?;
                EnterAction::CreatedAndAttached
            }
            (false, true) => {
                self.attach(session).await?;
                EnterAction::Attached
            }
            (true, false) => {
                self.switch_to_new_client(session).await?;
                EnterAction::CreatedAndSwitched
            }
            (true, true) => {
                self.switch_client(session).await?;
                EnterAction::Switched
            }
        };

        info!("Session '{}' {}", session.name(), action);
        Ok(action)
    }

    /// Attach or switch to a session that is known to exist
    #[instrument(skip_all, fields(session = %session.name()))]
    pub async fn enter_existing(&self, session: &Session) -> Result<EnterAction> {
        let action = if self.is_in_session() {
            self.switch_client(session).await?;
            EnterAction::Switched
        } else {
            self.attach(session).await?;
            EnterAction::Attached
        };

        info!("Session '{}' {}", session.name(), action);
        Ok(action)
    }

    fn command(&self, args: &[&str]) -> TmuxCommand {
        TmuxCommand::new(self.program.clone(), args.iter().copied())
    }

    async fn exec(&self, args: &[&str]) -> Result<()> {
        let mut cmd = self.command(args);
        cmd.run(self.runner.as_ref(), &self.cancel).await?;
        Ok(())
    }
}

impl fmt::Debug for Tmux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tmux")
            .field("program", &self.program)
            .field("session_env", &self.session_env)
            .field("in_session", &self.in_session)
            .finish_non_exhaustive()
    }
}
