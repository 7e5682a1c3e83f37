//! Session handler - the user-facing flows
//!
//! Each flow is one picker round-trip followed by a few sequential tmux
//! calls. Nothing here is retried: a failed tmux or picker step surfaces
//! straight to the CLI.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::{Result, SessionError};
use crate::process::{PickerCommand, ProcessRunner};
use crate::session::{SessionRegistry, normalize};
use crate::tmux::{EnterAction, Tmux};

/// Composes the registry, tmux and the picker into the CLI use-cases
pub struct SessionHandler {
    registry: SessionRegistry,
    tmux: Tmux,
    picker: PickerCommand,
    runner: Arc<dyn ProcessRunner>,
    cancel: CancellationToken,
    projects: Vec<PathBuf>,
    roots: Vec<PathBuf>,
}

impl SessionHandler {
    pub fn new(
        registry: SessionRegistry,
        tmux: Tmux,
        picker: PickerCommand,
        runner: Arc<dyn ProcessRunner>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            tmux,
            picker,
            runner,
            cancel,
            projects: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Build a handler from configuration, seeding the registry from tmux
    ///
    /// A tmux server with no sessions yields an empty registry.
    pub async fn from_config(
        config: &Config,
        runner: Arc<dyn ProcessRunner>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let tmux = Tmux::new(runner.clone(), cancel.clone())
            .with_program(config.tmux.clone())
            .with_session_env(config.session_env.clone());

        let existing = tmux.gather_existing_sessions_or_empty().await?;
        let registry = SessionRegistry::new(config.transformer()?)
            .with_policy(config.naming)
            .with_sessions(existing);

        let picker = PickerCommand::new(config.picker.clone(), config.picker_args.clone());

        Ok(Self::new(registry, tmux, picker, runner, cancel))
    }

    /// Candidate project directories for `create_or_attach_from_project_list`
    pub fn with_projects(mut self, projects: Vec<PathBuf>) -> Self {
        self.projects = projects;
        self
    }

    /// Parent directories offered by `create_project_session`
    pub fn with_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.roots = roots;
        self
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Pick a project directory and enter its session, creating it if needed
    #[instrument(skip(self))]
    pub async fn create_or_attach_from_project_list(&mut self) -> Result<EnterAction> {
        let candidates: Vec<String> = self
            .projects
            .iter()
            .map(|p| p.display().to_string())
            .collect();

        let selected = self.pick(&candidates).await?;
        let session = self.registry.get_or_create(&selected).clone();
        info!("Selected project {}", session);

        self.tmux.enter(&session).await
    }

    /// Pick a running session by name and attach or switch to it
    #[instrument(skip(self))]
    pub async fn attach_to_existing_session(&mut self) -> Result<EnterAction> {
        let names = self.existing_session_names().await?;
        let selected = self.pick(&names).await?;

        let session = self
            .registry
            .find_by_name(&selected)
            .cloned()
            .ok_or(SessionError::NotFound(selected))?;

        self.tmux.enter_existing(&session).await
    }

    /// Pick a running session by name and kill it
    #[instrument(skip(self))]
    pub async fn delete_session(&mut self) -> Result<()> {
        let names = self.existing_session_names().await?;
        let selected = self.pick(&names).await?;

        self.tmux.delete(self.registry.find_by_name(&selected)).await
    }

    /// Pick a root, create `<root>/<name>` and enter a session for it
    #[instrument(skip(self))]
    pub async fn create_project_session(&mut self, name: &str) -> Result<EnterAction> {
        let name = project_name(name)?;
        let candidates: Vec<String> = self
            .roots
            .iter()
            .map(|p| p.display().to_string())
            .collect();

        let parent = self.pick(&candidates).await?;
        let project = PathBuf::from(parent).join(name);

        if tokio::fs::try_exists(&project).await? {
            return Err(SessionError::ProjectExists(project).into());
        }
        tokio::fs::create_dir_all(&project).await?;
        info!("Created project directory {}", project.display());

        let session = self
            .registry
            .get_or_create(&project.to_string_lossy())
            .clone();
        self.tmux.enter(&session).await
    }

    /// Names of the sessions tmux currently has, sorted
    async fn existing_session_names(&mut self) -> Result<Vec<String>> {
        let existing = self.tmux.gather_existing_sessions_or_empty().await?;
        if existing.is_empty() {
            return Err(SessionError::NoSessions.into());
        }

        let mut names: Vec<String> = existing.iter().map(|s| s.name().to_string()).collect();
        names.sort();

        // Sessions started elsewhere since this handler was built
        self.registry.merge(existing);

        Ok(names)
    }

    async fn pick(&self, candidates: &[String]) -> Result<String> {
        let mut picker = self.picker.clone();
        picker.write_candidates(candidates);
        picker.run(self.runner.as_ref(), &self.cancel).await?;

        picker
            .selection()?
            .ok_or_else(|| SessionError::NoSelection.into())
    }
}

/// The project name as a path that stays below whichever root is picked
fn project_name(raw: &str) -> Result<&Path> {
    let name = Path::new(normalize(raw));
    let mut components = name.components().peekable();

    let contained = components.peek().is_some()
        && components.all(|c| matches!(c, Component::Normal(_)));
    if !contained {
        return Err(SessionError::InvalidProjectName(raw.to_string()).into());
    }
    Ok(name)
}
