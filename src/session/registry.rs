//! Session registry - path-keyed create-or-get store
//!
//! Rebuilt on every run from the live tmux session list, then extended
//! lazily as the user picks projects.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Session, Transformer, normalize};

/// Which part of the project path becomes the tmux session name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamePolicy {
    /// Leaf directory name (`/home/u/my.app` -> `my_app`)
    #[default]
    Basename,
    /// Whole path (`/home/u/my.app` -> `/home/u/my_app`)
    FullPath,
}

/// In-memory map from project path to session
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions: HashMap<PathBuf, Session>,
    transformer: Transformer,
    policy: NamePolicy,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new(transformer: Transformer) -> Self {
        Self {
            sessions: HashMap::new(),
            transformer,
            policy: NamePolicy::default(),
        }
    }

    /// Set the naming policy for newly created sessions
    pub fn with_policy(mut self, policy: NamePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Seed with sessions that already exist in tmux
    ///
    /// Seeded sessions keep the name tmux reported for them. A later entry
    /// for the same path replaces an earlier one.
    pub fn with_sessions(mut self, sessions: impl IntoIterator<Item = Session>) -> Self {
        self.merge(sessions);
        self
    }

    /// Add sessions reported by tmux, replacing entries for the same path
    pub fn merge(&mut self, sessions: impl IntoIterator<Item = Session>) {
        for session in sessions {
            self.sessions
                .insert(session.project_path().to_path_buf(), session);
        }
    }

    pub fn transformer(&self) -> &Transformer {
        &self.transformer
    }

    /// Return the session for `raw_path`, creating it on first reference
    pub fn get_or_create(&mut self, raw_path: &str) -> &Session {
        let path = PathBuf::from(normalize(raw_path));

        if !self.sessions.contains_key(&path) {
            let name = self.derive_name(&path);
            debug!(name = %name, path = %path.display(), "Registering session");
            self.sessions
                .insert(path.clone(), Session::new(name, path.clone()));
        }

        &self.sessions[&path]
    }

    /// Look up a session by path without inserting
    pub fn get(&self, raw_path: &str) -> Option<&Session> {
        self.sessions.get(Path::new(normalize(raw_path)))
    }

    /// Look up a session by its tmux name
    pub fn find_by_name(&self, raw_name: &str) -> Option<&Session> {
        let name = normalize(raw_name);
        self.sessions.values().find(|s| s.name() == name)
    }

    /// All known sessions, in no particular order
    pub fn list(&self) -> Vec<&Session> {
        self.sessions.values().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn derive_name(&self, path: &Path) -> String {
        let full = self.transformer.transform(&path.to_string_lossy());

        if self.policy == NamePolicy::FullPath {
            return full;
        }

        let Some(leaf) = path.file_name() else {
            return full;
        };

        let name = self.transformer.transform(&leaf.to_string_lossy());
        if self.name_taken(&name, path) {
            debug!(name = %name, path = %path.display(), "Leaf name taken, using full path");
            full
        } else {
            name
        }
    }

    fn name_taken(&self, name: &str, path: &Path) -> bool {
        self.sessions
            .values()
            .any(|s| s.name() == name && s.project_path() != path)
    }
}
