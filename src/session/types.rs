//! Core session types
//!
//! A `Session` binds a tmux session name to the project directory it was
//! opened in. The path is the identity key; the name is derived from it.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a session entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Use first 8 chars for display
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// A tmux session bound to a project directory
///
/// Fields are private: the name is derived from the path when the registry
/// creates the entry and cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    name: String,
    project_path: PathBuf,
}

impl Session {
    pub(crate) fn new(name: impl Into<String>, project_path: impl Into<PathBuf>) -> Self {
        Self {
            id: SessionId::new(),
            name: name.into(),
            project_path: project_path.into(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Name as tmux knows it
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Whether both values refer to the same registry entry
    pub fn same(&self, other: &Session) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.project_path.display())
    }
}

/// Trim process output before it enters the domain model
///
/// Picker and tmux output carries trailing newlines; paths and names are
/// compared after this step only.
pub fn normalize(raw: &str) -> &str {
    raw.trim()
}
