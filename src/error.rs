//! Error types for tmux-sessionizer
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `Display` and `Error` impls.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for tmux-sessionizer
#[derive(Error, Debug)]
pub enum Error {
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    #[error("Tmux error: {0}")]
    Tmux(#[from] TmuxError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of an external executable (picker or tmux)
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("'{program}' is not installed or not in PATH")]
    NotFound { program: String },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command failed ({}): {command} {stderr}", exit_label(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Command canceled: {command}")]
    Canceled { command: String },

    #[error("Query command has no output buffer configured: {command}")]
    NoOutputBufferConfigured { command: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl ProcessError {
    /// Whether this error came from a canceled run rather than a real failure
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled { .. })
    }
}

/// Tmux orchestration errors
#[derive(Error, Debug)]
pub enum TmuxError {
    #[error("Failed to list tmux sessions (is the server running?): {0}")]
    Query(#[source] ProcessError),

    #[error("Malformed list-sessions line (expected name:path): {line:?}")]
    QueryParse { line: String },

    #[error("No target session given for {operation}")]
    MissingTarget { operation: &'static str },
}

/// Session registry and selection errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("No tmux sessions are running")]
    NoSessions,

    #[error("Nothing was selected")]
    NoSelection,

    #[error("Picker returned more than one line: {0:?}")]
    AmbiguousSelection(String),

    #[error("Project already exists: {0}")]
    ProjectExists(PathBuf),

    #[error("Invalid project name {0:?}: must be a relative path without '..'")]
    InvalidProjectName(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Failed to read project file {path}: {source}")]
    ProjectFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No project roots configured (add default=<dir> to {0} or set `roots`)")]
    NoProjectRoots(PathBuf),

    #[error("Invalid name rule '{from}' -> '{to}': {reason}")]
    InvalidNameRule {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Could not determine home directory")]
    NoHomeDir,
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;
