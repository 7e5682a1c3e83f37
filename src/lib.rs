//! tmux-sessionizer - pick a project directory, land in its tmux session
//!
//! A fuzzy picker chooses a directory; the directory maps to a tmux session
//! name; the session is created if needed and then attached to (outside
//! tmux) or switched to (inside tmux).
//!
//! # Modules
//!
//! - [`session`] - Session model, name transformer and path-keyed registry
//! - [`process`] - External process wrappers behind the `ProcessRunner` seam
//! - [`tmux`] - Session-list parsing and the attach/switch decision table
//! - [`handler`] - User-facing flows that tie the picker to tmux
//! - [`config`] - Layered configuration and project discovery
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod handler;
pub mod process;
pub mod session;
pub mod tmux;

pub use config::Config;
pub use error::{Error, Result};
pub use handler::SessionHandler;
pub use process::{ProcessRunner, SystemRunner};
pub use session::{NamePolicy, Session, SessionRegistry, Transformer};
pub use tmux::{EnterAction, Tmux};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
