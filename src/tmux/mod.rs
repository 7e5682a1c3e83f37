//! tmux integration module
//!
//! Provides the session orchestration layer:
//! - `Tmux` - Attach/switch/create/kill decisions for sessions
//! - `parse_session_list` - `list-sessions` output parsing

mod orchestrator;
mod query;

pub use orchestrator::*;
pub use query::*;
