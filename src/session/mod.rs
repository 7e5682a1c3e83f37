//! Session management module
//!
//! Provides the session model and its bookkeeping:
//! - `Session` - A tmux session bound to a project directory
//! - `Transformer` - Reversible path-to-session-name rule chain
//! - `SessionRegistry` - Path-keyed create-or-get store

mod registry;
mod transform;
mod types;

pub use registry::*;
pub use transform::*;
pub use types::*;
