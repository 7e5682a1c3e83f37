//! Use-case layer
//!
//! `SessionHandler` runs the picker, resolves the pick through the
//! registry and hands the session to tmux.

mod session_handler;

pub use session_handler::*;
