//! Configuration module
//!
//! Handles:
//! - User configuration (`~/.config/tmux-sessionizer/config.toml`)
//! - Project roots from the `~/.tmux-sessionizer` line file
//! - Project directory discovery

mod projects;
mod settings;

pub use projects::*;
pub use settings::*;
