//! External process wrappers
//!
//! - `ProcessRunner` / `SystemRunner` - Cancellable child process execution
//! - `PickerCommand` - fzf with input/output buffers
//! - `TmuxCommand` - tmux with terminal or buffered I/O

mod picker;
mod runner;
mod tmux_command;

#[cfg(test)]
pub(crate) mod testing;

pub use picker::*;
pub use runner::*;
pub use tmux_command::*;
