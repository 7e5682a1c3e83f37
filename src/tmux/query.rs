//! Parsing of `tmux list-sessions` output

use crate::error::TmuxError;
use crate::session::{Session, normalize};

/// Format string handed to `list-sessions -F`
pub const LIST_FORMAT: &str = "#{session_name}:#{session_path}";

/// Parse `name:path` lines into sessions
///
/// Splits on the first colon only, since paths may contain colons. Blank
/// lines (including the trailing newline) are skipped; a non-blank line
/// without a colon is an error.
pub fn parse_session_list(output: &str) -> Result<Vec<Session>, TmuxError> {
    output
        .lines()
        .filter(|line| !normalize(line).is_empty())
        .map(|line| {
            let (name, path) = line.split_once(':').ok_or_else(|| TmuxError::QueryParse {
                line: line.to_string(),
            })?;
            Ok(Session::new(normalize(name), normalize(path)))
        })
        .collect()
}
