//! Project discovery
//!
//! Roots come from `default=` lines in the project file plus the `roots`
//! config key. Each root is walked a few levels deep and every directory
//! found (the root included) becomes a pick candidate.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, warn};

use super::{Config, expand_tilde};
use crate::error::{ConfigError, Result};

/// Line prefix that introduces a comma-separated list of roots
pub const ROOTS_PREFIX: &str = "default=";

/// Root entries from the project file contents, trimmed, empties dropped
pub fn parse_project_file(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter_map(|line| line.strip_prefix(ROOTS_PREFIX))
        .flat_map(|list| list.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}

/// All configured project roots, tilde-expanded and absolute
pub fn project_roots(config: &Config) -> Result<Vec<PathBuf>> {
    let project_file = expand_tilde(&config.project_file)?;

    let mut raw: Vec<PathBuf> = match std::fs::read_to_string(&project_file) {
        Ok(contents) => parse_project_file(&contents)
            .into_iter()
            .map(PathBuf::from)
            .collect(),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No project file at {}", project_file.display());
            Vec::new()
        }
        Err(e) => {
            return Err(ConfigError::ProjectFile {
                path: project_file,
                source: e,
            }
            .into());
        }
    };
    raw.extend(config.roots.iter().cloned());

    let mut roots = Vec::with_capacity(raw.len());
    for root in raw {
        let root = std::path::absolute(expand_tilde(&root)?)?;
        if !roots.contains(&root) {
            roots.push(root);
        }
    }

    if roots.is_empty() {
        return Err(ConfigError::NoProjectRoots(project_file).into());
    }
    Ok(roots)
}

/// Walks project roots for candidate directories
#[derive(Debug, Clone, Copy)]
pub struct ProjectScanner {
    max_depth: usize,
    include_hidden: bool,
}

impl ProjectScanner {
    pub fn new(max_depth: usize, include_hidden: bool) -> Self {
        Self {
            max_depth,
            include_hidden,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_depth, config.include_hidden)
    }

    /// Every directory under `roots` up to the depth limit, sorted
    pub fn scan(&self, roots: &[PathBuf]) -> Vec<PathBuf> {
        let mut found = BTreeSet::new();
        for root in roots {
            self.scan_root(root, &mut found);
        }
        debug!(count = found.len(), "Discovered project directories");
        found.into_iter().collect()
    }

    fn scan_root(&self, root: &Path, found: &mut BTreeSet<PathBuf>) {
        if !root.is_dir() {
            warn!("Project root is not a directory: {}", root.display());
            return;
        }
        found.insert(root.to_path_buf());

        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .hidden(!self.include_hidden)
            .max_depth(Some(self.max_depth))
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(v) => v,
                Err(e) => {
                    // Unreadable directories are skipped
                    debug!("Skipping entry: {}", e);
                    continue;
                }
            };
            if entry.depth() == 0 || !entry.file_type().is_some_and(|t| t.is_dir()) {
                continue;
            }
            found.insert(entry.into_path());
        }
    }
}
