//! User configuration settings
//!
//! Layered configuration: defaults → config file → environment variables

use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};
use crate::process::{DEFAULT_PICKER, DEFAULT_TMUX};
use crate::session::{NamePolicy, TransformRule, Transformer};
use crate::tmux::DEFAULT_SESSION_ENV;

/// Extra character substitution applied after the built-in `.`/`:` rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRule {
    pub from: String,
    pub to: String,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fuzzy picker executable
    pub picker: String,

    /// Extra arguments for the picker (e.g. `["--reverse"]`)
    pub picker_args: Vec<String>,

    /// tmux executable
    pub tmux: String,

    /// Environment variable whose presence means "already inside tmux"
    pub session_env: String,

    /// Which part of the project path names the session
    pub naming: NamePolicy,

    /// Additional reversible character substitutions for session names
    pub name_rules: Vec<NameRule>,

    /// Line-based project file with `default=<dir>,<dir>` entries
    pub project_file: PathBuf,

    /// Project roots in addition to those in `project_file`
    pub roots: Vec<PathBuf>,

    /// How deep below each root to look for project directories
    pub max_depth: usize,

    /// Also offer hidden directories below the roots
    pub include_hidden: bool,

    /// Enable debug logging
    pub debug: bool,

    /// Log file path (if set, logs to file instead of stderr)
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            picker: DEFAULT_PICKER.to_string(),
            picker_args: Vec::new(),
            tmux: DEFAULT_TMUX.to_string(),
            session_env: DEFAULT_SESSION_ENV.to_string(),
            naming: NamePolicy::default(),
            name_rules: Vec::new(),
            project_file: PathBuf::from("~/.tmux-sessionizer"),
            roots: Vec::new(),
            max_depth: 1,
            include_hidden: false,
            debug: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources
    ///
    /// `path` overrides the default config file location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_file_path()?,
        };

        Self::figment(&config_path)
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()).into())
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Config::default()))
            // Layer config file if it exists
            .merge(Toml::file(config_path))
            // Layer environment variables (TS_PICKER, TS_MAX_DEPTH, etc.)
            .merge(Env::prefixed("TS_"))
    }

    /// Get the configuration file path
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Save current configuration to `path` (default location if `None`)
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_file_path()?,
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::SaveFailed(format!("{}: {e}", parent.display())))?;
        }

        let toml =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        std::fs::write(&config_path, toml).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        Ok(config_path)
    }

    /// Session-name transformer: built-in rules, then `name_rules` in order
    pub fn transformer(&self) -> Result<Transformer> {
        let mut extra = Vec::with_capacity(self.name_rules.len());

        for rule in &self.name_rules {
            let (from, to) = (single_char(&rule.from), single_char(&rule.to));
            let (Some(from), Some(to)) = (from, to) else {
                return Err(invalid_rule(rule, "both sides must be a single character"));
            };
            if from == to {
                return Err(invalid_rule(rule, "characters must differ"));
            }
            extra.push(TransformRule::replace(from, to));
        }

        Ok(Transformer::tmux_safe().with_rules(extra))
    }

    fn project_dirs() -> Result<ProjectDirs> {
        require_home(ProjectDirs::from("dev", "tmux-sessionizer", "tmux-sessionizer"))
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn invalid_rule(rule: &NameRule, reason: &str) -> Error {
    ConfigError::InvalidNameRule {
        from: rule.from.clone(),
        to: rule.to.clone(),
        reason: reason.to_string(),
    }
    .into()
}

/// Expand a leading `~` to the user's home directory
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    if !path.starts_with("~") {
        return Ok(path.to_path_buf());
    }
    let dirs = require_home(BaseDirs::new())?;
    Ok(expand_tilde_with(path, dirs.home_dir()))
}

/// `directories` returns `None` when no home directory can be found
fn require_home<T>(dirs: Option<T>) -> Result<T> {
    dirs.ok_or_else(|| ConfigError::NoHomeDir.into())
}

/// `expand_tilde` against an explicit home directory
pub fn expand_tilde_with(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.picker, "fzf");
        assert_eq!(config.tmux, "tmux");
        assert_eq!(config.session_env, "TMUX");
        assert_eq!(config.naming, NamePolicy::Basename);
        assert_eq!(config.max_depth, 1);
        assert!(!config.include_hidden);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("picker = \"fzf\""));
        assert!(toml.contains("naming = \"basename\""));
    }

    #[test]
    fn test_load_layers_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
picker_args = ["--reverse"]
naming = "full_path"
roots = ["/srv/code"]

[[name_rules]]
from = " "
to = "-"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.picker, "fzf");
        assert_eq!(config.picker_args, vec!["--reverse"]);
        assert_eq!(config.naming, NamePolicy::FullPath);
        assert_eq!(config.roots, vec![PathBuf::from("/srv/code")]);
        assert_eq!(
            config.name_rules,
            vec![NameRule {
                from: " ".to_string(),
                to: "-".to_string()
            }]
        );
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.tmux, "tmux");
    }

    #[test]
    fn test_save_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            max_depth: 3,
            ..Config::default()
        };
        let written = config.save(Some(&path)).unwrap();

        assert_eq!(written, path);
        assert_eq!(Config::load(Some(&path)).unwrap().max_depth, 3);
    }

    #[test]
    fn test_transformer_appends_name_rules() {
        let config = Config {
            name_rules: vec![NameRule {
                from: " ".to_string(),
                to: "-".to_string(),
            }],
            ..Config::default()
        };

        let t = config.transformer().unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.transform("my app.v2"), "my-app_v2");
    }

    #[test]
    fn test_transformer_rejects_bad_rules() {
        for (from, to) in [("ab", "c"), ("", "x"), ("x", "x")] {
            let config = Config {
                name_rules: vec![NameRule {
                    from: from.to_string(),
                    to: to.to_string(),
                }],
                ..Config::default()
            };
            assert!(matches!(
                config.transformer(),
                Err(Error::Config(ConfigError::InvalidNameRule { .. }))
            ));
        }
    }

    #[test]
    fn test_missing_home_is_no_home_dir() {
        let err = require_home(None::<BaseDirs>).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NoHomeDir)));
        assert_eq!(require_home(Some(7)).unwrap(), 7);
    }

    #[test]
    fn test_expand_tilde_with() {
        let home = Path::new("/tmp/home");
        assert_eq!(
            expand_tilde_with(Path::new("~/projects"), home),
            PathBuf::from("/tmp/home/projects")
        );
        assert_eq!(expand_tilde_with(Path::new("~"), home), PathBuf::from("/tmp/home"));
        assert_eq!(
            expand_tilde_with(Path::new("/var/www"), home),
            PathBuf::from("/var/www")
        );
    }
}
