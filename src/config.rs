//! Configuration file support for win2nix
//!
//! Settings are read from, in order of preference: an explicit `--config`
//! path, `<ROOT>/.win2nix.toml`, or `~/.win2nix/config.toml`. Command-line
//! flags are layered on top by [`Config::into_filter_config`].

use crate::error::{Result, Win2NixError};
use crate::filter::{DEFAULT_EXCLUDES, DEFAULT_EXTENSIONS, FilterConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-project config file looked up in the scan root
pub const PROJECT_CONFIG_FILE: &str = ".win2nix.toml";

pub const DEFAULT_CONFIG: &str = r#"# win2nix configuration file

[filter]
# Extensions to process (case-insensitive, leading dot optional)
#extensions = [".cpp", ".h", ".hpp", ".ini", ".uplugin"]

# Globs relative to the scan root. Empty include means "everything".
#include = []
#exclude = []

# Skip .git, Binaries and Intermediate directories (default: true)
#default_excludes = true

[rewrite]
# Also collapse escaped pairs and normalize mixed separators (default: false)
#aggressive = false
"#;

/// win2nix configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub filter: FilterSection,

    #[serde(default)]
    pub rewrite: RewriteSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSection {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default = "default_true")]
    pub default_excludes: bool,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            include: Vec::new(),
            exclude: Vec::new(),
            default_excludes: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewriteSection {
    #[serde(default)]
    pub aggressive: bool,
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_true() -> bool {
    true
}

/// Command-line values that override or extend the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub extensions: Vec<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub no_default_excludes: bool,
    pub aggressive: bool,
}

impl Config {
    /// Merge CLI overrides and produce the run's immutable filter settings
    pub fn into_filter_config(self, overrides: &Overrides) -> Result<FilterConfig> {
        let requested = if overrides.extensions.is_empty() {
            &self.filter.extensions
        } else {
            &overrides.extensions
        };
        // An explicitly empty list lifts the extension restriction
        let extensions = FilterConfig::extension_set(requested);
        if extensions.is_empty() && !requested.is_empty() {
            return Err(Win2NixError::InvalidConfig(
                "extension list contains only blank entries".to_string(),
            ));
        }

        let mut exclude_patterns = Vec::new();
        if self.filter.default_excludes && !overrides.no_default_excludes {
            exclude_patterns.extend(DEFAULT_EXCLUDES.iter().map(|s| s.to_string()));
        }
        exclude_patterns.extend(self.filter.exclude);
        exclude_patterns.extend(overrides.exclude.iter().cloned());

        let mut include_patterns = self.filter.include;
        include_patterns.extend(overrides.include.iter().cloned());

        Ok(FilterConfig {
            include_patterns,
            exclude_patterns,
            extensions,
            aggressive: self.rewrite.aggressive || overrides.aggressive,
        })
    }
}

/// User-level config path (`~/.win2nix/config.toml`)
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".win2nix").join("config.toml"))
}

/// Locate the config file to use, if any
pub fn find_config(explicit: Option<&Path>, root: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let project = root.join(PROJECT_CONFIG_FILE);
    if project.is_file() {
        return Some(project);
    }
    user_config_path().filter(|p| p.is_file())
}

/// Parse a config file
pub fn load_config_file(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path).map_err(|source| Win2NixError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let config: Config = toml::from_str(&config_str).map_err(|source| Win2NixError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_config(&config)?;
    Ok(config)
}

/// Load the effective configuration; defaults when no file is found
pub fn load_config(explicit: Option<&Path>, root: &Path) -> Result<Config> {
    match find_config(explicit, root) {
        Some(path) => {
            tracing::debug!(config = %path.display(), "loading config file");
            load_config_file(&path)
        }
        None => Ok(Config::default()),
    }
}

/// Validate configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    if config.filter.extensions.iter().any(|e| e.trim().is_empty()) {
        return Err(Win2NixError::InvalidConfig(
            "filter.extensions must not contain empty entries".to_string(),
        ));
    }

    for pattern in config.filter.include.iter().chain(&config.filter.exclude) {
        if pattern.trim().is_empty() {
            return Err(Win2NixError::InvalidConfig(
                "filter.include/exclude must not contain empty patterns".to_string(),
            ));
        }
    }

    Ok(())
}
