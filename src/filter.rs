//! File selection by extension allowlist and include/exclude globs
//!
//! Globs are compiled once into `GlobSet`s and matched against the path
//! relative to the scan root, always with `/` separators. `*` and `?` never
//! cross a `/`; `**` does.

use crate::error::{Result, Win2NixError};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Extensions processed when none are configured
pub const DEFAULT_EXTENSIONS: &[&str] = &[".cpp", ".h", ".hpp", ".ini", ".uplugin"];

/// Build output and VCS directories skipped unless explicitly re-enabled
pub const DEFAULT_EXCLUDES: &[&str] = &["**/.git/**", "**/Binaries/**", "**/Intermediate/**"];

/// Filtering and matching options for a single run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterConfig {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    /// Lowercase, each with a leading dot. Empty means no restriction.
    pub extensions: BTreeSet<String>,
    pub aggressive: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            aggressive: false,
        }
    }
}

impl FilterConfig {
    /// Normalize a user-supplied extension: trim, lowercase, leading dot.
    ///
    /// Returns `None` for blank input.
    pub fn normalize_extension(ext: &str) -> Option<String> {
        let ext = ext.trim().trim_start_matches('.').to_lowercase();
        if ext.is_empty() {
            None
        } else {
            Some(format!(".{}", ext))
        }
    }

    /// Collect extensions into the normalized set, dropping blanks
    pub fn extension_set<I, S>(exts: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        exts.into_iter()
            .filter_map(|e| Self::normalize_extension(e.as_ref()))
            .collect()
    }
}

/// Compiled form of a [`FilterConfig`]
#[derive(Debug, Clone)]
pub struct FileFilter {
    extensions: Vec<String>,
    include: Option<GlobSet>,
    exclude: GlobSet,
    /// Exclude patterns plus their `/**`-stripped prefixes, for pruning
    exclude_dirs: GlobSet,
}

impl FileFilter {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        let include = if config.include_patterns.is_empty() {
            None
        } else {
            Some(build_set(&config.include_patterns)?)
        };

        let exclude = build_set(&config.exclude_patterns)?;

        let dir_patterns: Vec<String> = config
            .exclude_patterns
            .iter()
            .flat_map(|p| {
                let mut out = vec![p.clone()];
                if let Some(prefix) = p.strip_suffix("/**") {
                    if !prefix.is_empty() {
                        out.push(prefix.to_string());
                    }
                }
                out
            })
            .collect();
        let exclude_dirs = build_set(&dir_patterns)?;

        Ok(Self {
            extensions: config.extensions.iter().cloned().collect(),
            include,
            exclude,
            exclude_dirs,
        })
    }

    /// Decide whether a file (path relative to the scan root) is processed
    pub fn should_process(&self, relative: &Path) -> bool {
        let rel = to_slash(relative);
        if !self.has_allowed_extension(&rel) {
            return false;
        }
        if self.exclude.is_match(&rel) {
            return false;
        }
        match &self.include {
            Some(include) => include.is_match(&rel),
            None => true,
        }
    }

    /// True when a directory matches an exclude pattern and must not be entered
    pub fn should_prune_dir(&self, relative: &Path) -> bool {
        let rel = to_slash(relative);
        !rel.is_empty() && self.exclude_dirs.is_match(&rel)
    }

    fn has_allowed_extension(&self, rel: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let name = rel.rsplit('/').next().unwrap_or(rel).to_lowercase();
        self.extensions
            .iter()
            .any(|ext| name.len() > ext.len() && name.ends_with(ext.as_str()))
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| Win2NixError::InvalidGlob {
                pattern: pattern.clone(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| Win2NixError::InvalidGlob {
        pattern: patterns.join(", "),
        source,
    })
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
