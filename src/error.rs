//! Error types for win2nix and helpers for actionable error messages

use std::io;
use std::path::{Path, PathBuf};

/// Library-level structured errors.
///
/// Fatal variants (`InvalidRoot`, `InvalidGlob`, config errors) stop a run
/// before any file is touched. The per-file variants are recorded in the
/// run summary and never abort the walk.
#[derive(Debug, thiserror::Error)]
pub enum Win2NixError {
    #[error("Invalid root path '{}': {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("Cannot read directory '{}'", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read file '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write file '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid glob pattern: {pattern}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to read config file '{}'", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file '{}'", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias using Win2NixError.
pub type Result<T> = std::result::Result<T, Win2NixError>;

/// Check if an IO error is a permission denied error
pub fn is_permission_denied(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
}

/// Render an error together with its source chain, plus a fix-it hint when
/// the underlying cause is a permission problem.
pub fn describe(err: &Win2NixError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(&format!(": {}", cause));
        source = cause.source();
    }

    let hint = match err {
        Win2NixError::Access { path, source } if is_permission_denied(source) => {
            Some(permission_hint(path, "listing"))
        }
        Win2NixError::Read { path, source } if is_permission_denied(source) => {
            Some(permission_hint(path, "reading"))
        }
        Win2NixError::Write { path, source } if is_permission_denied(source) => {
            Some(permission_hint(path, "writing"))
        }
        _ => None,
    };

    match hint {
        Some(hint) => format!("{}\n{}", message, hint),
        None => message,
    }
}

/// Create a short hint for permission issues
pub fn permission_hint(path: &Path, operation: &str) -> String {
    let parent_dir = path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".".to_string());

    format!(
        "  hint: permission denied when {} '{}'; check `ls -l '{}'` and write access to '{}'",
        operation,
        path.display(),
        path.display(),
        parent_dir
    )
}
