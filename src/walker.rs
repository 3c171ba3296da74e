//! Deterministic directory traversal under the scan root

use crate::error::Win2NixError;
use crate::filter::FileFilter;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Enumerates candidate files below a root directory.
///
/// Entries are visited in lexicographic order of their file names at every
/// level, symbolic links are never followed, and directories rejected by
/// [`FileFilter::should_prune_dir`] are not entered.
pub struct FileWalker<'a> {
    root: PathBuf,
    filter: &'a FileFilter,
}

impl<'a> FileWalker<'a> {
    pub fn new(root: impl Into<PathBuf>, filter: &'a FileFilter) -> Self {
        Self {
            root: root.into(),
            filter,
        }
    }

    /// Lazily walk the tree.
    ///
    /// Yields absolute file paths (given an absolute root) that pass the
    /// filter. An unreadable directory yields `Err(Win2NixError::Access)` and
    /// the walk carries on with its siblings.
    pub fn walk(self) -> impl Iterator<Item = Result<PathBuf, Win2NixError>> + 'a {
        let root = self.root;
        let filter = self.filter;
        let prune_root = root.clone();

        WalkDir::new(&root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                if !entry.file_type().is_dir() {
                    return true;
                }
                let keep = relative_to(&prune_root, entry.path())
                    .is_none_or(|rel| !filter.should_prune_dir(rel));
                if !keep {
                    tracing::debug!(dir = %entry.path().display(), "pruned excluded directory");
                }
                keep
            })
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        return None;
                    }
                    let rel = relative_to(&root, entry.path())?;
                    if filter.should_process(rel) {
                        Some(Ok(entry.into_path()))
                    } else {
                        None
                    }
                }
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.clone());
                    let source = err.into_io_error().unwrap_or_else(|| {
                        std::io::Error::other("filesystem loop detected")
                    });
                    tracing::warn!(dir = %path.display(), error = %source, "skipping unreadable directory");
                    Some(Err(Win2NixError::Access { path, source }))
                }
            })
    }
}

fn relative_to<'p>(root: &Path, path: &'p Path) -> Option<&'p Path> {
    path.strip_prefix(root).ok()
}
