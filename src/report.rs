//! Run summary accumulation

use crate::error::{self, Win2NixError};
use crate::rewrite::{FileChangeSet, SkipReason};
use serde::Serialize;
use std::path::PathBuf;

/// A file left alone because it could not be decoded as text
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// A per-file read or write failure
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Final, immutable result of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub root: PathBuf,
    pub dry_run: bool,
    pub files_scanned: usize,
    pub files_changed: usize,
    pub total_substitutions: usize,
    pub per_file: Vec<FileChangeSet>,
    pub skipped: Vec<SkippedFile>,
    pub failures: Vec<FileFailure>,
    pub warnings: Vec<String>,
}

impl RunSummary {
    /// Files with at least one substitution, in scan order
    pub fn changed_files(&self) -> impl Iterator<Item = &FileChangeSet> {
        self.per_file.iter().filter(|cs| cs.is_changed())
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Process exit code: 2 when any file failed to read or write, else 0
    pub fn exit_code(&self) -> u8 {
        if self.has_failures() { 2 } else { 0 }
    }
}

/// Accumulates per-file results in the order they are produced
#[derive(Debug)]
pub struct ReportBuilder {
    summary: RunSummary,
}

impl ReportBuilder {
    pub fn new(root: PathBuf, dry_run: bool) -> Self {
        Self {
            summary: RunSummary {
                root,
                dry_run,
                files_scanned: 0,
                files_changed: 0,
                total_substitutions: 0,
                per_file: Vec::new(),
                skipped: Vec::new(),
                failures: Vec::new(),
                warnings: Vec::new(),
            },
        }
    }

    pub fn add(&mut self, change_set: FileChangeSet) {
        self.summary.files_scanned += 1;
        if change_set.is_changed() {
            self.summary.files_changed += 1;
            self.summary.total_substitutions += change_set.substitutions();
        }
        self.summary.per_file.push(change_set);
    }

    pub fn skip(&mut self, path: PathBuf, reason: SkipReason) {
        self.summary.skipped.push(SkippedFile { path, reason });
    }

    /// Record a per-file read or write failure
    pub fn fail(&mut self, err: &Win2NixError) {
        let path = match err {
            Win2NixError::Read { path, .. } | Win2NixError::Write { path, .. } => path.clone(),
            _ => PathBuf::new(),
        };
        self.summary.failures.push(FileFailure {
            path,
            message: error::describe(err),
        });
    }

    /// Record a file that was scanned but could not be written back.
    ///
    /// It counts as scanned, never as changed, and stays out of `per_file`.
    pub fn write_failed(&mut self, change_set: FileChangeSet, err: &Win2NixError) {
        self.summary.files_scanned += 1;
        tracing::debug!(
            file = %change_set.file_path.display(),
            substitutions = change_set.substitutions(),
            "dropping unwritten changes"
        );
        self.fail(err);
    }

    pub fn warn(&mut self, err: &Win2NixError) {
        self.summary.warnings.push(error::describe(err));
    }

    pub fn finalize(self) -> RunSummary {
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::RewriteEngine;
    use std::io;
    use std::path::Path;

    fn change_set(name: &str, text: &str) -> FileChangeSet {
        RewriteEngine::new(false).scan_text(Path::new(name), text.to_string())
    }

    #[test]
    fn test_totals_match_per_file() {
        let mut builder = ReportBuilder::new(PathBuf::from("/p"), true);
        builder.add(change_set("a.h", "#include \"A\\B\\C.h\"\n"));
        builder.add(change_set("b.h", "#pragma once\n"));
        builder.add(change_set("c.ini", "X=Y\\Z\n"));
        let summary = builder.finalize();

        assert_eq!(summary.files_scanned, 3);
        assert_eq!(summary.files_changed, 2);
        assert_eq!(summary.total_substitutions, 3);
        let sum: usize = summary.per_file.iter().map(|cs| cs.matches.len()).sum();
        assert_eq!(summary.total_substitutions, sum);
        let order: Vec<_> = summary.per_file.iter().map(|cs| cs.file_path.clone()).collect();
        assert_eq!(order, vec![PathBuf::from("a.h"), PathBuf::from("b.h"), PathBuf::from("c.ini")]);
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn test_failures_set_exit_code() {
        let mut builder = ReportBuilder::new(PathBuf::from("/p"), false);
        builder.add(change_set("b.ini", "X=Y\\Z\n"));
        builder.fail(&Win2NixError::Write {
            path: PathBuf::from("a.h"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        });
        let summary = builder.finalize();

        assert_eq!(summary.files_changed, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].path, PathBuf::from("a.h"));
        assert!(summary.failures[0].message.contains("hint"));
        assert_eq!(summary.exit_code(), 2);
    }

    #[test]
    fn test_write_failure_still_counts_as_scanned() {
        let mut builder = ReportBuilder::new(PathBuf::from("/p"), false);
        builder.add(change_set("a.h", "#include \"A\\B.h\"\n"));
        builder.write_failed(
            change_set("b.h", "#include \"C\\D\\E.h\"\n"),
            &Win2NixError::Write {
                path: PathBuf::from("b.h"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            },
        );
        let summary = builder.finalize();

        assert_eq!(summary.files_scanned, 2);
        assert_eq!(summary.files_changed, 1);
        assert_eq!(summary.total_substitutions, 1);
        assert_eq!(summary.per_file.len(), 1);
        assert_eq!(summary.failures[0].path, PathBuf::from("b.h"));
        assert_eq!(summary.exit_code(), 2);
    }

    #[test]
    fn test_skips_and_warnings_do_not_fail_the_run() {
        let mut builder = ReportBuilder::new(PathBuf::from("/p"), false);
        builder.skip(PathBuf::from("blob.h"), SkipReason::Binary);
        builder.warn(&Win2NixError::Access {
            path: PathBuf::from("/p/locked"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        });
        let summary = builder.finalize();
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.warnings.len(), 1);
        assert_eq!(summary.exit_code(), 0);
    }
}
