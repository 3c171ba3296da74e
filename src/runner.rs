//! Orchestration of a single conversion run
//!
//! A run moves through `Init → Walking → Scanning → (DryRunReport |
//! Rewriting) → Reporting → Done`. Only `Init` can fail the run as a whole;
//! everything after it degrades per file.

use crate::error::{Result, Win2NixError};
use crate::filter::{FileFilter, FilterConfig};
use crate::report::{ReportBuilder, RunSummary};
use crate::rewrite::{RewriteEngine, ScanOutcome};
use crate::walker::FileWalker;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Walking,
    Scanning,
    DryRunReport,
    Rewriting,
    Reporting,
    Done,
}

/// Everything a run needs, built once from CLI flags and config
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub root: PathBuf,
    pub dry_run: bool,
    pub filter: FilterConfig,
}

pub struct Runner {
    options: RunOptions,
    phase: Phase,
}

impl Runner {
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            phase: Phase::Init,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(from = ?self.phase, to = ?phase, "phase transition");
        self.phase = phase;
    }

    /// Execute the run and return its summary.
    ///
    /// Fails only for setup problems: an invalid root or bad glob patterns.
    pub fn run(&mut self) -> Result<RunSummary> {
        let root = validate_root(&self.options.root)?;
        let filter = FileFilter::new(&self.options.filter)?;
        let engine = RewriteEngine::new(self.options.filter.aggressive);
        let dry_run = self.options.dry_run;

        tracing::info!(
            root = %root.display(),
            dry_run,
            aggressive = self.options.filter.aggressive,
            "starting run"
        );

        let mut report = ReportBuilder::new(root.clone(), dry_run);

        self.enter(Phase::Walking);
        for item in FileWalker::new(&root, &filter).walk() {
            let path = match item {
                Ok(path) => path,
                Err(err) => {
                    report.warn(&err);
                    continue;
                }
            };

            self.enter(Phase::Scanning);
            let change_set = match engine.scan_file(&path) {
                Ok(ScanOutcome::Scanned(change_set)) => change_set,
                Ok(ScanOutcome::Skipped { path, reason }) => {
                    report.skip(path, reason);
                    continue;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "scan failed");
                    report.fail(&err);
                    continue;
                }
            };

            if dry_run {
                self.enter(Phase::DryRunReport);
                report.add(change_set);
                continue;
            }

            self.enter(Phase::Rewriting);
            match engine.apply(&change_set) {
                Ok(_) => report.add(change_set),
                Err(err) => {
                    tracing::warn!(error = %err, "write failed");
                    report.write_failed(change_set, &err);
                }
            }
        }

        self.enter(Phase::Reporting);
        let summary = report.finalize();
        tracing::info!(
            scanned = summary.files_scanned,
            changed = summary.files_changed,
            substitutions = summary.total_substitutions,
            failures = summary.failures.len(),
            "run finished"
        );

        self.enter(Phase::Done);
        Ok(summary)
    }
}

/// Canonicalize the root, requiring an existing directory
pub fn validate_root(root: &Path) -> Result<PathBuf> {
    let invalid = |reason: String| Win2NixError::InvalidRoot {
        path: root.to_path_buf(),
        reason,
    };

    let canonical = fs::canonicalize(root).map_err(|e| invalid(e.to_string()))?;
    if !canonical.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }
    Ok(canonical)
}

/// Convenience entry point for library users
pub fn run(options: RunOptions) -> Result<RunSummary> {
    Runner::new(options).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(root: &Path, dry_run: bool, aggressive: bool) -> RunOptions {
        RunOptions {
            root: root.to_path_buf(),
            dry_run,
            filter: FilterConfig {
                aggressive,
                ..FilterConfig::default()
            },
        }
    }

    #[test]
    fn test_missing_root_is_invalid() {
        let dir = TempDir::new().unwrap();
        let err = run(options(&dir.path().join("nope"), true, false)).unwrap_err();
        assert!(matches!(err, Win2NixError::InvalidRoot { .. }));
    }

    #[test]
    fn test_file_root_is_invalid() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.cpp");
        fs::write(&file, "").unwrap();
        let err = run(options(&file, true, false)).unwrap_err();
        assert!(matches!(err, Win2NixError::InvalidRoot { .. }));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.h");
        let text = "#include \"Source\\Public\\Foo.h\"\n";
        fs::write(&file, text).unwrap();
        let mtime = fs::metadata(&file).unwrap().modified().unwrap();

        let mut runner = Runner::new(options(dir.path(), true, false));
        let summary = runner.run().unwrap();
        assert_eq!(runner.phase(), Phase::Done);
        assert_eq!(summary.files_changed, 1);
        // One substitution per backslash group
        assert_eq!(summary.total_substitutions, 2);
        assert_eq!(fs::read_to_string(&file).unwrap(), text);
        assert_eq!(fs::metadata(&file).unwrap().modified().unwrap(), mtime);
    }

    #[test]
    fn test_partial_failure_converts_the_rest() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.cpp"), "auto p = \"Maps\\Level.umap\";\n").unwrap();
        fs::write(dir.path().join("b.h"), [0xffu8, 0x00, 0x5c, 0x41]).unwrap();
        fs::write(dir.path().join("c.ini"), "Dir=Content\\Maps\n").unwrap();

        let summary = run(options(dir.path(), false, false)).unwrap();
        assert_eq!(summary.files_scanned, 2);
        assert_eq!(summary.files_changed, 2);
        assert_eq!(summary.skipped.len(), 1);
        assert!(summary.skipped[0].path.ends_with("b.h"));
        assert_eq!(summary.exit_code(), 0);
        assert_eq!(
            fs::read_to_string(dir.path().join("a.cpp")).unwrap(),
            "auto p = \"Maps/Level.umap\";\n"
        );
        assert_eq!(fs::read_to_string(dir.path().join("c.ini")).unwrap(), "Dir=Content/Maps\n");
    }

    #[test]
    fn test_filtered_files_never_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "C:\\Temp\\x\n").unwrap();
        fs::write(dir.path().join("a.ini"), "X=Y\\Z\n").unwrap();

        let summary = run(options(dir.path(), true, false)).unwrap();
        assert_eq!(summary.per_file.len(), 1);
        assert!(summary.per_file[0].file_path.ends_with("a.ini"));
    }

    #[test]
    fn test_second_run_finds_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.cpp"),
            "const char* p = \"C:\\\\Users\\\\foo\\\\bar.ini\";\r\n",
        )
        .unwrap();

        let first = run(options(dir.path(), false, true)).unwrap();
        assert_eq!(first.total_substitutions, 3);
        let second = run(options(dir.path(), false, true)).unwrap();
        assert_eq!(second.total_substitutions, 0);
        assert_eq!(
            fs::read_to_string(dir.path().join("a.cpp")).unwrap(),
            "const char* p = \"C:/Users/foo/bar.ini\";\r\n"
        );
    }
    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_a_warning() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("locked")).unwrap();
        fs::write(dir.path().join("locked/a.h"), "X=A\\B\n").unwrap();
        fs::create_dir(dir.path().join("open")).unwrap();
        fs::write(dir.path().join("open/b.h"), "X=C\\D\n").unwrap();

        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Root reads the directory anyway
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let summary = run(options(dir.path(), true, false));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let summary = summary.unwrap();

        assert_eq!(summary.warnings.len(), 1);
        assert!(summary.warnings[0].contains("locked"));
        assert_eq!(summary.files_scanned, 1);
        assert!(summary.per_file[0].file_path.ends_with("open/b.h"));
        assert_eq!(summary.exit_code(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_failure_keeps_scan_count() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("locked")).unwrap();
        fs::write(dir.path().join("locked/a.h"), "X=A\\B\n").unwrap();
        fs::write(dir.path().join("b.h"), "X=C\\D\n").unwrap();

        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
        if fs::write(locked.join("probe"), "").is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let dry = run(options(dir.path(), true, false)).unwrap();
        let applied = run(options(dir.path(), false, false));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let applied = applied.unwrap();

        assert_eq!(dry.files_scanned, 2);
        assert_eq!(applied.files_scanned, dry.files_scanned);
        assert_eq!(applied.files_changed, 1);
        assert_eq!(applied.failures.len(), 1);
        assert_eq!(applied.exit_code(), 2);
    }
}
