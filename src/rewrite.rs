use crate::error::{Result, Win2NixError};
use crate::matcher::{self, Match};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Result of decoding a file's bytes as text
#[derive(Debug)]
pub enum Decoded {
    Text(String),
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Contains NUL bytes
    Binary,
    /// Not valid UTF-8
    InvalidUtf8 { valid_up_to: usize },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Binary => write!(f, "binary content"),
            SkipReason::InvalidUtf8 { valid_up_to } => {
                write!(f, "invalid UTF-8 after byte {}", valid_up_to)
            }
        }
    }
}

/// One modified line, kept for previews
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineChange {
    pub line_number: usize,
    pub old: String,
    pub new: String,
    pub substitutions: usize,
}

/// All proposed (or applied) substitutions for one file
#[derive(Debug, Clone, Serialize)]
pub struct FileChangeSet {
    pub file_path: PathBuf,
    pub matches: Vec<Match>,
    pub line_changes: Vec<LineChange>,
    #[serde(skip)]
    pub original_text: String,
    #[serde(skip)]
    pub new_text: String,
}

impl FileChangeSet {
    pub fn is_changed(&self) -> bool {
        !self.matches.is_empty()
    }

    pub fn substitutions(&self) -> usize {
        self.matches.len()
    }
}

/// What scanning a file produced
#[derive(Debug)]
pub enum ScanOutcome {
    Scanned(FileChangeSet),
    Skipped { path: PathBuf, reason: SkipReason },
}

/// Decode raw bytes, refusing anything that is not clean UTF-8 text
pub fn decode(bytes: Vec<u8>) -> Decoded {
    if bytes.contains(&0) {
        return Decoded::Skip(SkipReason::Binary);
    }
    match String::from_utf8(bytes) {
        Ok(text) => Decoded::Text(text),
        Err(e) => Decoded::Skip(SkipReason::InvalidUtf8 {
            valid_up_to: e.utf8_error().valid_up_to(),
        }),
    }
}

/// Split off the line terminator (`\r\n`, `\n`, or nothing on the last line)
fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Reads files, finds separators to rewrite, and writes results back
#[derive(Debug, Clone, Copy)]
pub struct RewriteEngine {
    aggressive: bool,
}

impl RewriteEngine {
    pub fn new(aggressive: bool) -> Self {
        Self { aggressive }
    }

    /// Scan a file on disk. Never writes.
    pub fn scan_file(&self, path: &Path) -> Result<ScanOutcome> {
        let bytes = fs::read(path).map_err(|source| Win2NixError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match decode(bytes) {
            Decoded::Text(text) => Ok(ScanOutcome::Scanned(self.scan_text(path, text))),
            Decoded::Skip(reason) => {
                tracing::info!(file = %path.display(), %reason, "skipping undecodable file");
                Ok(ScanOutcome::Skipped {
                    path: path.to_path_buf(),
                    reason,
                })
            }
        }
    }

    /// Scan already-decoded text, line by line, keeping every line ending
    pub fn scan_text(&self, path: &Path, text: String) -> FileChangeSet {
        let mut matches = Vec::new();
        let mut line_changes = Vec::new();
        let mut new_text = String::with_capacity(text.len());

        for (idx, raw_line) in text.split_inclusive('\n').enumerate() {
            let line_number = idx + 1;
            let (body, ending) = split_line_ending(raw_line);
            let candidates = matcher::find_matches(body, self.aggressive);

            if candidates.is_empty() {
                new_text.push_str(raw_line);
                continue;
            }

            let new_body = matcher::apply_candidates(body, &candidates);
            new_text.push_str(&new_body);
            new_text.push_str(ending);

            line_changes.push(LineChange {
                line_number,
                old: body.to_string(),
                new: new_body,
                substitutions: candidates.len(),
            });
            matches.extend(candidates.into_iter().map(|c| c.at_line(line_number)));
        }

        if !matches.is_empty() {
            tracing::debug!(
                file = %path.display(),
                substitutions = matches.len(),
                lines = line_changes.len(),
                "found separators to rewrite"
            );
        }

        FileChangeSet {
            file_path: path.to_path_buf(),
            matches,
            line_changes,
            original_text: text,
            new_text,
        }
    }

    /// Write `new_text` back to the file if anything changed.
    ///
    /// Content goes to a temp file in the same directory which is then
    /// renamed over the original, so a failure leaves the original intact.
    /// Returns whether the file was written.
    pub fn apply(&self, change_set: &FileChangeSet) -> Result<bool> {
        if !change_set.is_changed() {
            return Ok(false);
        }

        let path = &change_set.file_path;
        let write_err = |source: std::io::Error| Win2NixError::Write {
            path: path.clone(),
            source,
        };

        let parent_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let mut temp_file = NamedTempFile::new_in(parent_dir).map_err(write_err)?;
        temp_file
            .write_all(change_set.new_text.as_bytes())
            .map_err(write_err)?;
        temp_file.flush().map_err(write_err)?;

        if let Ok(metadata) = fs::metadata(path) {
            fs::set_permissions(temp_file.path(), metadata.permissions()).map_err(write_err)?;
        }

        temp_file
            .persist(path)
            .map_err(|e| write_err(e.error))?;

        tracing::info!(
            file = %path.display(),
            substitutions = change_set.substitutions(),
            "rewrote file"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scan_str(text: &str, aggressive: bool) -> FileChangeSet {
        RewriteEngine::new(aggressive).scan_text(Path::new("mem.cpp"), text.to_string())
    }

    #[test]
    fn test_scan_text_rewrites_and_records() {
        let cs = scan_str("int a;\n#include \"Source\\Public\\Foo.h\"\n", false);
        assert_eq!(cs.new_text, "int a;\n#include \"Source/Public/Foo.h\"\n");
        assert_eq!(cs.substitutions(), 2);
        assert!(cs.matches.iter().all(|m| m.line_number == 2));
        assert_eq!(cs.line_changes.len(), 1);
        assert_eq!(cs.line_changes[0].old, "#include \"Source\\Public\\Foo.h\"");
    }

    #[test]
    fn test_unchanged_text_is_identical() {
        let text = "int main() {\r\n    return 0;\r\n}";
        let cs = scan_str(text, true);
        assert!(!cs.is_changed());
        assert_eq!(cs.new_text, text);
    }

    #[test]
    fn test_crlf_and_lf_endings_preserved() {
        let text = "a = \"Dir\\File.h\"\r\nb = \"Dir\\Other.h\"\nc = \"Last\\One.h\"";
        let cs = scan_str(text, false);
        assert_eq!(
            cs.new_text,
            "a = \"Dir/File.h\"\r\nb = \"Dir/Other.h\"\nc = \"Last/One.h\""
        );
        assert_eq!(cs.new_text.matches("\r\n").count(), 1);
        assert_eq!(cs.new_text.matches('\n').count(), 2);
    }

    #[test]
    fn test_spans_are_within_line_bounds() {
        let text = "x \\\\server\\share y\r\n\"C:\\\\A\\\\B\"\n";
        let cs = scan_str(text, true);
        let lines: Vec<&str> = cs.original_text.lines().collect();
        for m in &cs.matches {
            let line = lines[m.line_number - 1];
            assert!(m.column_span.0 < m.column_span.1);
            assert!(m.column_span.1 <= line.len());
            assert_eq!(&line[m.column_span.0..m.column_span.1], m.original_fragment);
        }
    }

    #[test]
    fn test_decode_rejects_binary_and_invalid_utf8() {
        assert!(matches!(decode(b"ok\n".to_vec()), Decoded::Text(_)));
        assert!(matches!(
            decode(vec![0x7f, 0x45, 0x4c, 0x46, 0x00, 0x01]),
            Decoded::Skip(SkipReason::Binary)
        ));
        assert!(matches!(
            decode(vec![b'a', 0xff, 0xfe]),
            Decoded::Skip(SkipReason::InvalidUtf8 { valid_up_to: 1 })
        ));
    }

    #[test]
    fn test_scan_file_skips_binary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.h");
        fs::write(&path, [0u8, 159, 146, 150]).unwrap();
        let outcome = RewriteEngine::new(false).scan_file(&path).unwrap();
        assert!(matches!(outcome, ScanOutcome::Skipped { .. }));
    }

    #[test]
    fn test_scan_file_missing_is_read_error() {
        let dir = TempDir::new().unwrap();
        let err = RewriteEngine::new(false)
            .scan_file(&dir.path().join("missing.cpp"))
            .unwrap_err();
        assert!(matches!(err, Win2NixError::Read { .. }));
    }

    #[test]
    fn test_apply_writes_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.ini");
        fs::write(&path, "Path=Content\\Maps\\Main.umap\r\n").unwrap();

        let engine = RewriteEngine::new(false);
        let ScanOutcome::Scanned(cs) = engine.scan_file(&path).unwrap() else {
            panic!("expected text file");
        };
        assert!(engine.apply(&cs).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "Path=Content/Maps/Main.umap\r\n");

        let ScanOutcome::Scanned(again) = engine.scan_file(&path).unwrap() else {
            panic!("expected text file");
        };
        assert!(again.matches.is_empty());
        assert!(!engine.apply(&again).unwrap());
    }

    #[test]
    fn test_apply_without_matches_does_not_touch_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clean.h");
        fs::write(&path, "#pragma once\n").unwrap();
        let before = fs::metadata(&path).unwrap().modified().unwrap();

        let engine = RewriteEngine::new(true);
        let ScanOutcome::Scanned(cs) = engine.scan_file(&path).unwrap() else {
            panic!("expected text file");
        };
        assert!(!engine.apply(&cs).unwrap());
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
    }

    #[cfg(unix)]
    #[test]
    fn test_apply_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tool.ini");
        fs::write(&path, "Dir=Tools\\Bin\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let engine = RewriteEngine::new(false);
        let ScanOutcome::Scanned(cs) = engine.scan_file(&path).unwrap() else {
            panic!("expected text file");
        };
        engine.apply(&cs).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    fn test_apply_failure_leaves_original() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone").join("x.h");
        let cs = FileChangeSet {
            file_path: path.clone(),
            matches: vec![Match {
                line_number: 1,
                column_span: (1, 2),
                original_fragment: "\\".to_string(),
                replacement_fragment: "/".to_string(),
            }],
            line_changes: Vec::new(),
            original_text: "a\\b".to_string(),
            new_text: "a/b".to_string(),
        };
        let err = RewriteEngine::new(false).apply(&cs).unwrap_err();
        assert!(matches!(err, Win2NixError::Write { .. }));
        assert!(!path.exists());
    }
}
