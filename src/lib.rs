//! win2nix: rewrite Windows-style path separators in a source tree
//!
//! The library exposes the scanning and rewriting engine so it can be
//! driven from tests or other tools. The binary is at src/main.rs.

pub mod cli;
pub mod config;
pub mod diff_formatter;
pub mod error;
pub mod filter;
pub mod logger;
pub mod matcher;
pub mod report;
pub mod rewrite;
pub mod runner;
pub mod walker;

// Re-export commonly used types for convenience
pub use error::{Result, Win2NixError};
pub use filter::{FileFilter, FilterConfig};
pub use matcher::{Match, find_matches, rewrite_line};
pub use report::{ReportBuilder, RunSummary};
pub use rewrite::{Decoded, FileChangeSet, RewriteEngine, ScanOutcome, SkipReason};
pub use runner::{RunOptions, Runner, run};
pub use walker::FileWalker;
