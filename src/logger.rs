//! Logging setup for win2nix
//!
//! Diagnostics go to stderr by default so they never mix with the report on
//! stdout. With `--log-file` they are written to that file instead.
//! `WIN2NIX_LOG` overrides the verbosity flags with a full `EnvFilter`
//! directive.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, registry};

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV_VAR: &str = "WIN2NIX_LOG";

/// Map `-v`/`-q` counts onto a filter directive
pub fn directive_for(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "win2nix=error";
    }
    match verbose {
        0 => "win2nix=warn",
        1 => "win2nix=info",
        2 => "win2nix=debug",
        _ => "win2nix=trace",
    }
}

fn build_filter(verbose: u8, quiet: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(directive_for(verbose, quiet)))
}

/// Initialize the global tracing subscriber.
///
/// The returned guard must stay alive for the rest of the program when a
/// log file is used, or buffered lines are lost.
pub fn init_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(verbose, quiet);

    let Some(log_path) = log_file else {
        let subscriber = registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .without_time(),
            )
            .with(filter);
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;
        return Ok(None);
    };

    let dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    let file_name = log_path
        .file_name()
        .with_context(|| format!("Log path has no file name: {}", log_path.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let subscriber = registry()
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_for_levels() {
        assert_eq!(directive_for(0, false), "win2nix=warn");
        assert_eq!(directive_for(1, false), "win2nix=info");
        assert_eq!(directive_for(2, false), "win2nix=debug");
        assert_eq!(directive_for(7, false), "win2nix=trace");
    }

    #[test]
    fn test_quiet_wins_over_verbose() {
        assert_eq!(directive_for(3, true), "win2nix=error");
    }
}
