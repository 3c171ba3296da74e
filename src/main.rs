use anyhow::{Context, Result};
use colored::*;
use std::process::ExitCode;
use win2nix::cli::{self, Cli};
use win2nix::diff_formatter::DiffFormatter;
use win2nix::runner::{self, RunOptions};
use win2nix::{Win2NixError, config, logger};

fn main() -> ExitCode {
    let cli = cli::parse_args();
    cli.color.apply();

    // Logging problems must not stop the conversion itself
    let _log_guard = match logger::init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: could not initialize logging: {:#}", e);
            None
        }
    };

    match execute(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "run aborted");
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(1)
        }
    }
}

fn execute(cli: &Cli) -> Result<u8> {
    let config = config::load_config(cli.config.as_deref(), &cli.root)
        .context("Failed to load configuration")?;
    let filter = config
        .into_filter_config(&cli.overrides())
        .context("Invalid filter settings")?;

    let options = RunOptions {
        root: cli.root.clone(),
        dry_run: cli.dry_run,
        filter,
    };

    let summary = match runner::run(options) {
        Ok(summary) => summary,
        Err(e @ Win2NixError::InvalidRoot { .. }) => return Err(e.into()),
        Err(e) => return Err(anyhow::Error::new(e).context("Could not start the run")),
    };

    if cli.json {
        let json = DiffFormatter::format_json(&summary).context("Failed to serialize summary")?;
        println!("{}", json);
    } else {
        print!("{}", DiffFormatter::format_report(&summary, cli.diff));
    }

    Ok(summary.exit_code())
}
