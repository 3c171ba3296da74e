use crate::diff_formatter::ColorChoice;
use clap::Parser;
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "

License: MIT
Rust Edition: 2024"
);

#[derive(Parser, Debug)]
#[command(name = "win2nix")]
#[command(about = "Rewrite Windows-style path separators to forward slashes")]
#[command(long_about = "win2nix walks a project tree and rewrites Windows-style path
separators (\\) to forward slashes (/) in text source files.

Files are treated as plain text. A backslash is only rewritten when it sits
inside something that looks like a path, so escape sequences such as \\n
and regex escapes are left alone.

MODES:
  default        Convert single backslashes in path-like text
  --aggressive   Also collapse escaped pairs (\\\\ becomes /) and normalize
                 mixed separators such as C:\\Game/Content\\Maps

CONFIG:
  Settings may also come from <ROOT>/.win2nix.toml or ~/.win2nix/config.toml.
  Command-line flags take precedence.

EXIT CODES:
  0  success (including dry runs)
  1  invalid root path or invalid configuration
  2  one or more files could not be read or written

EXAMPLES:
  win2nix . --dry-run                      Preview changes
  win2nix MyGame --aggressive              Convert, including escaped pairs
  win2nix . --ext cs --ext ini             Only .cs and .ini files
  win2nix . --exclude 'ThirdParty/**'      Skip a directory
  win2nix . --dry-run --diff               Preview as unified diffs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = LONG_VERSION)]
pub struct Cli {
    /// Directory to scan
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Preview changes without modifying files
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Also collapse escaped backslash pairs and normalize mixed separators
    #[arg(short = 'a', long)]
    pub aggressive: bool,

    /// Only process files matching this glob (relative to ROOT, repeatable)
    #[arg(long, value_name = "GLOB")]
    pub include: Vec<String>,

    /// Skip files and directories matching this glob (relative to ROOT, repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// File extension to process (repeatable or comma-separated)
    #[arg(long = "ext", value_name = "EXT", value_delimiter = ',')]
    #[arg(help = "File extension to process (repeatable or comma-separated)\nDefault: .cpp, .h, .hpp, .ini, .uplugin")]
    pub extensions: Vec<String>,

    /// Do not skip .git, Binaries and Intermediate directories
    #[arg(long)]
    pub no_default_excludes: bool,

    /// Read settings from this TOML file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show unified diffs instead of changed lines
    #[arg(long)]
    pub diff: bool,

    /// Print the run summary as JSON
    #[arg(long, conflicts_with = "diff")]
    pub json: bool,

    /// When to use colors
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto, value_name = "WHEN")]
    pub color: ColorChoice,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn overrides(&self) -> crate::config::Overrides {
        crate::config::Overrides {
            extensions: self.extensions.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            no_default_excludes: self.no_default_excludes,
            aggressive: self.aggressive,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
