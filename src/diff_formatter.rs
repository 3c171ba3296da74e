use crate::report::RunSummary;
use crate::rewrite::FileChangeSet;
use colored::*;
use similar::TextDiff;
use std::io::IsTerminal;
use std::path::Path;

/// When to emit ANSI colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// Resolve the choice against `NO_COLOR` and the terminal
    pub fn should_use_color(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                // https://no-color.org/
                if std::env::var_os("NO_COLOR").is_some() {
                    return false;
                }
                std::io::stdout().is_terminal()
            }
        }
    }

    /// Apply the choice to the `colored` crate globally
    pub fn apply(self) {
        colored::control::set_override(self.should_use_color());
    }
}

pub struct DiffFormatter;

impl DiffFormatter {
    fn display_path(root: &Path, path: &Path) -> String {
        path.strip_prefix(root)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    fn plural(count: usize, word: &str) -> String {
        if count == 1 {
            format!("{} {}", count, word)
        } else {
            format!("{} {}s", count, word)
        }
    }

    /// Format the report header
    pub fn format_header(summary: &RunSummary) -> String {
        let label = if summary.dry_run { "Dry run:" } else { "Converting:" };
        format!("{} {}\n\n", label.bold().cyan(), summary.root.display().to_string().white().bold())
    }

    /// Format one file's changes.
    ///
    /// With `show_lines`, every changed line is printed before and after.
    pub fn format_change_set(change_set: &FileChangeSet, root: &Path, show_lines: bool) -> String {
        let mut output = String::new();
        let path = Self::display_path(root, &change_set.file_path);

        output.push_str(&format!(
            "{} ({})\n",
            path.bold().cyan(),
            Self::plural(change_set.substitutions(), "substitution")
        ));

        if show_lines {
            for change in &change_set.line_changes {
                output.push_str(&format!(
                    "  L{}: {} {}\n",
                    change.line_number.to_string().white().bold(),
                    "-".red().bold(),
                    change.old.red()
                ));
                output.push_str(&format!(
                    "  L{}: {} {}\n",
                    change.line_number.to_string().white().bold(),
                    "+".green().bold(),
                    change.new.green()
                ));
                output.push_str(&Self::format_columns(change_set, change.line_number));
            }
        }

        output
    }

    /// Where each substitution on a line sits: `  L{n}: col 15 \ -> /, ...`
    fn format_columns(change_set: &FileChangeSet, line_number: usize) -> String {
        let columns: Vec<String> = change_set
            .matches
            .iter()
            .filter(|m| m.line_number == line_number)
            .map(|m| {
                format!(
                    "col {} {} -> {}",
                    m.column_span.0 + 1,
                    m.original_fragment,
                    m.replacement_fragment
                )
            })
            .collect();
        format!(
            "  L{}: {}\n",
            line_number.to_string().white().bold(),
            columns.join(", ").dimmed()
        )
    }

    /// Unified diff of one file's original and new text
    pub fn format_unified_diff(change_set: &FileChangeSet, root: &Path) -> String {
        let path = Self::display_path(root, &change_set.file_path);
        let diff = TextDiff::from_lines(change_set.original_text.as_str(), change_set.new_text.as_str());
        let rendered = diff
            .unified_diff()
            .context_radius(2)
            .header(&format!("a/{}", path), &format!("b/{}", path))
            .to_string();

        let mut output = String::new();
        for line in rendered.lines() {
            let styled = if line.starts_with("+++") || line.starts_with("---") {
                line.bold().to_string()
            } else if line.starts_with('+') {
                line.green().to_string()
            } else if line.starts_with('-') {
                line.red().to_string()
            } else if line.starts_with("@@") {
                line.cyan().to_string()
            } else {
                line.to_string()
            };
            output.push_str(&styled);
            output.push('\n');
        }
        output
    }

    /// Skipped files, per-file failures and directory warnings
    pub fn format_issues(summary: &RunSummary) -> String {
        let mut output = String::new();

        if !summary.skipped.is_empty() {
            output.push_str(&format!("{}\n", "Skipped:".yellow().bold()));
            for skipped in &summary.skipped {
                output.push_str(&format!(
                    "  {} ({})\n",
                    Self::display_path(&summary.root, &skipped.path),
                    skipped.reason
                ));
            }
        }

        if !summary.failures.is_empty() {
            output.push_str(&format!("{}\n", "Failed:".red().bold()));
            for failure in &summary.failures {
                output.push_str(&format!("  {}\n", failure.message));
            }
        }

        if !summary.warnings.is_empty() {
            output.push_str(&format!("{}\n", "Warnings:".yellow().bold()));
            for warning in &summary.warnings {
                output.push_str(&format!("  {}\n", warning));
            }
        }

        output
    }

    /// Final totals line
    pub fn format_totals(summary: &RunSummary) -> String {
        let verb = if summary.dry_run { "would change" } else { "changed" };
        let mut output = format!(
            "\nTotal: {} in {} {} ({} scanned)",
            Self::plural(summary.total_substitutions, "substitution").bold().white(),
            Self::plural(summary.files_changed, "file"),
            verb,
            summary.files_scanned
        );
        if !summary.skipped.is_empty() {
            output.push_str(&format!(", {} skipped", summary.skipped.len()));
        }
        if !summary.failures.is_empty() {
            output.push_str(&format!(", {}", Self::plural(summary.failures.len(), "failure").red()));
        }
        output.push('\n');
        output
    }

    /// Full human-readable report
    pub fn format_report(summary: &RunSummary, show_diff: bool) -> String {
        let mut output = Self::format_header(summary);

        let mut any_changes = false;
        for change_set in summary.changed_files() {
            any_changes = true;
            if show_diff {
                output.push_str(&Self::format_change_set(change_set, &summary.root, false));
                output.push_str(&Self::format_unified_diff(change_set, &summary.root));
            } else {
                output.push_str(&Self::format_change_set(change_set, &summary.root, summary.dry_run));
            }
        }

        if !any_changes {
            output.push_str("No Windows-style paths found.\n");
        }

        let issues = Self::format_issues(summary);
        if !issues.is_empty() {
            output.push('\n');
            output.push_str(&issues);
        }

        output.push_str(&Self::format_totals(summary));
        output
    }

    /// Machine-readable report
    pub fn format_json(summary: &RunSummary) -> serde_json::Result<String> {
        serde_json::to_string_pretty(summary)
    }
}
