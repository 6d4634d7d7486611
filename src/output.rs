//! Output formatting and styling module.
//!
//! Every message the CLI prints goes through `OutputFormatter`, so colours and
//! symbols stay consistent. Also hosts the progress bar used as the organize
//! progress sink.

use crate::file_category::{ExtensionMapping, ReferenceCategory};
use crate::file_organizer::{OrganizeReport, PlannedMove, ProgressSink};
use crate::undo::UndoReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;

/// Manages all CLI output with consistent styling and formatting.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for `total` files.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints a summary table with file counts by category.
    pub fn summary_table(category_counts: &HashMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let mut categories: Vec<_> = category_counts.iter().collect();
        categories.sort_by_key(|&(name, _)| name);

        let max_category_len = categories
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in &categories {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                file_word(**count),
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            file_word(total_files),
            width = max_category_len
        );
    }

    /// Prints the outcome of a completed organize run.
    pub fn organize_report(report: &OrganizeReport) {
        for failure in &report.failures {
            Self::error(&failure.to_string());
        }

        if report.moved_count() > 0 {
            Self::summary_table(&report.batch.category_counts(), report.moved_count());
        }

        if !report.unmatched.is_empty() {
            Self::info(&format!(
                "{} {} matched no rule and stayed in place.",
                report.unmatched.len(),
                file_word(report.unmatched.len())
            ));
        }

        if report.cancelled {
            Self::warning(&format!(
                "Run cancelled after {} of {} files.",
                report.processed, report.total
            ));
        }

        if report.moved_count() > 0 {
            Self::success(&format!(
                "Organized {} {} successfully!",
                report.moved_count(),
                file_word(report.moved_count())
            ));
        } else {
            Self::warning("No files were moved.");
        }

        if !report.failures.is_empty() {
            Self::warning(&format!(
                "{} {} could not be moved. Please review errors above.",
                report.failures.len(),
                file_word(report.failures.len())
            ));
        }
    }

    /// Prints the outcome of an undo.
    pub fn undo_report(report: &UndoReport) {
        Self::success(&format!(
            "Undo complete: {} {} returned to the original path.",
            report.restored_files,
            file_word(report.restored_files)
        ));

        if !report.skipped_files.is_empty() {
            Self::warning(&format!("Skipped: {}", report.skipped_files.len()));
            for (path, reason) in &report.skipped_files {
                Self::plain(&format!("    - {}: {}", path.display(), reason));
            }
        }

        if !report.failed_restores.is_empty() {
            Self::error(&format!("Failed: {}", report.failed_restores.len()));
            for (path, reason) in &report.failed_restores {
                eprintln!("    - {}: {}", path.display(), reason);
            }
        }
    }

    /// Prints the moves a dry run found.
    pub fn dry_run_plan(planned: &[PlannedMove]) {
        if planned.is_empty() {
            Self::dry_run_notice("No files match the current rules.");
            return;
        }

        Self::dry_run_notice("Files would be organized as follows:");
        let mut counts: HashMap<String, usize> = HashMap::new();
        for planned_move in planned {
            let name = planned_move
                .source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Self::plain(&format!(" - {}", name));
            Self::plain(&format!("   → Would move to {}/", planned_move.category));
            *counts.entry(planned_move.category.clone()).or_insert(0) += 1;
        }
        Self::summary_table(&counts, planned.len());
    }

    /// Prints the rules of a mapping, in match order.
    pub fn mapping(mapping: &ExtensionMapping) {
        for entry in mapping.entries() {
            Self::plain(&format!(
                "  {:<14} {}",
                entry.folder.bold(),
                entry.extensions.join(" ")
            ));
        }
        for (ext, winner, shadowed) in mapping.overlaps() {
            Self::warning(&format!(
                "{} is claimed by both {} and {}; {} wins.",
                ext, winner, shadowed, winner
            ));
        }
    }

    /// Prints the reference categories available to custom rules.
    pub fn reference_categories() {
        Self::header("CATEGORIES");
        for category in ReferenceCategory::ALL {
            Self::plain(&format!(
                "  {:<12} {}",
                category.name().bold(),
                category.extensions().join(" ")
            ));
        }
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

fn file_word(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

impl ProgressSink for ProgressBar {
    fn start(&mut self, total: usize) {
        self.set_length(total as u64);
        self.set_position(0);
    }

    fn tick(&mut self, processed: usize, _total: usize) {
        self.set_position(processed as u64);
    }

    fn finish(&mut self) {
        self.finish_and_clear();
    }
}
