//! Interactive sorting session.
//!
//! A `Session` is the controller that lives as long as the process does. It
//! holds the target directory, the custom rule rows, the file filters, and the
//! undo history, and exposes the organize and undo operations to whatever
//! front end drives it.

use crate::config::{CompiledFilters, ConfigError};
use crate::file_category::{ExtensionMapping, ReferenceCategory, RuleRow};
use crate::file_organizer::{
    FileOrganizer, OrganizeError, OrganizeOutcome, OrganizeResult, PlannedMove, ProgressSink,
};
use crate::undo::{UndoReport, UndoStack};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

/// Which mapping an organize run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MappingMode {
    /// The built-in Documents/Images/Media table.
    #[default]
    Default,
    /// The session's custom rule rows.
    Custom,
}

/// Errors from building the mapping for a run.
#[derive(Debug)]
pub enum SessionError {
    Config(ConfigError),
    Organize(OrganizeError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Config(e) => write!(f, "{}", e),
            SessionError::Organize(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        SessionError::Config(e)
    }
}

impl From<OrganizeError> for SessionError {
    fn from(e: OrganizeError) -> Self {
        SessionError::Organize(e)
    }
}

/// Owns the state shared between organize and undo calls.
pub struct Session {
    target_dir: PathBuf,
    filters: CompiledFilters,
    rules: Vec<RuleRow>,
    undo_stack: UndoStack,
}

impl Session {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            filters: CompiledFilters::allow_all(),
            rules: Vec::new(),
            undo_stack: UndoStack::new(),
        }
    }

    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_rules(mut self, rules: Vec<RuleRow>) -> Self {
        self.rules = rules;
        self
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn set_target_dir(&mut self, target_dir: impl Into<PathBuf>) {
        self.target_dir = target_dir.into();
    }

    pub fn rules(&self) -> &[RuleRow] {
        &self.rules
    }

    pub fn add_rule(&mut self, rule: RuleRow) {
        self.rules.push(rule);
    }

    /// Removes every rule for `folder`. Returns whether anything was removed.
    pub fn remove_rule(&mut self, folder: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.folder.trim() != folder.trim());
        self.rules.len() != before
    }

    pub fn clear_rules(&mut self) {
        self.rules.clear();
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo_stack
    }

    /// Builds the mapping a run in `mode` would use.
    pub fn mapping(&self, mode: MappingMode) -> Result<ExtensionMapping, ConfigError> {
        match mode {
            MappingMode::Default => Ok(ExtensionMapping::default_mapping()),
            MappingMode::Custom => ExtensionMapping::from_rules(&self.rules),
        }
    }

    /// Organizes the target directory and records the run for undo.
    ///
    /// Runs that moved nothing are not added to the undo history.
    pub fn organize(
        &mut self,
        mode: MappingMode,
        progress: &mut dyn ProgressSink,
    ) -> Result<OrganizeOutcome, SessionError> {
        let mapping = self.mapping(mode)?;
        let outcome =
            FileOrganizer::organize_filtered(&self.target_dir, &mapping, &self.filters, progress)?;

        if let OrganizeOutcome::Completed(report) = &outcome {
            self.undo_stack.push(report.batch.clone());
        }
        Ok(outcome)
    }

    /// Lists what `organize` would do in `mode`.
    pub fn plan(&self, mode: MappingMode) -> Result<Vec<PlannedMove>, SessionError> {
        let mapping = self.mapping(mode)?;
        Ok(FileOrganizer::plan(&self.target_dir, &mapping, &self.filters)?)
    }

    /// Reverts the most recent recorded run.
    pub fn undo_last(&mut self) -> OrganizeResult<UndoReport> {
        self.undo_stack.undo_last()
    }
}

/// A line typed into the interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Organize(MappingMode),
    DryRun(MappingMode),
    Undo,
    AddRule(RuleRow),
    RemoveRule(String),
    ClearRules,
    ShowRules,
    History,
    Categories,
    Help,
    Quit,
}

impl SessionCommand {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    ///
    /// ```
    /// use dirsort::session::{MappingMode, SessionCommand};
    ///
    /// assert_eq!(SessionCommand::parse("custom"), Ok(Some(SessionCommand::Organize(MappingMode::Custom))));
    /// assert_eq!(SessionCommand::parse("   "), Ok(None));
    /// ```
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "" => return Ok(None),
            "default" | "organize" => SessionCommand::Organize(MappingMode::Default),
            "custom" => SessionCommand::Organize(MappingMode::Custom),
            "preview" | "dry-run" => SessionCommand::DryRun(parse_mode(rest)?),
            "undo" => SessionCommand::Undo,
            "add" => SessionCommand::AddRule(parse_add(rest)?),
            "remove" | "rm" if !rest.is_empty() => SessionCommand::RemoveRule(rest.to_string()),
            "remove" | "rm" => return Err("usage: remove <folder>".to_string()),
            "clear" => SessionCommand::ClearRules,
            "rules" => SessionCommand::ShowRules,
            "history" => SessionCommand::History,
            "categories" => SessionCommand::Categories,
            "help" | "?" => SessionCommand::Help,
            "quit" | "exit" | "q" => SessionCommand::Quit,
            other => return Err(format!("unknown command '{}' (try 'help')", other)),
        };
        Ok(Some(command))
    }
}

fn parse_mode(rest: &str) -> Result<MappingMode, String> {
    if rest.is_empty() {
        return Ok(MappingMode::Default);
    }
    MappingMode::from_str(rest, true).map_err(|_| format!("unknown mode '{}'", rest))
}

/// `add <folder...> <category>`: the last word is the category, the rest the
/// folder name, so folder names may contain spaces.
fn parse_add(rest: &str) -> Result<RuleRow, String> {
    let (folder, category) = rest
        .rsplit_once(char::is_whitespace)
        .ok_or_else(|| "usage: add <folder> <category>".to_string())?;
    let category: ReferenceCategory = category.parse()?;
    Ok(RuleRow::new(folder.trim(), category))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_organizer::NoProgress;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            SessionCommand::parse("DEFAULT"),
            Ok(Some(SessionCommand::Organize(MappingMode::Default)))
        );
        assert_eq!(
            SessionCommand::parse("preview custom"),
            Ok(Some(SessionCommand::DryRun(MappingMode::Custom)))
        );
        assert_eq!(SessionCommand::parse("undo"), Ok(Some(SessionCommand::Undo)));
        assert_eq!(
            SessionCommand::parse("add Tax Papers documents"),
            Ok(Some(SessionCommand::AddRule(RuleRow::new(
                "Tax Papers",
                ReferenceCategory::Documents
            ))))
        );
        assert_eq!(
            SessionCommand::parse("remove Tax Papers"),
            Ok(Some(SessionCommand::RemoveRule("Tax Papers".to_string())))
        );
        assert_eq!(SessionCommand::parse("q"), Ok(Some(SessionCommand::Quit)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(SessionCommand::parse("explode").is_err());
        assert!(SessionCommand::parse("add Work").is_err());
        assert!(SessionCommand::parse("add Work Fonts").is_err());
        assert!(SessionCommand::parse("remove").is_err());
        assert!(SessionCommand::parse("preview sideways").is_err());
    }

    #[test]
    fn test_custom_without_rules() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.pdf"), "x").expect("Failed to write file");
        let mut session = Session::new(temp_dir.path());

        let result = session.organize(MappingMode::Custom, &mut NoProgress);

        assert!(matches!(
            result,
            Err(SessionError::Organize(OrganizeError::NoRulesDefined))
        ));
        assert!(temp_dir.path().join("a.pdf").exists());
    }

    #[test]
    fn test_blank_rule_counts_as_no_rules() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut session = Session::new(temp_dir.path());
        session.add_rule(RuleRow::new("   ", ReferenceCategory::Images));

        let result = session.organize(MappingMode::Custom, &mut NoProgress);
        assert!(matches!(
            result,
            Err(SessionError::Organize(OrganizeError::NoRulesDefined))
        ));
    }

    #[test]
    fn test_organize_records_only_productive_runs() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("archive.zip"), "x").expect("Failed to write file");
        let mut session = Session::new(base_path);

        session
            .organize(MappingMode::Default, &mut NoProgress)
            .expect("organize failed");
        assert!(session.undo_stack().is_empty());

        fs::write(base_path.join("a.txt"), "x").expect("Failed to write file");
        session
            .organize(MappingMode::Default, &mut NoProgress)
            .expect("organize failed");
        assert_eq!(session.undo_stack().len(), 1);
    }

    #[test]
    fn test_rules_editing() {
        let mut session = Session::new("/tmp");
        session.add_rule(RuleRow::new("Work", ReferenceCategory::Documents));
        session.add_rule(RuleRow::new("Pics", ReferenceCategory::Images));

        assert!(session.remove_rule("Work"));
        assert!(!session.remove_rule("Work"));
        assert_eq!(session.rules().len(), 1);

        session.clear_rules();
        assert!(session.rules().is_empty());
    }

    #[test]
    fn test_session_undo_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("a.pdf"), "a").expect("Failed to write file");
        fs::write(base_path.join("b.pdf"), "b").expect("Failed to write file");

        let mut session = Session::new(base_path)
            .with_rules(vec![RuleRow::new("Work", ReferenceCategory::Documents)]);

        session
            .organize(MappingMode::Custom, &mut NoProgress)
            .expect("organize failed");
        assert!(base_path.join("Work").join("a.pdf").exists());
        assert!(base_path.join("Work").join("b.pdf").exists());

        let report = session.undo_last().expect("undo failed");
        assert_eq!(report.restored_files, 2);
        assert!(base_path.join("a.pdf").exists());
        assert!(base_path.join("b.pdf").exists());

        assert!(matches!(
            session.undo_last(),
            Err(OrganizeError::NothingToUndo)
        ));
    }
}
