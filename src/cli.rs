//! Command-line interface module for dirsort.
//!
//! This module handles:
//! - Argument parsing (clap)
//! - Resolving configuration, filters, and custom rules
//! - One-shot organize and dry runs
//! - The interactive session loop, which keeps undo history for its lifetime

use crate::config::{ConfigError, SortConfig, load_rules_file};
use crate::file_category::RuleRow;
use crate::file_organizer::{OrganizeError, OrganizeOutcome};
use crate::output::OutputFormatter;
use crate::session::{MappingMode, Session, SessionCommand, SessionError};
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Sort the files of a directory into extension-based subfolders.
#[derive(Debug, Parser)]
#[command(name = "dirsort", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Organize a directory once and exit
    Organize {
        /// Directory whose top-level files are sorted
        #[arg(value_hint = clap::ValueHint::DirPath)]
        dir: PathBuf,

        /// Use the built-in mapping or the custom rules
        #[arg(short, long, value_enum, default_value_t = MappingMode::Default)]
        mode: MappingMode,

        /// Show what would be moved without moving anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        #[command(flatten)]
        sources: SourceArgs,
    },
    /// Start an interactive session that can undo its runs
    Session {
        /// Directory whose top-level files are sorted
        #[arg(value_hint = clap::ValueHint::DirPath)]
        dir: PathBuf,

        #[command(flatten)]
        sources: SourceArgs,
    },
    /// List the categories custom rules can use
    Categories,
}

/// Where configuration and custom rules come from.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Configuration file (defaults to .dirsortrc.toml, then ~/.config/dirsort/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON rules file; replaces the rules stored in the configuration
    #[arg(short, long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Extra custom rule, repeatable
    #[arg(long = "rule", value_name = "FOLDER=CATEGORY")]
    pub rule: Vec<RuleRow>,
}

/// Errors that end the program.
#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Organize(OrganizeError),
    Io(io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Organize(OrganizeError::DirectoryNotFound { .. }) => 2,
            _ => 1,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "{}", e),
            CliError::Organize(e) => write!(f, "{}", e),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<OrganizeError> for CliError {
    fn from(e: OrganizeError) -> Self {
        CliError::Organize(e)
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Config(e) => CliError::Config(e),
            SessionError::Organize(e) => CliError::Organize(e),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

/// Runs the parsed command line.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use dirsort::cli::{Cli, run};
///
/// let cli = Cli::parse_from(["dirsort", "organize", "/path/to/directory"]);
/// if let Err(e) = run(cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Organize {
            dir,
            mode,
            dry_run,
            sources,
        } => {
            let mut session = build_session(&dir, &sources)?;
            if dry_run {
                organize_dry_run(&session, mode)
            } else {
                organize_once(&mut session, mode)
            }
        }
        Command::Session { dir, sources } => {
            let mut session = build_session(&dir, &sources)?;
            let stdin = io::stdin();
            run_session(&mut session, stdin.lock())
        }
        Command::Categories => {
            OutputFormatter::reference_categories();
            Ok(())
        }
    }
}

/// Loads configuration and rules and creates a session for `dir`.
///
/// Rules come from the JSON rules file when one is given, otherwise from the
/// configuration; `--rule` rows are appended after either.
pub fn build_session(dir: &Path, sources: &SourceArgs) -> Result<Session, CliError> {
    let config = SortConfig::load(sources.config.as_deref())?;
    let filters = config.compile_filters()?;

    let mut rules = match &sources.rules {
        Some(path) => load_rules_file(path)?,
        None => config.rules,
    };
    rules.extend(sources.rule.iter().cloned());

    Ok(Session::new(dir).with_filters(filters).with_rules(rules))
}

/// Organizes once, printing progress and a summary.
///
/// `NothingToOrganize` is reported and counts as success.
pub fn organize_once(session: &mut Session, mode: MappingMode) -> Result<(), CliError> {
    OutputFormatter::info(&format!(
        "Organizing contents of: {}",
        session.target_dir().display()
    ));
    warn_overlaps(session, mode);

    let mut progress = OutputFormatter::create_progress_bar(0);
    match session.organize(mode, &mut progress)? {
        OrganizeOutcome::NothingToOrganize => {
            OutputFormatter::info("All clean: no files found to organize.");
        }
        OrganizeOutcome::Completed(report) => OutputFormatter::organize_report(&report),
    }
    Ok(())
}

/// Prints the moves an organize run would make.
pub fn organize_dry_run(session: &Session, mode: MappingMode) -> Result<(), CliError> {
    OutputFormatter::dry_run_notice(&format!(
        "Analyzing contents of: {}",
        session.target_dir().display()
    ));
    warn_overlaps(session, mode);

    let planned = session.plan(mode)?;
    OutputFormatter::dry_run_plan(&planned);
    OutputFormatter::success("Dry run complete. No files were modified.");
    Ok(())
}

fn warn_overlaps(session: &Session, mode: MappingMode) {
    if let Ok(mapping) = session.mapping(mode) {
        for (ext, winner, shadowed) in mapping.overlaps() {
            OutputFormatter::warning(&format!(
                "{} is claimed by both {} and {}; files go to {}.",
                ext, winner, shadowed, winner
            ));
        }
    }
}

const SESSION_HELP: &str = "\
Commands:
  default               organize with the built-in mapping
  custom                organize with the custom rules
  preview [mode]        show what a run would move
  undo                  revert the most recent run
  add <folder> <cat>    add a custom rule (see 'categories')
  remove <folder>       remove the rules for a folder
  clear                 remove all custom rules
  rules                 list the custom rules
  history               list the runs that can be undone
  categories            list the reference categories
  quit                  leave the session";

/// Reads commands from `input` until it ends or `quit` is entered.
///
/// Errors from individual commands are printed and the loop continues.
pub fn run_session<R: BufRead>(session: &mut Session, input: R) -> Result<(), CliError> {
    OutputFormatter::info(&format!(
        "Session started for {}. Type 'help' for commands.",
        session.target_dir().display()
    ));

    let mut lines = input.lines();
    loop {
        print!("dirsort> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        match SessionCommand::parse(&line?) {
            Ok(Some(command)) => {
                if !execute(session, command) {
                    break;
                }
            }
            Ok(None) => {}
            Err(message) => OutputFormatter::error(&message),
        }
    }
    Ok(())
}

/// Executes one session command. Returns false when the session should end.
pub fn execute(session: &mut Session, command: SessionCommand) -> bool {
    match command {
        SessionCommand::Organize(mode) => {
            if let Err(e) = organize_once(session, mode) {
                OutputFormatter::error(&e.to_string());
            }
        }
        SessionCommand::DryRun(mode) => {
            if let Err(e) = organize_dry_run(session, mode) {
                OutputFormatter::error(&e.to_string());
            }
        }
        SessionCommand::Undo => match session.undo_last() {
            Ok(report) => OutputFormatter::undo_report(&report),
            Err(OrganizeError::NothingToUndo) => OutputFormatter::info("Nothing to undo."),
            Err(e) => OutputFormatter::error(&e.to_string()),
        },
        SessionCommand::AddRule(rule) => {
            OutputFormatter::success(&format!("Added rule {} → {}", rule.folder, rule.category));
            session.add_rule(rule);
        }
        SessionCommand::RemoveRule(folder) => {
            if session.remove_rule(&folder) {
                OutputFormatter::success(&format!("Removed rules for {}", folder));
            } else {
                OutputFormatter::warning(&format!("No rule for folder '{}'", folder));
            }
        }
        SessionCommand::ClearRules => {
            session.clear_rules();
            OutputFormatter::success("Cleared all custom rules");
        }
        SessionCommand::ShowRules => show_rules(session),
        SessionCommand::History => show_history(session),
        SessionCommand::Categories => OutputFormatter::reference_categories(),
        SessionCommand::Help => OutputFormatter::plain(SESSION_HELP),
        SessionCommand::Quit => return false,
    }
    true
}

fn show_rules(session: &Session) {
    if session.rules().is_empty() {
        OutputFormatter::info("No custom rules. Add one with 'add <folder> <category>'.");
        return;
    }
    OutputFormatter::header("CUSTOM RULES");
    match session.mapping(MappingMode::Custom) {
        Ok(mapping) if mapping.is_empty() => {
            OutputFormatter::warning("Every rule has a blank folder name.")
        }
        Ok(mapping) => OutputFormatter::mapping(&mapping),
        Err(e) => OutputFormatter::error(&e.to_string()),
    }
}

fn show_history(session: &Session) {
    let stack = session.undo_stack();
    if stack.is_empty() {
        OutputFormatter::info("No runs to undo.");
        return;
    }
    OutputFormatter::header("HISTORY (newest last)");
    for (i, batch) in stack.iter().enumerate() {
        OutputFormatter::plain(&format!(
            "  {}. {}  {}  {} moved",
            i + 1,
            batch.timestamp,
            batch.base_path.display(),
            batch.len()
        ));
    }
}
