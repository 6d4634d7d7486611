//! dirsort - sort the files of a directory into extension-based subfolders
//!
//! This library classifies the top-level files of a directory by extension,
//! moves them into category folders using either a built-in mapping or
//! user-defined rules, and keeps an in-memory undo history of each run.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod session;
pub mod undo;

pub use config::{CompiledFilters, ConfigError, SortConfig};
pub use file_category::{ExtensionMapping, ReferenceCategory, RuleRow};
pub use file_organizer::{
    FileOrganizer, MoveRecord, NoProgress, OrganizeError, OrganizeOutcome, OrganizeReport,
    ProgressSink, UndoBatch,
};
pub use session::{MappingMode, Session};
pub use undo::{UndoReport, UndoStack};
