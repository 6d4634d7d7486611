//! Configuration loading for dirsort.
//!
//! A TOML configuration file may carry two things:
//! - file filters that keep certain files out of a sorting run
//! - stored custom rules (folder name + reference category)
//!
//! Custom rules can also come from a standalone JSON rules file.
//!
//! # Configuration File Format
//!
//! ```toml
//! [filters]
//! skip_hidden = false
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.part"]
//! extensions = ["tmp", ".crdownload"]
//! regex = ["^~\\$"]
//!
//! [filters.include]
//! patterns = []
//!
//! [[rules]]
//! folder = "Work"
//! category = "Documents"
//! ```
//!
//! # Rules File Format
//!
//! ```json
//! [
//!   { "folder": "Work", "category": "Documents" },
//!   { "folder": "Pictures", "category": "Images" }
//! ]
//! ```

use crate::file_category::{RuleRow, extension_of};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".dirsortrc.toml";

/// Errors that can occur while loading configuration or rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Configuration or rules file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML/JSON syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// A rule folder name that would point outside the target directory.
    InvalidFolderName(String),
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::InvalidFolderName(name) => write!(
                f,
                "Invalid folder name '{}': must be a single folder inside the target directory",
                name
            ),
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortConfig {
    /// Rules deciding which files take part in a run.
    #[serde(default)]
    pub filters: FilterRules,

    /// Stored custom rules, used by the custom organize mode.
    #[serde(default)]
    pub rules: Vec<RuleRow>,
}

/// File filter rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Leave files whose name starts with "." out of the run. Defaults to false.
    #[serde(default)]
    pub skip_hidden: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

/// Rules for excluding files from a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "desktop.ini", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name (e.g., "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions to exclude, with or without the leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl SortConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.dirsortrc.toml` in the current directory
    /// 3. Look for `~/.config/dirsort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file fails to parse.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dirsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = read_file(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compile the filter section into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Loads custom rules from a JSON rules file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file is missing and `ConfigInvalid` if it is
/// not a JSON array of `{ "folder", "category" }` objects.
pub fn load_rules_file(path: &Path) -> Result<Vec<RuleRow>, ConfigError> {
    let content = read_file(path)?;
    serde_json::from_str(&content)
        .map_err(|e| ConfigError::ConfigInvalid(format!("{}: {}", path.display(), e)))
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))
}

/// Pre-compiled filter rules.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    skip_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    /// Filters that let every file through.
    pub fn allow_all() -> Self {
        Self::default()
    }

    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip_hidden: rules.skip_hidden,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Check whether a file takes part in a run.
    ///
    /// Only the file name is inspected. Checks run in this order:
    /// 1. Include patterns - if matched, always include
    /// 2. Hidden file filter
    /// 3. Exact filename match
    /// 4. Extension match
    /// 5. Glob patterns
    /// 6. Regex patterns
    /// 7. Default: include
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.include_patterns.iter().any(|p| p.matches(&file_name)) {
            return true;
        }

        if self.skip_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(&*file_name) {
            return false;
        }

        let ext = extension_of(&file_name);
        if !ext.is_empty() && self.exclude_extensions.contains(&ext[1..]) {
            return false;
        }

        if self.exclude_patterns.iter().any(|p| p.matches(&file_name)) {
            return false;
        }

        !self.exclude_regexes.iter().any(|r| r.is_match(&file_name))
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}
