//! Extension mappings used to route files into category folders.
//!
//! A mapping is an ordered list of destination folders, each owning a set of
//! lowercase extensions (with the leading dot). The first folder that claims
//! an extension wins.
//!
//! # Examples
//!
//! ```
//! use dirsort::file_category::ExtensionMapping;
//!
//! let mapping = ExtensionMapping::default_mapping();
//! assert_eq!(mapping.classify("report.PDF"), Some("Documents"));
//! assert_eq!(mapping.classify("photo.jpg"), Some("Images"));
//! assert_eq!(mapping.classify("archive.zip"), None);
//! ```

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the fixed categories a custom rule can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceCategory {
    Documents,
    Images,
    Media,
    Archives,
    Executables,
    Data,
    Web,
}

impl ReferenceCategory {
    /// All categories, in the order they are offered to the user.
    pub const ALL: [ReferenceCategory; 7] = [
        ReferenceCategory::Documents,
        ReferenceCategory::Images,
        ReferenceCategory::Media,
        ReferenceCategory::Archives,
        ReferenceCategory::Executables,
        ReferenceCategory::Data,
        ReferenceCategory::Web,
    ];

    /// Returns the display name of this category.
    pub fn name(&self) -> &'static str {
        match self {
            ReferenceCategory::Documents => "Documents",
            ReferenceCategory::Images => "Images",
            ReferenceCategory::Media => "Media",
            ReferenceCategory::Archives => "Archives",
            ReferenceCategory::Executables => "Executables",
            ReferenceCategory::Data => "Data",
            ReferenceCategory::Web => "Web",
        }
    }

    /// Returns the extensions this category routes.
    ///
    /// ```
    /// use dirsort::file_category::ReferenceCategory;
    ///
    /// assert!(ReferenceCategory::Archives.extensions().contains(&".7z"));
    /// assert!(ReferenceCategory::Data.extensions().contains(&".csv"));
    /// ```
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ReferenceCategory::Documents => &[".pdf", ".docx", ".txt", ".xls", ".pptx"],
            ReferenceCategory::Images => &[".jpg", ".png", ".webp", ".heic"],
            ReferenceCategory::Media => &[".mp4", ".mp3", ".mkv", ".flac"],
            ReferenceCategory::Archives => &[".zip", ".rar", ".7z", ".tar"],
            ReferenceCategory::Executables => &[".exe", ".msi", ".bat", ".sh"],
            ReferenceCategory::Data => &[".xlsx", ".csv", ".json", ".xml"],
            ReferenceCategory::Web => &[".html", ".css", ".js", ".php"],
        }
    }
}

impl fmt::Display for ReferenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReferenceCategory {
    type Err = String;

    /// Parses a category name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|c| c.name()).collect();
                format!(
                    "unknown category '{}' (expected one of: {})",
                    wanted,
                    known.join(", ")
                )
            })
    }
}

/// A user-entered rule: files of `category` go into the folder `folder`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRow {
    pub folder: String,
    pub category: ReferenceCategory,
}

impl RuleRow {
    pub fn new(folder: impl Into<String>, category: ReferenceCategory) -> Self {
        Self {
            folder: folder.into(),
            category,
        }
    }
}

impl FromStr for RuleRow {
    type Err = String;

    /// Parses `FOLDER=CATEGORY`, e.g. `Work=Documents`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (folder, category) = s
            .rsplit_once('=')
            .ok_or_else(|| format!("expected FOLDER=CATEGORY, got '{}'", s))?;
        Ok(Self {
            folder: folder.trim().to_string(),
            category: category.parse()?,
        })
    }
}

/// One destination folder and the extensions routed into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub folder: String,
    pub extensions: Vec<String>,
}

impl MappingEntry {
    fn claims(&self, extension: &str) -> bool {
        self.extensions.iter().any(|ext| ext == extension)
    }
}

/// Ordered mapping from folder name to a set of extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionMapping {
    entries: Vec<MappingEntry>,
}

impl ExtensionMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in mapping used by the default organize mode.
    pub fn default_mapping() -> Self {
        let mut mapping = Self::new();
        mapping.insert("Documents", [".pdf", ".docx", ".txt", ".rtf", ".odt"]);
        mapping.insert("Images", [".jpg", ".png", ".jpeg", ".gif", ".svg"]);
        mapping.insert("Media", [".mp4", ".mp3", ".mov", ".wav", ".avi"]);
        mapping
    }

    /// Builds a mapping from user rule rows.
    ///
    /// Folder names are trimmed and blank ones are dropped. A repeated folder
    /// name takes the category of its last row but keeps the position of its
    /// first. The result may be empty; callers report that as "no rules".
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidFolderName` for names that would leave the
    /// target directory (`.`, `..`, or anything containing a path separator).
    pub fn from_rules(rows: &[RuleRow]) -> Result<Self, ConfigError> {
        let mut mapping = Self::new();
        for row in rows {
            let folder = row.folder.trim();
            if folder.is_empty() {
                continue;
            }
            if folder == "." || folder == ".." || folder.contains(['/', '\\']) {
                return Err(ConfigError::InvalidFolderName(folder.to_string()));
            }
            mapping.insert(folder, row.category.extensions().iter().copied());
        }
        Ok(mapping)
    }

    /// Adds a folder with its extensions, or replaces the extensions of an
    /// existing folder in place.
    ///
    /// Extensions are lower-cased and given a leading dot if missing.
    pub fn insert<I, S>(&mut self, folder: &str, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = normalize_extension(ext.as_ref());
            if !ext.is_empty() && !normalized.contains(&ext) {
                normalized.push(ext);
            }
        }

        match self.entries.iter_mut().find(|entry| entry.folder == folder) {
            Some(entry) => entry.extensions = normalized,
            None => self.entries.push(MappingEntry {
                folder: folder.to_string(),
                extensions: normalized,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Returns the destination folder for an extension (`".pdf"` form).
    pub fn folder_for_extension(&self, extension: &str) -> Option<&str> {
        if extension.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|entry| entry.claims(extension))
            .map(|entry| entry.folder.as_str())
    }

    /// Returns the destination folder for a file name, if any entry claims
    /// its extension.
    pub fn classify(&self, file_name: &str) -> Option<&str> {
        self.folder_for_extension(&extension_of(file_name))
    }

    /// Lists extensions claimed by more than one folder as
    /// `(extension, winning folder, shadowed folder)`.
    pub fn overlaps(&self) -> Vec<(String, String, String)> {
        let mut overlaps = Vec::new();
        for (i, later) in self.entries.iter().enumerate() {
            for ext in &later.extensions {
                if let Some(earlier) = self.entries[..i].iter().find(|e| e.claims(ext)) {
                    overlaps.push((ext.clone(), earlier.folder.clone(), later.folder.clone()));
                }
            }
        }
        overlaps
    }
}

/// Returns the lower-cased extension of a file name including its dot.
///
/// The extension runs from the last `.` to the end of the name. Names with no
/// dot, or whose only dot is the leading one (`.bashrc`), have no extension.
///
/// ```
/// use dirsort::file_category::extension_of;
///
/// assert_eq!(extension_of("photo.JPG"), ".jpg");
/// assert_eq!(extension_of("archive.tar.gz"), ".gz");
/// assert_eq!(extension_of("Makefile"), "");
/// assert_eq!(extension_of(".bashrc"), "");
/// ```
pub fn extension_of(file_name: &str) -> String {
    let stem_start = file_name.len() - file_name.trim_start_matches('.').len();
    match file_name[stem_start..].rfind('.') {
        Some(pos) => file_name[stem_start + pos..].to_lowercase(),
        None => String::new(),
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.is_empty() || ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}
