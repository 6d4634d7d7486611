/// Sorting files of a directory into extension-based subfolders.
///
/// This module scans the top level of a target directory, classifies each
/// regular file through an `ExtensionMapping`, moves matching files into
/// `<target>/<folder>/`, and records every successful move so the run can
/// be undone.
use crate::config::CompiledFilters;
use crate::file_category::ExtensionMapping;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One completed file relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// Where the file lives after the move.
    pub new_path: PathBuf,
    /// Where the file lived before the move.
    pub old_path: PathBuf,
    /// The folder the file was moved into.
    pub category: String,
}

/// The moves produced by one organize run, in the order they happened.
#[derive(Debug, Clone)]
pub struct UndoBatch {
    /// RFC 3339 timestamp of when the run started.
    pub timestamp: String,
    /// The directory that was organized.
    pub base_path: PathBuf,
    /// Completed moves.
    pub records: Vec<MoveRecord>,
}

impl UndoBatch {
    /// Creates an empty batch for a base path.
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            base_path,
            records: Vec::new(),
        }
    }

    /// Appends a completed move.
    pub fn push(&mut self, record: MoveRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of moved files per category folder.
    pub fn category_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for record in &self.records {
            *counts.entry(record.category.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Errors that can occur during organize and undo operations.
#[derive(Debug)]
pub enum OrganizeError {
    /// The target path is missing or is not a directory.
    DirectoryNotFound { path: PathBuf },
    /// The target directory exists but could not be listed.
    DirectoryReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The mapping has no entries.
    NoRulesDefined,
    /// Failed to create a category directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to move a single file.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// The undo stack is empty.
    NothingToUndo,
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryNotFound { path } => {
                write!(f, "Directory not found: {}", path.display())
            }
            Self::DirectoryReadFailed { path, source } => {
                write!(f, "Failed to read directory {}: {}", path.display(), source)
            }
            Self::NoRulesDefined => {
                write!(f, "No rules defined: name at least one folder before sorting")
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::NothingToUndo => write!(f, "Nothing to undo"),
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DirectoryReadFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. } => Some(source),
            Self::FileMoveFailure { source_error, .. } => Some(source_error),
            _ => None,
        }
    }
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Observer for a running organize pass.
///
/// `tick` is called once per file processed, whether it was moved, left in
/// place, or failed. `is_cancelled` is polled before each file.
pub trait ProgressSink {
    /// Called once with the number of files about to be processed.
    fn start(&mut self, _total: usize) {}

    /// Called after each file.
    fn tick(&mut self, processed: usize, total: usize);

    /// Called once after the last file (or after cancellation).
    fn finish(&mut self) {}

    /// Returning true stops the run before the next file.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// A progress sink that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn tick(&mut self, _processed: usize, _total: usize) {}
}

/// What an organize run did.
#[derive(Debug)]
pub struct OrganizeReport {
    /// Successful moves, ready to push onto an `UndoStack`.
    pub batch: UndoBatch,
    /// Files no mapping entry claimed; they were left in place.
    pub unmatched: Vec<PathBuf>,
    /// Per-file failures; those files were left in place.
    pub failures: Vec<OrganizeError>,
    /// Number of files handled before the run ended.
    pub processed: usize,
    /// Number of candidate files found in the directory.
    pub total: usize,
    /// True if the progress sink asked the run to stop early.
    pub cancelled: bool,
}

impl OrganizeReport {
    pub fn moved_count(&self) -> usize {
        self.batch.len()
    }
}

/// Terminal state of an organize call that passed validation.
#[derive(Debug)]
pub enum OrganizeOutcome {
    /// The directory holds no candidate files. Not an error.
    NothingToOrganize,
    /// Files were processed.
    Completed(OrganizeReport),
}

/// A move that an organize run would perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: String,
}

/// Organizes files by moving them into category subdirectories.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Sorts the top-level files of `base_path` according to `mapping`.
    ///
    /// Every regular file is considered; see [`FileOrganizer::organize_filtered`]
    /// to leave some out.
    ///
    /// # Errors
    ///
    /// Fails before touching the filesystem with `DirectoryNotFound` if
    /// `base_path` is not a directory, or `NoRulesDefined` if `mapping` is
    /// empty. Per-file failures are collected in the report instead.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::file_category::ExtensionMapping;
    /// use dirsort::file_organizer::{FileOrganizer, NoProgress, OrganizeOutcome};
    /// use std::path::Path;
    ///
    /// let mapping = ExtensionMapping::default_mapping();
    /// match FileOrganizer::organize(Path::new("/home/me/Downloads"), &mapping, &mut NoProgress) {
    ///     Ok(OrganizeOutcome::Completed(report)) => println!("Moved {} files", report.moved_count()),
    ///     Ok(OrganizeOutcome::NothingToOrganize) => println!("Nothing to organize"),
    ///     Err(e) => eprintln!("{}", e),
    /// }
    /// ```
    pub fn organize(
        base_path: &Path,
        mapping: &ExtensionMapping,
        progress: &mut dyn ProgressSink,
    ) -> OrganizeResult<OrganizeOutcome> {
        Self::organize_filtered(base_path, mapping, &CompiledFilters::allow_all(), progress)
    }

    /// Like [`FileOrganizer::organize`], skipping files the filters exclude.
    pub fn organize_filtered(
        base_path: &Path,
        mapping: &ExtensionMapping,
        filters: &CompiledFilters,
        progress: &mut dyn ProgressSink,
    ) -> OrganizeResult<OrganizeOutcome> {
        Self::validate(base_path, mapping)?;

        let files = Self::list_files(base_path, filters)?;
        if files.is_empty() {
            return Ok(OrganizeOutcome::NothingToOrganize);
        }

        let total = files.len();
        let mut report = OrganizeReport {
            batch: UndoBatch::new(base_path.to_path_buf()),
            unmatched: Vec::new(),
            failures: Vec::new(),
            processed: 0,
            total,
            cancelled: false,
        };

        progress.start(total);
        for file_path in files {
            if progress.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let file_name = file_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            match mapping.classify(&file_name) {
                Some(folder) => {
                    match Self::move_to_category_with_record(base_path, &file_path, folder) {
                        Ok(record) => report.batch.push(record),
                        Err(e) => report.failures.push(e),
                    }
                }
                None => report.unmatched.push(file_path),
            }

            report.processed += 1;
            progress.tick(report.processed, total);
        }
        progress.finish();

        Ok(OrganizeOutcome::Completed(report))
    }

    /// Returns the moves an organize run would make, without touching the
    /// filesystem.
    ///
    /// # Errors
    ///
    /// Same validation errors as [`FileOrganizer::organize`].
    pub fn plan(
        base_path: &Path,
        mapping: &ExtensionMapping,
        filters: &CompiledFilters,
    ) -> OrganizeResult<Vec<PlannedMove>> {
        Self::validate(base_path, mapping)?;

        let planned = Self::list_files(base_path, filters)?
            .into_iter()
            .filter_map(|source| {
                let file_name = source.file_name()?.to_string_lossy().into_owned();
                let folder = mapping.classify(&file_name)?;
                Some(PlannedMove {
                    destination: base_path.join(folder).join(&file_name),
                    category: folder.to_string(),
                    source,
                })
            })
            .collect();
        Ok(planned)
    }

    /// Lists the regular files directly inside `base_path` in directory order.
    ///
    /// Subdirectories and symbolic links are never returned.
    pub fn list_files(base_path: &Path, filters: &CompiledFilters) -> OrganizeResult<Vec<PathBuf>> {
        let entries = fs::read_dir(base_path).map_err(|e| OrganizeError::DirectoryReadFailed {
            path: base_path.to_path_buf(),
            source: e,
        })?;

        let mut files = Vec::new();
        for entry in entries.flatten() {
            if let Ok(file_type) = entry.file_type()
                && file_type.is_file()
            {
                let path = entry.path();
                if filters.should_include(&path) {
                    files.push(path);
                }
            }
        }
        Ok(files)
    }

    fn validate(base_path: &Path, mapping: &ExtensionMapping) -> OrganizeResult<()> {
        if !base_path.is_dir() {
            return Err(OrganizeError::DirectoryNotFound {
                path: base_path.to_path_buf(),
            });
        }
        if mapping.is_empty() {
            return Err(OrganizeError::NoRulesDefined);
        }
        Ok(())
    }

    /// Moves a file into its category directory within the base path and
    /// records the move.
    ///
    /// The category directory is created if needed; an existing one is reused.
    /// A file already present at the destination may be replaced.
    ///
    /// # Arguments
    ///
    /// * `base_path` - The directory holding the category subdirectories
    /// * `file_path` - The full path to the file to be moved
    /// * `category_dir_name` - The name of the subdirectory for this file's category
    pub fn move_to_category_with_record(
        base_path: &Path,
        file_path: &Path,
        category_dir_name: &str,
    ) -> OrganizeResult<MoveRecord> {
        let category_path = base_path.join(category_dir_name);

        fs::create_dir_all(&category_path).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: category_path.clone(),
            source: e,
        })?;

        let file_name = file_path
            .file_name()
            .ok_or_else(|| OrganizeError::FileMoveFailure {
                source: file_path.to_path_buf(),
                destination: category_path.clone(),
                source_error: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "file has no name component",
                ),
            })?;

        let destination_path = category_path.join(file_name);

        fs::rename(file_path, &destination_path).map_err(|e| OrganizeError::FileMoveFailure {
            source: file_path.to_path_buf(),
            destination: destination_path.clone(),
            source_error: e,
        })?;

        Ok(MoveRecord {
            new_path: destination_path,
            old_path: file_path.to_path_buf(),
            category: category_dir_name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        started: Option<usize>,
        ticks: Vec<(usize, usize)>,
        finished: bool,
        cancel_after: Option<usize>,
    }

    impl ProgressSink for Recorder {
        fn start(&mut self, total: usize) {
            self.started = Some(total);
        }

        fn tick(&mut self, processed: usize, total: usize) {
            self.ticks.push((processed, total));
        }

        fn finish(&mut self) {
            self.finished = true;
        }

        fn is_cancelled(&self) -> bool {
            self.cancel_after
                .is_some_and(|limit| self.ticks.len() >= limit)
        }
    }

    fn completed(outcome: OrganizeOutcome) -> OrganizeReport {
        match outcome {
            OrganizeOutcome::Completed(report) => report,
            OrganizeOutcome::NothingToOrganize => panic!("expected a completed run"),
        }
    }

    #[test]
    fn test_move_to_category_creates_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let file_path = base_path.join("test.txt");
        fs::write(&file_path, "test content").expect("Failed to write test file");

        let record = FileOrganizer::move_to_category_with_record(base_path, &file_path, "Documents")
            .expect("Failed to move file");

        let category_dir = base_path.join("Documents");
        assert!(category_dir.is_dir());
        assert!(!file_path.exists());
        assert_eq!(record.new_path, category_dir.join("test.txt"));
        assert_eq!(record.old_path, file_path);
        assert!(record.new_path.exists());
    }

    #[test]
    fn test_move_to_category_uses_existing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let category_dir = base_path.join("Images");
        fs::create_dir(&category_dir).expect("Failed to create category directory");

        let file_path = base_path.join("test.png");
        fs::write(&file_path, "test content").expect("Failed to write test file");

        FileOrganizer::move_to_category_with_record(base_path, &file_path, "Images")
            .expect("Failed to move file");

        assert!(!file_path.exists());
        assert!(category_dir.join("test.png").exists());
    }

    #[test]
    fn test_move_fails_when_category_is_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        fs::write(base_path.join("Documents"), "not a folder").expect("Failed to write file");
        let file_path = base_path.join("a.pdf");
        fs::write(&file_path, "pdf").expect("Failed to write file");

        let result = FileOrganizer::move_to_category_with_record(base_path, &file_path, "Documents");
        assert!(matches!(
            result,
            Err(OrganizeError::DirectoryCreationFailed { .. })
        ));
        assert!(file_path.exists());
    }

    #[test]
    fn test_organize_missing_directory() {
        let result = FileOrganizer::organize(
            Path::new("/non/existent/path"),
            &ExtensionMapping::default_mapping(),
            &mut NoProgress,
        );
        assert!(matches!(
            result,
            Err(OrganizeError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_organize_file_instead_of_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("plain.txt");
        fs::write(&file_path, "x").expect("Failed to write file");

        let result =
            FileOrganizer::organize(&file_path, &ExtensionMapping::default_mapping(), &mut NoProgress);
        assert!(matches!(
            result,
            Err(OrganizeError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_organize_empty_mapping_touches_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("a.pdf"), "pdf").expect("Failed to write file");

        let result = FileOrganizer::organize(base_path, &ExtensionMapping::new(), &mut NoProgress);

        assert!(matches!(result, Err(OrganizeError::NoRulesDefined)));
        assert!(base_path.join("a.pdf").exists());
    }

    #[test]
    fn test_organize_empty_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut recorder = Recorder::default();

        let outcome = FileOrganizer::organize(
            temp_dir.path(),
            &ExtensionMapping::default_mapping(),
            &mut recorder,
        )
        .expect("organize failed");

        assert!(matches!(outcome, OrganizeOutcome::NothingToOrganize));
        assert!(recorder.started.is_none());
        assert!(recorder.ticks.is_empty());
    }

    #[test]
    fn test_organize_ignores_subdirectories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::create_dir(base_path.join("nested.pdf")).expect("Failed to create dir");
        fs::write(base_path.join("nested.pdf").join("inner.pdf"), "x")
            .expect("Failed to write file");

        let outcome = FileOrganizer::organize(
            base_path,
            &ExtensionMapping::default_mapping(),
            &mut NoProgress,
        )
        .expect("organize failed");

        assert!(matches!(outcome, OrganizeOutcome::NothingToOrganize));
        assert!(base_path.join("nested.pdf").join("inner.pdf").exists());
    }

    #[test]
    fn test_progress_ticks_once_per_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        for name in ["a.pdf", "b.zip", "c.png"] {
            fs::write(base_path.join(name), "x").expect("Failed to write file");
        }
        let mut recorder = Recorder::default();

        let report = completed(
            FileOrganizer::organize(base_path, &ExtensionMapping::default_mapping(), &mut recorder)
                .expect("organize failed"),
        );

        assert_eq!(recorder.started, Some(3));
        assert_eq!(recorder.ticks, vec![(1, 3), (2, 3), (3, 3)]);
        assert!(recorder.finished);
        assert_eq!(report.moved_count(), 2);
        assert_eq!(report.unmatched, vec![base_path.join("b.zip")]);
        assert_eq!(report.processed, 3);
        assert!(!report.cancelled);
    }

    #[test]
    fn test_cancellation_stops_before_next_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        for name in ["a.pdf", "b.pdf", "c.pdf", "d.pdf"] {
            fs::write(base_path.join(name), "x").expect("Failed to write file");
        }
        let mut recorder = Recorder {
            cancel_after: Some(2),
            ..Default::default()
        };

        let report = completed(
            FileOrganizer::organize(base_path, &ExtensionMapping::default_mapping(), &mut recorder)
                .expect("organize failed"),
        );

        assert!(report.cancelled);
        assert_eq!(report.processed, 2);
        assert_eq!(report.total, 4);
        assert_eq!(report.moved_count(), 2);
        assert!(recorder.finished);

        let remaining = fs::read_dir(base_path)
            .expect("Failed to read dir")
            .flatten()
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .count();
        assert_eq!(remaining, 2);
    }

    #[test]
    fn test_plan_does_not_touch_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("song.MP3"), "x").expect("Failed to write file");
        fs::write(base_path.join("data.bin"), "x").expect("Failed to write file");

        let planned = FileOrganizer::plan(
            base_path,
            &ExtensionMapping::default_mapping(),
            &CompiledFilters::allow_all(),
        )
        .expect("plan failed");

        assert_eq!(
            planned,
            vec![PlannedMove {
                source: base_path.join("song.MP3"),
                destination: base_path.join("Media").join("song.MP3"),
                category: "Media".to_string(),
            }]
        );
        assert!(base_path.join("song.MP3").exists());
        assert!(!base_path.join("Media").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_left_alone() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let outside = TempDir::new().expect("Failed to create temp directory");
        let target = outside.path().join("real.pdf");
        fs::write(&target, "x").expect("Failed to write file");
        std::os::unix::fs::symlink(&target, base_path.join("link.pdf"))
            .expect("Failed to create symlink");

        let outcome = FileOrganizer::organize(
            base_path,
            &ExtensionMapping::default_mapping(),
            &mut NoProgress,
        )
        .expect("organize failed");

        assert!(matches!(outcome, OrganizeOutcome::NothingToOrganize));
        assert!(fs::symlink_metadata(base_path.join("link.pdf")).is_ok());
    }
}
