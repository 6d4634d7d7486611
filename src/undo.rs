/// Undo functionality for reverting organize runs.
///
/// Runs are kept as batches on an in-memory `UndoStack` owned by the caller.
/// Undoing pops the newest batch and moves its files back to where they were.
use crate::file_organizer::{MoveRecord, OrganizeError, OrganizeResult, UndoBatch};
use std::fs;
use std::path::PathBuf;

/// Represents the result of an undo operation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of files successfully restored.
    pub restored_files: usize,
    /// Files that could not be moved back, with the reason.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Files that were no longer at their recorded location.
    pub skipped_files: Vec<(PathBuf, String)>,
}

impl UndoReport {
    /// Returns the total number of records processed.
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.failed_restores.len() + self.skipped_files.len()
    }

    /// Returns true if every record was restored.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

/// History of organize runs, most recent last.
#[derive(Debug, Default)]
pub struct UndoStack {
    batches: Vec<UndoBatch>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a batch. Empty batches are dropped; returns whether the batch
    /// was kept.
    pub fn push(&mut self, batch: UndoBatch) -> bool {
        if batch.is_empty() {
            return false;
        }
        self.batches.push(batch);
        true
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// The batch the next undo would revert.
    pub fn peek(&self) -> Option<&UndoBatch> {
        self.batches.last()
    }

    /// Batches from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &UndoBatch> {
        self.batches.iter()
    }

    /// Undoes the most recent organize run.
    ///
    /// The newest batch is popped and its records are replayed newest first.
    /// A record whose file is gone from its new location is skipped; a record
    /// whose move back fails is reported as failed. Neither stops the rest of
    /// the batch, and the batch is discarded either way.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::NothingToUndo` if the stack is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::undo::UndoStack;
    /// use dirsort::file_organizer::OrganizeError;
    ///
    /// let mut stack = UndoStack::new();
    /// assert!(matches!(stack.undo_last(), Err(OrganizeError::NothingToUndo)));
    /// ```
    pub fn undo_last(&mut self) -> OrganizeResult<UndoReport> {
        let batch = self.batches.pop().ok_or(OrganizeError::NothingToUndo)?;

        let mut report = UndoReport::default();
        for record in batch.records.iter().rev() {
            match restore_file(record) {
                Ok(()) => report.restored_files += 1,
                Err(RestoreFailure::Missing(path, reason)) => {
                    report.skipped_files.push((path, reason))
                }
                Err(RestoreFailure::Failed(path, reason)) => {
                    report.failed_restores.push((path, reason))
                }
            }
        }

        Ok(report)
    }
}

enum RestoreFailure {
    Missing(PathBuf, String),
    Failed(PathBuf, String),
}

/// Moves a single file back to its original location.
fn restore_file(record: &MoveRecord) -> Result<(), RestoreFailure> {
    if !record.new_path.exists() {
        return Err(RestoreFailure::Missing(
            record.new_path.clone(),
            "File not found at expected location".to_string(),
        ));
    }

    fs::rename(&record.new_path, &record.old_path).map_err(|e| {
        RestoreFailure::Failed(
            record.new_path.clone(),
            format!("Failed to restore file: {}", e),
        )
    })
}
