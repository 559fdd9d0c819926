//! Reverting and restoring revisions.
//!
//! Multi-file operations are not transactional: each file is written and
//! its status updated before the next file is touched. When a file fails,
//! the files before it stay rolled back and [`HistoryError::PartialFailure`]
//! names both.

use crate::diff::generate_diff;
use crate::group::RevisionGroup;
use crate::store::{validate_id, HistoryStore};
use crate::{Change, ChangeStatus, HistoryError, HistoryResult};
use rewind_util::TimingGuard;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Which way a revision is rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackAction {
    /// Write original content back and mark the change reverted.
    Revert,
    /// Write new content back and mark the change restored.
    Restore,
}

impl RollbackAction {
    /// Status a change has after the action.
    pub fn target_status(&self) -> ChangeStatus {
        match self {
            RollbackAction::Revert => ChangeStatus::Reverted,
            RollbackAction::Restore => ChangeStatus::Restored,
        }
    }

    fn content<'a>(&self, change: &'a Change) -> &'a [u8] {
        match self {
            RollbackAction::Revert => change.content_for_revert(),
            RollbackAction::Restore => change.content_for_restore(),
        }
    }
}

impl fmt::Display for RollbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollbackAction::Revert => f.write_str("revert"),
            RollbackAction::Restore => f.write_str("restore"),
        }
    }
}

/// Reported after each file of a multi-file operation completes.
#[derive(Debug, Clone, Copy)]
pub struct RollbackProgress<'a> {
    pub revision_id: &'a str,
    pub action: RollbackAction,
    pub filename: &'a str,
    pub file_revision_hash: &'a str,
    /// 1-based position of this file.
    pub index: usize,
    pub total: usize,
}

/// Outcome of a completed revert or restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackReport {
    pub revision_id: String,
    pub action: RollbackAction,
    /// Processed files, in processing order.
    pub files: Vec<String>,
}

/// What a single-file rollback would do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRollbackPreview {
    pub revision_id: String,
    pub filename: String,
    /// The active change that would be reverted, if any.
    pub file_revision_hash: Option<String>,
    /// Diff from the file's current content to the content it would get.
    pub diff: Option<String>,
}

/// Result of [`HistoryStore::rollback_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileRollbackOutcome {
    /// Nothing was written.
    Preview(FileRollbackPreview),
    /// The file was reverted to its original content.
    RolledBack {
        revision_id: String,
        filename: String,
        file_revision_hash: String,
    },
}

impl FileRollbackOutcome {
    /// Human-readable summary.
    pub fn describe(&self) -> String {
        match self {
            FileRollbackOutcome::Preview(preview) => match &preview.file_revision_hash {
                Some(hash) => {
                    let mut out = format!(
                        "Would rollback file '{}' from revision '{}' (change {hash}).\n",
                        preview.filename, preview.revision_id
                    );
                    if let Some(diff) = &preview.diff {
                        out.push_str(diff);
                    }
                    out.push_str("To confirm, call again with confirm=true.");
                    out
                }
                None => format!(
                    "No active change for file '{}' in revision '{}'; nothing would be rolled back.",
                    preview.filename, preview.revision_id
                ),
            },
            FileRollbackOutcome::RolledBack {
                revision_id,
                filename,
                ..
            } => format!("Successfully rolled back file '{filename}' from revision '{revision_id}'"),
        }
    }

    pub fn is_preview(&self) -> bool {
        matches!(self, FileRollbackOutcome::Preview(_))
    }
}

impl HistoryStore {
    /// Revert every active change of a revision.
    pub fn revert_revision(&self, revision_id: &str) -> HistoryResult<RollbackReport> {
        self.revert_revision_with(revision_id, |_| {})
    }

    /// Revert every active change of a revision, reporting each file as it completes.
    ///
    /// Changes already reverted or restored are skipped.
    pub fn revert_revision_with<F>(&self, revision_id: &str, progress: F) -> HistoryResult<RollbackReport>
    where
        F: FnMut(&RollbackProgress<'_>),
    {
        let group = self.find_revision(revision_id)?;
        let active: Vec<&Change> = group.active_changes().collect();
        if active.is_empty() {
            return Err(HistoryError::NoActiveChanges(revision_id.to_string()));
        }

        self.apply(revision_id, RollbackAction::Revert, &active, progress)
    }

    /// Re-apply every change of a revision regardless of its status.
    pub fn restore_revision(&self, revision_id: &str) -> HistoryResult<RollbackReport> {
        self.restore_revision_with(revision_id, |_| {})
    }

    /// Re-apply every change of a revision, reporting each file as it completes.
    pub fn restore_revision_with<F>(&self, revision_id: &str, progress: F) -> HistoryResult<RollbackReport>
    where
        F: FnMut(&RollbackProgress<'_>),
    {
        let group = self.find_revision(revision_id)?;
        let all: Vec<&Change> = group.changes.iter().collect();

        self.apply(revision_id, RollbackAction::Restore, &all, progress)
    }

    /// Revert a single file of a revision, or preview doing so.
    ///
    /// Without `confirm` nothing is written. With `confirm`, an active change
    /// for exactly this revision and filename must exist.
    pub fn rollback_file(
        &self,
        revision_id: &str,
        filename: &str,
        confirm: bool,
    ) -> HistoryResult<FileRollbackOutcome> {
        validate_id("revision ID", revision_id)?;
        if filename.trim().is_empty() {
            return Err(HistoryError::validation("filename cannot be empty"));
        }

        let target = self
            .fetch_all_changes()?
            .into_iter()
            .find(|c| c.revision_id() == revision_id && c.filename == filename && c.is_active());

        if !confirm {
            let diff = target.as_ref().map(|change| {
                let current = match self.workspace().read_file(Path::new(filename)) {
                    Ok(current) => current,
                    Err(e) => {
                        debug!(filename = %filename, error = %e, "Previewing against recorded content");
                        change.new_content.clone()
                    }
                };
                generate_diff(&current, &change.original_content, filename)
            });

            return Ok(FileRollbackOutcome::Preview(FileRollbackPreview {
                revision_id: revision_id.to_string(),
                filename: filename.to_string(),
                file_revision_hash: target.map(|c| c.file_revision_hash),
                diff,
            }));
        }

        let change = target.ok_or_else(|| {
            HistoryError::not_found(format!(
                "no active change for file '{filename}' in revision '{revision_id}'"
            ))
        })?;

        self.apply_one(RollbackAction::Revert, &change)?;
        info!(
            revision_id = %revision_id,
            filename = %filename,
            hash = %change.file_revision_hash,
            "Rolled back file"
        );

        Ok(FileRollbackOutcome::RolledBack {
            revision_id: revision_id.to_string(),
            filename: change.filename,
            file_revision_hash: change.file_revision_hash,
        })
    }

    fn find_revision(&self, revision_id: &str) -> HistoryResult<RevisionGroup> {
        validate_id("revision ID", revision_id)?;
        self.get_revision_groups()?
            .into_iter()
            .find(|g| g.revision_id == revision_id)
            .ok_or_else(|| HistoryError::not_found(format!("revision '{revision_id}'")))
    }

    fn apply<F>(
        &self,
        revision_id: &str,
        action: RollbackAction,
        changes: &[&Change],
        mut progress: F,
    ) -> HistoryResult<RollbackReport>
    where
        F: FnMut(&RollbackProgress<'_>),
    {
        let _timing = TimingGuard::rollback(revision_id);
        info!(revision_id = %revision_id, action = %action, files = changes.len(), "Starting rollback");

        let mut completed: Vec<String> = Vec::with_capacity(changes.len());
        for (i, change) in changes.iter().enumerate() {
            if let Err(e) = self.apply_one(action, change) {
                warn!(
                    revision_id = %revision_id,
                    action = %action,
                    filename = %change.filename,
                    completed = completed.len(),
                    error = %e,
                    "Rollback stopped"
                );
                return Err(HistoryError::PartialFailure {
                    revision_id: revision_id.to_string(),
                    action,
                    completed,
                    failed: change.filename.clone(),
                    source: Box::new(e),
                });
            }

            info!(
                revision_id = %revision_id,
                action = %action,
                filename = %change.filename,
                hash = %change.file_revision_hash,
                index = i + 1,
                total = changes.len(),
                "Rolled back file"
            );
            progress(&RollbackProgress {
                revision_id,
                action,
                filename: &change.filename,
                file_revision_hash: &change.file_revision_hash,
                index: i + 1,
                total: changes.len(),
            });
            completed.push(change.filename.clone());
        }

        Ok(RollbackReport {
            revision_id: revision_id.to_string(),
            action,
            files: completed,
        })
    }

    /// Write the file, then record the new status.
    fn apply_one(&self, action: RollbackAction, change: &Change) -> HistoryResult<()> {
        self.workspace()
            .write_file(Path::new(&change.filename), action.content(change))
            .map_err(|source| HistoryError::Workspace {
                filename: change.filename.clone(),
                source,
            })?;
        self.update_status(&change.file_revision_hash, action.target_status())
    }
}
