//! Read-only queries over the change store.

use crate::format::format_history_view;
use crate::group::{group_changes_by_revision, RevisionGroup};
use crate::store::HistoryStore;
use crate::{Change, HistoryResult};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Default number of entries in a history view.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Filters for [`HistoryStore::view_history`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryFilter {
    /// Maximum number of changes; `0` means the default.
    pub limit: usize,
    /// Case-insensitive substring of the filename.
    pub file_filter: Option<String>,
    /// Only changes at or after this time.
    pub since: Option<DateTime<Utc>>,
    /// Include content size details in the rendering.
    pub show_content: bool,
}

impl Default for HistoryFilter {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
            file_filter: None,
            since: None,
            show_content: false,
        }
    }
}

impl HistoryFilter {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_file_filter(mut self, filter: impl Into<String>) -> Self {
        self.file_filter = Some(filter.into());
        self
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_content(mut self, show_content: bool) -> Self {
        self.show_content = show_content;
        self
    }

    fn effective_limit(&self) -> usize {
        if self.limit == 0 {
            DEFAULT_HISTORY_LIMIT
        } else {
            self.limit
        }
    }

    fn matches_file(&self, filename: &str) -> bool {
        match self.file_filter.as_deref().map(str::trim) {
            Some(filter) if !filter.is_empty() => {
                filename.to_lowercase().contains(&filter.to_lowercase())
            }
            _ => true,
        }
    }
}

/// Changes matching a [`HistoryFilter`] and their rendering.
#[derive(Debug, Clone)]
pub struct HistoryView {
    /// Matching changes, newest first.
    pub changes: Vec<Change>,
    /// Markdown rendering grouped by revision.
    pub output: String,
}

/// A revision that still has active changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertibleRevision {
    pub revision_id: String,
    pub agent_model: String,
    pub timestamp: DateTime<Utc>,
    /// Files of the active changes, newest first.
    pub files: Vec<String>,
}

impl HistoryStore {
    /// Every change in the store, newest first.
    pub fn get_all_changes(&self) -> HistoryResult<Vec<Change>> {
        self.fetch_all_changes()
    }

    /// Changes recorded at or after `since`, newest first.
    pub fn get_changes_since(&self, since: DateTime<Utc>) -> HistoryResult<Vec<Change>> {
        Ok(self
            .fetch_all_changes()?
            .into_iter()
            .filter(|c| c.timestamp >= since)
            .collect())
    }

    /// Distinct filenames changed at or after `since`, most recently changed first.
    pub fn get_changed_files_since(&self, since: DateTime<Utc>) -> HistoryResult<Vec<String>> {
        let changes = self.get_changes_since(since)?;
        let mut seen = HashSet::new();
        Ok(changes
            .iter()
            .filter(|c| seen.insert(c.filename.as_str()))
            .map(|c| c.filename.clone())
            .collect())
    }

    /// Whether a revision exists and has at least one active change.
    pub fn has_active_changes_for_revision(&self, revision_id: &str) -> HistoryResult<bool> {
        Ok(self
            .fetch_all_changes()?
            .iter()
            .any(|c| c.revision_id() == revision_id && c.is_active()))
    }

    /// All revisions, newest first, with conversations loaded.
    pub fn get_revision_groups(&self) -> HistoryResult<Vec<RevisionGroup>> {
        let changes = self.fetch_all_changes()?;
        Ok(group_changes_by_revision(changes, |id| {
            self.load_conversation(id)
        }))
    }

    /// Filtered, limited history with a markdown rendering.
    pub fn view_history(&self, filter: &HistoryFilter) -> HistoryResult<HistoryView> {
        let changes: Vec<Change> = self
            .fetch_all_changes()?
            .into_iter()
            .filter(|c| filter.since.map_or(true, |since| c.timestamp >= since))
            .filter(|c| filter.matches_file(&c.filename))
            .take(filter.effective_limit())
            .collect();

        let output = format_history_view(&changes, filter.show_content);
        Ok(HistoryView { changes, output })
    }

    /// Revisions with at least one active change, newest first.
    pub fn list_revertible_revisions(&self) -> HistoryResult<Vec<RevertibleRevision>> {
        let changes = self.fetch_all_changes()?;
        let revertible = group_changes_by_revision(changes, |_| Vec::new())
            .into_iter()
            .filter(RevisionGroup::has_active_changes)
            .map(|group| RevertibleRevision {
                files: group.active_changes().map(|c| c.filename.clone()).collect(),
                revision_id: group.revision_id,
                agent_model: group.agent_model,
                timestamp: group.timestamp,
            })
            .collect();
        Ok(revertible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HistoryPaths;
    use crate::workspace::LocalWorkspace;
    use crate::{ChangeRequest, ChangeStatus};
    use chrono::Duration;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup_test() -> (TempDir, HistoryStore) {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(
            HistoryPaths::under(&dir.path().join(".rewind")),
            Arc::new(LocalWorkspace::new(dir.path())),
        );
        (dir, store)
    }

    fn record(store: &HistoryStore, revision: &str, file: &str) -> String {
        store
            .record_change(&ChangeRequest::new(revision, file, "old", "new"))
            .unwrap()
    }

    #[test]
    fn test_changes_since_includes_boundary() {
        let (_dir, store) = setup_test();
        let hash = record(&store, "r1", "a.txt");
        let recorded_at = store.change(&hash).unwrap().timestamp;

        assert_eq!(store.get_changes_since(recorded_at).unwrap().len(), 1);
        assert!(store
            .get_changes_since(recorded_at + Duration::nanoseconds(1))
            .unwrap()
            .is_empty());
        assert!(store
            .get_changes_since(Utc::now() + Duration::days(1))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_changed_files_are_distinct() {
        let (_dir, store) = setup_test();
        let start = Utc::now() - Duration::seconds(1);
        record(&store, "r1", "a.txt");
        record(&store, "r1", "b.txt");
        record(&store, "r2", "a.txt");

        let mut files = store.get_changed_files_since(start).unwrap();
        assert_eq!(files.len(), 2);
        files.sort();
        assert_eq!(files, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_changed_files_keep_most_recent_first() {
        let (_dir, store) = setup_test();
        let start = Utc::now() - Duration::seconds(1);
        for (revision, file) in [("r1", "a.txt"), ("r1", "b.txt"), ("r2", "c.txt"), ("r3", "a.txt")] {
            record(&store, revision, file);
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let files = store.get_changed_files_since(start).unwrap();
        assert_eq!(files, vec!["a.txt", "c.txt", "b.txt"]);
    }

    #[test]
    fn test_has_active_changes_for_revision() {
        let (_dir, store) = setup_test();
        let hash = record(&store, "r1", "a.txt");

        assert!(store.has_active_changes_for_revision("r1").unwrap());
        assert!(!store.has_active_changes_for_revision("r2").unwrap());

        store.update_status(&hash, ChangeStatus::Reverted).unwrap();
        assert!(!store.has_active_changes_for_revision("r1").unwrap());
    }

    #[test]
    fn test_view_history_filters_and_limits() {
        let (_dir, store) = setup_test();
        record(&store, "r1", "src/Main.rs");
        record(&store, "r1", "src/lib.rs");
        record(&store, "r2", "README.md");

        let view = store
            .view_history(&HistoryFilter::default().with_file_filter("main"))
            .unwrap();
        assert_eq!(view.changes.len(), 1);
        assert_eq!(view.changes[0].filename, "src/Main.rs");
        assert!(view.output.contains("src/Main.rs"));

        let view = store
            .view_history(&HistoryFilter::default().with_limit(2))
            .unwrap();
        assert_eq!(view.changes.len(), 2);

        let view = store
            .view_history(&HistoryFilter::default().with_since(Utc::now() + Duration::days(1)))
            .unwrap();
        assert!(view.changes.is_empty());
        assert_eq!(view.output, "No changes found matching the specified criteria.");
    }

    #[test]
    fn test_zero_limit_uses_default() {
        let (_dir, store) = setup_test();
        for i in 0..12 {
            record(&store, "r1", &format!("file{i}.txt"));
        }

        let view = store.view_history(&HistoryFilter::default().with_limit(0)).unwrap();
        assert_eq!(view.changes.len(), DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_list_revertible_revisions() {
        let (_dir, store) = setup_test();
        record(&store, "r1", "a.txt");
        let reverted = record(&store, "r1", "b.txt");
        let only = record(&store, "r2", "c.txt");

        store.update_status(&reverted, ChangeStatus::Reverted).unwrap();
        store.update_status(&only, ChangeStatus::Restored).unwrap();

        let revertible = store.list_revertible_revisions().unwrap();
        assert_eq!(revertible.len(), 1);
        assert_eq!(revertible[0].revision_id, "r1");
        assert_eq!(revertible[0].files, vec!["a.txt"]);
    }
}
