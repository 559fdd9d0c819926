//! Custom assertion helpers for history tests.

use rewind_history::{ChangeStatus, HistoryStore};
use std::path::Path;

/// Assert that a file's bytes equal `expected` exactly.
pub fn assert_file_bytes(path: &Path, expected: impl AsRef<[u8]>) {
    let content = std::fs::read(path)
        .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));

    assert_eq!(
        content,
        expected.as_ref(),
        "File {} content does not match expected.\nExpected:\n{}\nActual:\n{}",
        path.display(),
        String::from_utf8_lossy(expected.as_ref()),
        String::from_utf8_lossy(&content)
    );
}

/// Assert the stored status of one change.
pub fn assert_status(store: &HistoryStore, file_revision_hash: &str, expected: ChangeStatus) {
    let change = store
        .change(file_revision_hash)
        .unwrap_or_else(|e| panic!("Failed to read change {}: {}", file_revision_hash, e));

    assert_eq!(
        change.status, expected,
        "Change {} ({}) has status {}, expected {}",
        file_revision_hash, change.filename, change.status, expected
    );
}

/// Assert the statuses of every change in a revision, keyed by filename.
pub fn assert_revision_statuses(store: &HistoryStore, revision_id: &str, expected: &[(&str, ChangeStatus)]) {
    let changes = store
        .get_all_changes()
        .unwrap_or_else(|e| panic!("Failed to read changes: {}", e));

    for (filename, status) in expected {
        let change = changes
            .iter()
            .find(|c| c.revision_id() == revision_id && c.filename == *filename)
            .unwrap_or_else(|| panic!("No change for {} in revision {}", filename, revision_id));
        assert_eq!(
            change.status, *status,
            "{} in revision {} has status {}, expected {}",
            filename, revision_id, change.status, status
        );
    }
}
