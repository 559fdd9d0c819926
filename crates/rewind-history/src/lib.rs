//! Change history and rollback for agent file edits.
//!
//! This crate records every file an agent edits and lets callers:
//! - Group edits into revisions (one per user request)
//! - Revert a revision to the content before the edits
//! - Restore a revision to the content the edits produced
//! - Query what changed and when
//!
//! # Example
//!
//! ```no_run
//! use rewind_history::{ChangeRequest, HistoryConfig, HistoryStore};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HistoryConfig::load(Path::new("/project/root"))?;
//! let store = HistoryStore::open(&config)?;
//!
//! // Start a revision for the request, then record each edited file
//! let revision = store.record_base_revision("Rename helper", "rename foo to bar", "Done", &[])?;
//! store.record_change(
//!     &ChangeRequest::new(&revision, "src/lib.rs", "fn foo() {}\n", "fn bar() {}\n")
//!         .with_description("Rename foo"),
//! )?;
//!
//! // Undo the whole revision, then bring it back
//! store.revert_revision(&revision)?;
//! store.restore_revision(&revision)?;
//! # Ok(())
//! # }
//! ```

mod change;
mod codec;
mod config;
mod conversation;
mod diff;
mod error;
mod format;
mod group;
mod query;
mod rollback;
mod store;
mod workspace;

pub use change::{Change, ChangeRequest, ChangeStatus, METADATA_VERSION};
pub use codec::{decode_content, encode_content, ContentEncoding};
pub use config::{HistoryConfig, HistoryPaths, HistoryScope, CONFIG_FILE_NAME, SCOPE_ENV_VAR};
pub use conversation::{ConversationTurn, RevisionRecord, ToolCall, ToolFunction};
pub use diff::{change_diff, diff_stats, generate_diff, DiffStats};
pub use error::{HistoryError, HistoryResult};
pub use format::{format_history_view, format_revertible_revisions, format_revision};
pub use group::{group_changes_by_revision, RevisionGroup};
pub use query::{HistoryFilter, HistoryView, RevertibleRevision, DEFAULT_HISTORY_LIMIT};
pub use rollback::{
    FileRollbackOutcome, FileRollbackPreview, RollbackAction, RollbackProgress, RollbackReport,
};
pub use store::HistoryStore;
pub use workspace::{LocalWorkspace, WorkspaceFs};
