//! History error types.

use crate::rollback::RollbackAction;
use rewind_storage::StorageError;
use thiserror::Error;

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Errors that can occur while recording, reading or rolling back changes.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Unknown revision ID, unknown file-revision hash, or no matching active change.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The revision exists but nothing in it can be reverted.
    #[error("No active changes found for revision '{0}'")]
    NoActiveChanges(String),

    /// Invalid status value or missing/unsafe identifier.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A stored change entry could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// IO error on the history store.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing or reading a workspace file failed.
    #[error("Failed to write {filename}: {source}")]
    Workspace {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A multi-file revert or restore stopped partway through.
    ///
    /// Files in `completed` were fully processed; `failed` is the file whose
    /// write or status update failed. Nothing after it was touched.
    #[error(
        "{action} of revision '{revision_id}' stopped at '{failed}' after {done} completed file(s): {source}",
        done = .completed.len()
    )]
    PartialFailure {
        revision_id: String,
        action: RollbackAction,
        completed: Vec<String>,
        failed: String,
        #[source]
        source: Box<HistoryError>,
    },
}

impl HistoryError {
    /// Create a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Whether this error means the requested item does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<StorageError> for HistoryError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => Self::Io(e),
            StorageError::Json(e) => Self::Serialization(e),
            StorageError::NotFound(key) => Self::NotFound(key),
            StorageError::InvalidKey(message) => Self::Validation(message),
        }
    }
}
