//! Change records and their on-disk metadata.

use crate::{HistoryError, HistoryResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Current `metadata.json` schema version.
pub const METADATA_VERSION: u32 = 1;

/// Lifecycle state of a change.
///
/// `Active` is the initial state. A revert moves `Active` to `Reverted`;
/// a restore moves any state to `Restored`. Nothing returns to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Active,
    Reverted,
    Restored,
}

impl ChangeStatus {
    /// Get the status as stored in metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Active => "active",
            ChangeStatus::Reverted => "reverted",
            ChangeStatus::Restored => "restored",
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeStatus {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ChangeStatus::Active),
            "reverted" => Ok(ChangeStatus::Reverted),
            "restored" => Ok(ChangeStatus::Restored),
            other => Err(HistoryError::validation(format!(
                "invalid change status {other:?} (expected active, reverted or restored)"
            ))),
        }
    }
}

/// One file edit with its before and after content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Unique storage key for this change.
    pub file_revision_hash: String,
    /// Revision ID shared by every change from the same request.
    pub request_hash: String,
    /// Path of the edited file, relative to the working root.
    pub filename: String,
    /// Exact bytes before the edit.
    pub original_content: Vec<u8>,
    /// Exact bytes after the edit.
    pub new_content: Vec<u8>,
    pub status: ChangeStatus,
    /// Creation time; never changes.
    pub timestamp: DateTime<Utc>,
    pub agent_model: String,
    pub description: String,
    pub note: Option<String>,
    pub instructions: String,
    pub response: String,
    /// A conversation transcript is stored under the revision ID.
    pub has_conversation: bool,
}

impl Change {
    /// The revision this change belongs to.
    pub fn revision_id(&self) -> &str {
        &self.request_hash
    }

    pub fn is_active(&self) -> bool {
        self.status == ChangeStatus::Active
    }

    /// Content the file is written back to on revert.
    pub fn content_for_revert(&self) -> &[u8] {
        &self.original_content
    }

    /// Content the file is written back to on restore.
    pub fn content_for_restore(&self) -> &[u8] {
        &self.new_content
    }
}

/// Input for recording a change.
///
/// `revision_id`, `filename` and both contents are required; the rest is
/// free-text context copied from the producing request.
#[derive(Debug, Clone, Default)]
pub struct ChangeRequest {
    pub revision_id: String,
    pub filename: String,
    pub original_content: Vec<u8>,
    pub new_content: Vec<u8>,
    pub description: String,
    pub note: Option<String>,
    /// The user prompt that produced the edit.
    pub instructions: String,
    /// The model message that produced the edit.
    pub response: String,
    pub agent_model: String,
}

impl ChangeRequest {
    /// Create a request with the required fields.
    pub fn new(
        revision_id: impl Into<String>,
        filename: impl Into<String>,
        original_content: impl Into<Vec<u8>>,
        new_content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            revision_id: revision_id.into(),
            filename: filename.into(),
            original_content: original_content.into(),
            new_content: new_content.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into()).filter(|n: &String| !n.is_empty());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = response.into();
        self
    }

    pub fn with_agent_model(mut self, model: impl Into<String>) -> Self {
        self.agent_model = model.into();
        self
    }
}

/// The `metadata.json` record stored for each change.
///
/// Older stores wrote `editing_model`, `original_prompt` and `llm_message`
/// and an empty string for "no note"; both shapes load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChangeMetadata {
    #[serde(default = "default_version")]
    pub version: u32,
    pub filename: String,
    pub file_revision_hash: String,
    pub request_hash: String,
    pub timestamp: DateTime<Utc>,
    pub status: ChangeStatus,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "editing_model")]
    pub agent_model: String,
    #[serde(default, alias = "original_prompt")]
    pub instructions: String,
    #[serde(default, alias = "llm_message")]
    pub response: String,
    #[serde(default)]
    pub has_conversation: bool,
}

fn default_version() -> u32 {
    METADATA_VERSION
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

impl ChangeMetadata {
    pub fn into_change(self, original_content: Vec<u8>, new_content: Vec<u8>) -> Change {
        Change {
            file_revision_hash: self.file_revision_hash,
            request_hash: self.request_hash,
            filename: self.filename,
            original_content,
            new_content,
            status: self.status,
            timestamp: self.timestamp,
            agent_model: self.agent_model,
            description: self.description,
            note: self.note,
            instructions: self.instructions,
            response: self.response,
            has_conversation: self.has_conversation,
        }
    }
}

/// Blob file names for a change: `<basename>.original` and `<basename>.updated`.
pub(crate) struct BlobNames {
    pub original: String,
    pub updated: String,
}

impl BlobNames {
    pub const ORIGINAL_SUFFIX: &'static str = ".original";
    pub const UPDATED_SUFFIX: &'static str = ".updated";

    /// Names derived from the file's base name.
    pub fn for_filename(filename: &str) -> HistoryResult<Self> {
        let base = Path::new(filename)
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                HistoryError::validation(format!("filename {filename:?} has no base name"))
            })?;
        Ok(Self::from_stem(base))
    }

    /// Names used by older stores, which flattened the whole relative path.
    pub fn legacy_for_filename(filename: &str) -> Self {
        Self::from_stem(&filename.replace(['/', '\\'], "_"))
    }

    fn from_stem(stem: &str) -> Self {
        Self {
            original: format!("{stem}{}", Self::ORIGINAL_SUFFIX),
            updated: format!("{stem}{}", Self::UPDATED_SUFFIX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            ChangeStatus::Active,
            ChangeStatus::Reverted,
            ChangeStatus::Restored,
        ] {
            assert_eq!(status.as_str().parse::<ChangeStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_string(&status).unwrap(),
                format!("\"{status}\"")
            );
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(matches!(
            "deleted".parse::<ChangeStatus>(),
            Err(HistoryError::Validation(_))
        ));
        assert!(serde_json::from_str::<ChangeStatus>("\"Active\"").is_err());
    }

    #[test]
    fn legacy_metadata_loads_with_defaults() {
        let json = r#"{
            "version": 1,
            "filename": "src/lib.rs",
            "file_revision_hash": "abc",
            "request_hash": "req",
            "timestamp": "2024-03-01T10:00:00.123456789-07:00",
            "status": "active",
            "note": "",
            "description": "Old entry",
            "editing_model": "gpt-4"
        }"#;

        let metadata: ChangeMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.note, None);
        assert_eq!(metadata.agent_model, "gpt-4");
        assert!(metadata.instructions.is_empty());
        assert!(!metadata.has_conversation);
        assert_eq!(metadata.timestamp.to_rfc3339(), "2024-03-01T17:00:00.123456789+00:00");
    }

    #[test]
    fn metadata_serializes_missing_note_as_null() {
        let metadata = ChangeMetadata {
            version: METADATA_VERSION,
            filename: "a.txt".into(),
            file_revision_hash: "chg_1".into(),
            request_hash: "r1".into(),
            timestamp: Utc::now(),
            status: ChangeStatus::Active,
            note: None,
            description: String::new(),
            agent_model: String::new(),
            instructions: String::new(),
            response: String::new(),
            has_conversation: false,
        };

        let value = serde_json::to_value(&metadata).unwrap();
        assert!(value["note"].is_null());
        assert_eq!(value["status"], "active");
        assert_eq!(value["version"], 1);
    }

    #[test]
    fn blob_names_use_base_name() {
        let names = BlobNames::for_filename("src/nested/main.rs").unwrap();
        assert_eq!(names.original, "main.rs.original");
        assert_eq!(names.updated, "main.rs.updated");

        let legacy = BlobNames::legacy_for_filename("src/nested/main.rs");
        assert_eq!(legacy.original, "src_nested_main.rs.original");

        assert!(BlobNames::for_filename("..").is_err());
    }

    #[test]
    fn change_request_builder_drops_empty_note() {
        let request = ChangeRequest::new("r1", "a.txt", "v1", "v2").with_note("");
        assert_eq!(request.note, None);

        let request = request.with_note("careful").with_agent_model("model-x");
        assert_eq!(request.note.as_deref(), Some("careful"));
        assert_eq!(request.agent_model, "model-x");
        assert_eq!(request.original_content, b"v1");
    }
}
