//! Change store: recording, reading and status updates.

use crate::change::{BlobNames, ChangeMetadata, METADATA_VERSION};
use crate::codec::{decode_content, encode_content, ContentEncoding};
use crate::config::{HistoryConfig, HistoryPaths};
use crate::conversation::{ConversationTurn, RevisionRecord};
use crate::workspace::{LocalWorkspace, WorkspaceFs};
use crate::{Change, ChangeRequest, ChangeStatus, HistoryError, HistoryResult};
use chrono::Utc;
use rewind_storage::{JsonStorage, StorageError};
use rewind_util::{Identifier, TimingGuard};
use std::sync::Arc;
use tracing::{debug, info, warn};

const METADATA_KEY: &str = "metadata";
const CONVERSATION_KEY: &str = "conversation";
const REVISION_KEY: &str = "revision";

/// Attempts at claiming a fresh identifier before giving up.
const MAX_ID_ATTEMPTS: usize = 8;

/// Storage for change history.
///
/// Every change lives in its own directory, so concurrent recordings of
/// different changes never touch the same files:
/// ```text
/// changes_root/
///   <file_revision_hash>/
///     metadata.json           # written last, atomically
///     <basename>.original     # base64 content before the edit
///     <basename>.updated      # base64 content after the edit
/// revisions_root/
///   <revision_id>/
///     revision.json
///     conversation.json       # only for multi-turn revisions
/// ```
///
/// Status updates rewrite `metadata.json` through a temp file and rename.
/// One writer per change at a time is expected; there is no record locking.
pub struct HistoryStore {
    paths: HistoryPaths,
    changes: JsonStorage,
    revisions: JsonStorage,
    workspace: Arc<dyn WorkspaceFs>,
}

impl HistoryStore {
    /// Create a store over explicit roots and a workspace.
    pub fn new(paths: HistoryPaths, workspace: Arc<dyn WorkspaceFs>) -> Self {
        Self {
            changes: JsonStorage::new(&paths.changes_root),
            revisions: JsonStorage::new(&paths.revisions_root),
            paths,
            workspace,
        }
    }

    /// Open the store for a configuration, editing files under its project root.
    pub fn open(config: &HistoryConfig) -> HistoryResult<Self> {
        let paths = HistoryPaths::resolve(config)?;
        debug!(
            scope = %config.scope,
            changes_root = %paths.changes_root.display(),
            "Opening history store"
        );
        Ok(Self::new(
            paths,
            Arc::new(LocalWorkspace::new(&config.project_root)),
        ))
    }

    pub fn paths(&self) -> &HistoryPaths {
        &self.paths
    }

    pub(crate) fn workspace(&self) -> &dyn WorkspaceFs {
        self.workspace.as_ref()
    }

    /// Start a new revision and return its ID.
    ///
    /// A non-empty `conversation` is saved as the revision's transcript.
    pub fn record_base_revision(
        &self,
        description: &str,
        instructions: &str,
        response: &str,
        conversation: &[ConversationTurn],
    ) -> HistoryResult<String> {
        let revision_id = claim_id(&self.revisions, Identifier::revision)?;

        let record = RevisionRecord {
            revision_id: revision_id.clone(),
            description: description.to_string(),
            instructions: instructions.to_string(),
            response: response.to_string(),
            created_at: Utc::now(),
            has_conversation: !conversation.is_empty(),
        };
        self.revisions.write(&[&revision_id, REVISION_KEY], &record)?;

        if !conversation.is_empty() {
            self.revisions
                .write(&[&revision_id, CONVERSATION_KEY], &conversation)?;
        }

        info!(
            revision_id = %revision_id,
            turns = conversation.len(),
            "Recorded base revision"
        );

        Ok(revision_id)
    }

    /// Persist one file change and return its file-revision hash.
    ///
    /// Content blobs are written first and `metadata.json` last, so a reader
    /// never accepts a change whose content is incomplete. If any write fails
    /// the partial directory is removed on a best-effort basis.
    pub fn record_change(&self, request: &ChangeRequest) -> HistoryResult<String> {
        validate_id("revision ID", &request.revision_id)?;
        if request.filename.trim().is_empty() {
            return Err(HistoryError::validation("filename cannot be empty"));
        }
        let blobs = BlobNames::for_filename(&request.filename)?;

        let has_conversation = self
            .revisions
            .exists(&[&request.revision_id, CONVERSATION_KEY])?;

        let hash = claim_id(&self.changes, Identifier::change)?;
        let metadata = ChangeMetadata {
            version: METADATA_VERSION,
            filename: request.filename.clone(),
            file_revision_hash: hash.clone(),
            request_hash: request.revision_id.clone(),
            timestamp: Utc::now(),
            status: ChangeStatus::Active,
            note: request.note.clone().filter(|n| !n.is_empty()),
            description: request.description.clone(),
            agent_model: request.agent_model.clone(),
            instructions: request.instructions.clone(),
            response: request.response.clone(),
            has_conversation,
        };

        let written = self
            .changes
            .write_blob(&[&hash], &blobs.original, &encode_content(&request.original_content))
            .and_then(|()| {
                self.changes.write_blob(
                    &[&hash],
                    &blobs.updated,
                    &encode_content(&request.new_content),
                )
            })
            .and_then(|()| self.changes.write(&[&hash, METADATA_KEY], &metadata));

        if let Err(e) = written {
            warn!(hash = %hash, filename = %request.filename, error = %e, "Failed to record change");
            if let Err(cleanup) = self.changes.remove_dir(&[&hash]) {
                warn!(hash = %hash, error = %cleanup, "Failed to remove incomplete change");
            }
            return Err(e.into());
        }

        info!(
            revision_id = %request.revision_id,
            hash = %hash,
            filename = %request.filename,
            "Recorded change"
        );

        Ok(hash)
    }

    /// Read every change in the store, newest first.
    ///
    /// Entries without metadata (incomplete writes) and damaged entries are
    /// skipped so one bad directory never hides the rest of the history.
    pub fn fetch_all_changes(&self) -> HistoryResult<Vec<Change>> {
        let _timing = TimingGuard::scan("changes");

        let mut changes = Vec::new();
        for hash in self.changes.list(&[])? {
            match self.load_change(&hash) {
                Ok(Some(change)) => changes.push(change),
                Ok(None) => debug!(hash = %hash, "Skipping change directory without metadata"),
                Err(e) => warn!(hash = %hash, error = %e, "Skipping unreadable change"),
            }
        }

        sort_newest_first(&mut changes);
        Ok(changes)
    }

    /// Read a single change by its file-revision hash.
    pub fn change(&self, file_revision_hash: &str) -> HistoryResult<Change> {
        validate_id("file-revision hash", file_revision_hash)?;
        self.load_change(file_revision_hash)?.ok_or_else(|| {
            HistoryError::not_found(format!("change '{file_revision_hash}'"))
        })
    }

    fn load_change(&self, hash: &str) -> HistoryResult<Option<Change>> {
        let metadata: ChangeMetadata = match self.changes.read(&[hash, METADATA_KEY]) {
            Ok(Some(metadata)) => metadata,
            Ok(None) => return Ok(None),
            Err(StorageError::Json(e)) => {
                return Err(HistoryError::decode(format!("metadata for {hash}: {e}")))
            }
            Err(e) => return Err(e.into()),
        };

        if metadata.file_revision_hash != hash {
            warn!(
                hash = %hash,
                recorded = %metadata.file_revision_hash,
                "Metadata hash differs from its directory; using the directory name"
            );
        }

        let original = self.read_content(hash, &metadata.filename, true)?;
        let updated = self.read_content(hash, &metadata.filename, false)?;

        let mut change = metadata.into_change(original, updated);
        change.file_revision_hash = hash.to_string();
        Ok(Some(change))
    }

    fn read_content(&self, hash: &str, filename: &str, original: bool) -> HistoryResult<Vec<u8>> {
        let pick = |names: BlobNames| if original { names.original } else { names.updated };

        let mut candidates = Vec::with_capacity(2);
        if let Ok(names) = BlobNames::for_filename(filename) {
            candidates.push(pick(names));
        }
        let legacy = pick(BlobNames::legacy_for_filename(filename));
        if !candidates.contains(&legacy) {
            candidates.push(legacy);
        }

        for name in &candidates {
            if let Some(stored) = self.changes.read_blob(&[hash], name)? {
                let (content, encoding) = decode_content(&stored);
                if encoding == ContentEncoding::Legacy {
                    debug!(hash = %hash, blob = %name, "Read legacy raw content");
                }
                return Ok(content);
            }
        }

        Err(HistoryError::decode(format!(
            "missing {} content for {filename} in {hash}",
            if original { "original" } else { "updated" }
        )))
    }

    /// Rewrite the status of one change.
    ///
    /// Only the `status` field of `metadata.json` changes; the record is
    /// replaced atomically.
    pub fn update_status(&self, file_revision_hash: &str, status: ChangeStatus) -> HistoryResult<()> {
        validate_id("file-revision hash", file_revision_hash)?;
        let key = [file_revision_hash, METADATA_KEY];

        match self.changes.read::<ChangeMetadata>(&key) {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Err(HistoryError::not_found(format!(
                    "change '{file_revision_hash}'"
                )))
            }
            Err(StorageError::Json(e)) => {
                return Err(HistoryError::decode(format!(
                    "metadata for {file_revision_hash}: {e}"
                )))
            }
            Err(e) => return Err(e.into()),
        }

        self.changes
            .update(&key, |doc: &mut serde_json::Value| {
                if let Some(fields) = doc.as_object_mut() {
                    fields.insert("status".to_string(), status.as_str().into());
                }
            })?;

        debug!(hash = %file_revision_hash, status = %status, "Updated change status");
        Ok(())
    }

    /// Load the conversation transcript of a revision.
    ///
    /// A missing or unparseable transcript yields an empty conversation.
    pub fn load_conversation(&self, revision_id: &str) -> Vec<ConversationTurn> {
        match self
            .revisions
            .read::<Vec<ConversationTurn>>(&[revision_id, CONVERSATION_KEY])
        {
            Ok(Some(conversation)) => conversation,
            Ok(None) => Vec::new(),
            Err(e) => {
                debug!(revision_id = %revision_id, error = %e, "Ignoring unreadable conversation");
                Vec::new()
            }
        }
    }

    /// Read the record written when a revision was started.
    pub fn revision_record(&self, revision_id: &str) -> HistoryResult<Option<RevisionRecord>> {
        validate_id("revision ID", revision_id)?;
        Ok(self.revisions.read(&[revision_id, REVISION_KEY])?)
    }
}

/// Sort newest first; ties fall back to the hash so the order is stable.
pub(crate) fn sort_newest_first(changes: &mut [Change]) {
    changes.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.file_revision_hash.cmp(&a.file_revision_hash))
    });
}

/// Identifiers double as directory names, so they must be single path components.
pub(crate) fn validate_id(what: &str, id: &str) -> HistoryResult<()> {
    if id.trim().is_empty() {
        return Err(HistoryError::validation(format!("{what} cannot be empty")));
    }
    if id.trim() != id || id.contains(['/', '\\']) || id == "." || id == ".." {
        return Err(HistoryError::validation(format!(
            "{what} {id:?} is not a valid identifier"
        )));
    }
    Ok(())
}

/// Generate identifiers until one is free in the storage and claim its directory.
fn claim_id(storage: &JsonStorage, generate: fn() -> String) -> HistoryResult<String> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = generate();
        if storage.create_dir(&[&id])? {
            return Ok(id);
        }
        debug!(id = %id, "Identifier already taken, generating another");
    }
    Err(HistoryError::Io(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        format!(
            "could not claim a unique identifier in {}",
            storage.base_path().display()
        ),
    )))
}
