//! JSON file-based storage implementation.
//!
//! Each document key is a separate JSON file:
//! `["chg_123", "metadata"]` -> `chg_123/metadata.json`.
//! Blobs live beside documents under a directory key:
//! `(["chg_123"], "main.rs.original")` -> `chg_123/main.rs.original`.

use crate::{StorageError, StorageResult};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// JSON file-based storage.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    base_path: PathBuf,
}

impl JsonStorage {
    /// Create a new JSON storage at the given base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// The directory every key is resolved under.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Reject empty keys and components that could escape the base path.
    fn validate(key: &[&str]) -> StorageResult<()> {
        for component in key {
            validate_component(component)?;
        }
        Ok(())
    }

    /// Get the file path for a key.
    fn key_to_path(&self, key: &[&str]) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::invalid_key("Key cannot be empty"));
        }

        let mut path = self.prefix_to_dir(key)?;
        path.set_extension("json");
        Ok(path)
    }

    /// Get the directory path for a prefix.
    fn prefix_to_dir(&self, prefix: &[&str]) -> StorageResult<PathBuf> {
        Self::validate(prefix)?;

        let mut path = self.base_path.clone();
        for component in prefix {
            path.push(component);
        }
        Ok(path)
    }

    /// Read a document. Returns `None` if the key doesn't exist.
    pub fn read<T: DeserializeOwned>(&self, key: &[&str]) -> StorageResult<Option<T>> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), "Reading from storage");

        match fs::read(&path) {
            Ok(content) => Ok(Some(serde_json::from_slice(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Write a document, creating parent directories if necessary.
    ///
    /// The write goes to a temporary file that is then renamed over the
    /// target, so readers see either the old or the new document.
    pub fn write<T: Serialize>(&self, key: &[&str], value: &T) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), "Writing to storage");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_vec_pretty(value)?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content)?;
        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(StorageError::Io(e));
        }

        Ok(())
    }

    /// Read, edit and atomically write back an existing document.
    ///
    /// Fails with [`StorageError::NotFound`] if the key does not exist.
    pub fn update<T, F>(&self, key: &[&str], editor: F) -> StorageResult<T>
    where
        T: DeserializeOwned + Serialize,
        F: FnOnce(&mut T),
    {
        let mut value: T = self
            .read(key)?
            .ok_or_else(|| StorageError::not_found(key))?;

        editor(&mut value);
        self.write(key, &value)?;

        Ok(value)
    }

    /// Check if a document exists.
    pub fn exists(&self, key: &[&str]) -> StorageResult<bool> {
        Ok(self.key_to_path(key)?.is_file())
    }

    /// Check if a directory exists under the given prefix.
    pub fn contains_dir(&self, prefix: &[&str]) -> StorageResult<bool> {
        Ok(self.prefix_to_dir(prefix)?.is_dir())
    }

    /// Create a directory for a prefix that must not exist yet.
    ///
    /// Returns `Ok(false)` if the directory already exists, which lets callers
    /// claim a fresh identifier without racing another writer.
    pub fn create_dir(&self, prefix: &[&str]) -> StorageResult<bool> {
        let dir = self.prefix_to_dir(prefix)?;
        if let Some(parent) = dir.parent() {
            fs::create_dir_all(parent)?;
        }

        match fs::create_dir(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Remove a directory and everything inside it. Missing directories are ignored.
    pub fn remove_dir(&self, prefix: &[&str]) -> StorageResult<()> {
        let dir = self.prefix_to_dir(prefix)?;
        debug!(path = %dir.display(), "Removing directory from storage");

        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Read a raw blob stored under a directory prefix.
    pub fn read_blob(&self, prefix: &[&str], name: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_component(name)?;
        let path = self.prefix_to_dir(prefix)?.join(name);

        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Write a raw blob under a directory prefix, creating the directory.
    pub fn write_blob(&self, prefix: &[&str], name: &str, bytes: &[u8]) -> StorageResult<()> {
        validate_component(name)?;
        let dir = self.prefix_to_dir(prefix)?;
        fs::create_dir_all(&dir)?;

        let path = dir.join(name);
        debug!(path = %path.display(), bytes = bytes.len(), "Writing blob to storage");
        fs::write(path, bytes)?;

        Ok(())
    }

    /// List the names of all directories directly under a prefix.
    ///
    /// A missing prefix directory yields an empty list.
    pub fn list(&self, prefix: &[&str]) -> StorageResult<Vec<String>> {
        let dir = self.prefix_to_dir(prefix)?;
        debug!(path = %dir.display(), "Listing storage");

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let mut results = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                results.push(name.to_string());
            }
        }
        results.sort();

        Ok(results)
    }
}

fn validate_component(component: &str) -> StorageResult<()> {
    if component.is_empty()
        || component.contains('/')
        || component.contains('\\')
        || component == "."
        || component == ".."
    {
        return Err(StorageError::invalid_key(format!(
            "Invalid key component: {component:?}"
        )));
    }
    Ok(())
}
