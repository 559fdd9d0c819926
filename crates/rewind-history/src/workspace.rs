//! Access to the files the agent edits.
//!
//! Reverting and restoring write through [`WorkspaceFs`] so the engine never
//! assumes a process-wide working directory.

use rewind_util::path;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Filesystem the recorded filenames are relative to.
pub trait WorkspaceFs: Send + Sync {
    /// Read the full content of a file.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replace the full content of a file, creating parent directories.
    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// Workspace backed by a directory on the local disk.
#[derive(Debug, Clone)]
pub struct LocalWorkspace {
    root: PathBuf,
}

impl LocalWorkspace {
    /// Create a workspace rooted at `root`.
    ///
    /// A relative root is resolved against the current directory once, here,
    /// so every recorded filename lands under the same absolute directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = path::absolute(&root).unwrap_or(root);
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a filename against the root, refusing paths that escape it.
    pub fn resolve(&self, file: &Path) -> io::Result<PathBuf> {
        let resolved = if file.is_absolute() {
            path::relative_to(&path::normalize(file), &self.root).and_then(|rel| path::safe_join(&self.root, &rel))
        } else {
            path::safe_join(&self.root, file)
        };

        resolved.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "{} is outside the workspace root {}",
                    file.display(),
                    self.root.display()
                ),
            )
        })
    }
}

impl WorkspaceFs for LocalWorkspace {
    fn read_file(&self, file: &Path) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(file)?)
    }

    fn write_file(&self, file: &Path, contents: &[u8]) -> io::Result<()> {
        let target = self.resolve(file)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, contents)
    }
}
