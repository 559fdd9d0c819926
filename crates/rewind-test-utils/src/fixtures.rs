//! Test fixtures for creating reproducible history stores.
//!
//! A [`TestProject`] is a temporary working root; its history store lives in
//! the project's `.rewind` directory, as in project scope.

use rewind_history::{HistoryConfig, HistoryPaths, HistoryStore, LocalWorkspace, WorkspaceFs};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A temporary test project with configurable files.
///
/// The directory is removed when the built project is dropped.
pub struct TestProject {
    temp_dir: TempDir,
    /// Files to create (path relative to root -> contents).
    files: Vec<(PathBuf, Vec<u8>)>,
}

impl TestProject {
    /// Create a new test project builder with test logging enabled.
    pub fn new() -> Self {
        crate::init_test_logging();
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            files: Vec::new(),
        }
    }

    /// Add a file to the project. Parent directories are created automatically.
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        self.files
            .push((path.as_ref().to_path_buf(), contents.into()));
        self
    }

    /// Build the project, creating all files.
    pub fn build(self) -> BuiltTestProject {
        let project = BuiltTestProject {
            temp_dir: self.temp_dir,
        };
        for (path, contents) in &self.files {
            project.write_file(path, contents);
        }
        project
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// A built test project with files created on disk.
pub struct BuiltTestProject {
    temp_dir: TempDir,
}

impl BuiltTestProject {
    /// Get the path to the project root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Store roots inside the project's `.rewind` directory.
    pub fn history_paths(&self) -> HistoryPaths {
        HistoryPaths::resolve(&HistoryConfig::new(self.path()))
            .expect("Project scope always resolves")
    }

    /// A project-scoped store editing files in this project.
    pub fn store(&self) -> HistoryStore {
        self.store_with_workspace(Arc::new(LocalWorkspace::new(self.path())))
    }

    /// A store over this project's roots with a substitute workspace.
    pub fn store_with_workspace(&self, workspace: Arc<dyn WorkspaceFs>) -> HistoryStore {
        HistoryStore::new(self.history_paths(), workspace)
    }

    /// Read a file from the project as text.
    pub fn read_file(&self, path: impl AsRef<Path>) -> String {
        String::from_utf8(self.read_bytes(path)).expect("File is not valid UTF-8")
    }

    /// Read a file from the project as raw bytes.
    pub fn read_bytes(&self, path: impl AsRef<Path>) -> Vec<u8> {
        let full_path = self.path().join(path.as_ref());
        fs::read(&full_path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", full_path.display(), e))
    }

    /// Check if a file exists in the project.
    pub fn file_exists(&self, path: impl AsRef<Path>) -> bool {
        self.path().join(path.as_ref()).exists()
    }

    /// Write a file to the project (for modifying during tests).
    pub fn write_file(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) {
        let full_path = self.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!(
                    "Failed to create parent directory for {}: {}",
                    full_path.display(),
                    e
                )
            });
        }
        fs::write(&full_path, contents.as_ref())
            .unwrap_or_else(|e| panic!("Failed to write file {}: {}", full_path.display(), e));
    }

    /// Directory of one stored change.
    pub fn change_dir(&self, file_revision_hash: &str) -> PathBuf {
        self.history_paths().changes_root.join(file_revision_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_creates_files() {
        let project = TestProject::new()
            .with_file("src/main.rs", "fn main() {}")
            .with_file("bin/data.bin", vec![0u8, 1, 2])
            .build();

        assert_eq!(project.read_file("src/main.rs"), "fn main() {}");
        assert_eq!(project.read_bytes("bin/data.bin"), vec![0, 1, 2]);
        assert!(!project.file_exists("missing.txt"));
    }

    #[test]
    fn test_store_lives_in_project() {
        let project = TestProject::new().build();
        let paths = project.history_paths();

        assert!(paths.changes_root.starts_with(project.path()));
        assert!(project.store().fetch_all_changes().unwrap().is_empty());
    }
}
