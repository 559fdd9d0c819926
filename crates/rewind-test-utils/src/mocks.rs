//! Mock implementations for testing.

use rewind_history::WorkspaceFs;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// An in-memory workspace that records writes and can refuse selected paths.
///
/// # Example
///
/// ```rust
/// use rewind_history::WorkspaceFs;
/// use rewind_test_utils::mocks::MockWorkspace;
/// use std::path::Path;
///
/// let workspace = MockWorkspace::new()
///     .with_file("a.txt", "hello")
///     .failing_on("b.txt");
///
/// assert_eq!(workspace.read_file(Path::new("a.txt")).unwrap(), b"hello");
/// assert!(workspace.write_file(Path::new("b.txt"), b"x").is_err());
/// ```
#[derive(Debug, Default)]
pub struct MockWorkspace {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    failing: HashSet<PathBuf>,
    writes: Mutex<Vec<PathBuf>>,
}

impl MockWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.files
            .lock()
            .expect("workspace lock poisoned")
            .insert(path.into(), contents.into());
        self
    }

    /// Make every write to `path` fail with `PermissionDenied`.
    pub fn failing_on(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing.insert(path.into());
        self
    }

    /// Current content of a file, if any.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files
            .lock()
            .expect("workspace lock poisoned")
            .get(path.as_ref())
            .cloned()
    }

    /// Paths of successful writes, in order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.lock().expect("workspace lock poisoned").clone()
    }
}

impl WorkspaceFs for MockWorkspace {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.contents(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
        })
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if self.failing.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is read-only", path.display()),
            ));
        }
        self.files
            .lock()
            .expect("workspace lock poisoned")
            .insert(path.to_path_buf(), contents.to_vec());
        self.writes
            .lock()
            .expect("workspace lock poisoned")
            .push(path.to_path_buf());
        Ok(())
    }
}
