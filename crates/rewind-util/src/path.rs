//! Path utilities.
//!
//! This module provides utilities for working with file paths.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Name of the per-project rewind directory.
pub const PROJECT_DIR_NAME: &str = ".rewind";

/// Get the rewind data directory.
///
/// This follows XDG conventions:
/// - `$XDG_DATA_HOME/rewind` if set
/// - `~/.local/share/rewind` otherwise
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("rewind"))
}

/// Get the project-local rewind directory.
pub fn project_dir(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_DIR_NAME)
}

/// Check if a path is within a base directory.
///
/// This is used for security checks to prevent path traversal.
pub fn is_within(path: &Path, base: &Path) -> bool {
    match (path.canonicalize(), base.canonicalize()) {
        (Ok(p), Ok(b)) => p.starts_with(&b),
        // Paths that do not exist yet only get a plain prefix check.
        _ => path.starts_with(base),
    }
}

/// Normalize a path by removing `.` and `..` components.
///
/// Unlike `canonicalize`, this doesn't require the path to exist. Leading
/// `..` components of a relative path are kept; `..` at the root is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => result.push(".."),
            },
            Component::CurDir => {}
            _ => result.push(component),
        }
    }

    result
}

/// Make a path absolute against the current directory and normalize it.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(normalize(path))
    } else {
        Ok(normalize(&std::env::current_dir()?.join(path)))
    }
}

/// Make a path relative to a base directory.
///
/// Returns `None` if the path is not within the base directory.
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(|p| p.to_path_buf())
}

/// Join a path safely, preventing path traversal.
///
/// Returns `None` if the resulting path would be outside the base. A relative
/// base is resolved against the current directory first, so the result is
/// always absolute.
pub fn safe_join(base: &Path, path: &Path) -> Option<PathBuf> {
    let base = absolute(base).ok()?;
    let normalized = normalize(&base.join(path));

    if is_within(&normalized, &base) {
        Some(normalized)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_data_dir() {
        if let Some(dir) = data_dir() {
            assert!(dir.ends_with("rewind"));
        }
    }

    #[test]
    fn test_project_dir() {
        let dir = project_dir(Path::new("/work/app"));
        assert_eq!(dir, PathBuf::from("/work/app/.rewind"));
    }

    #[test]
    fn test_is_within() {
        let base = PathBuf::from("/home/user/project");
        assert!(is_within(Path::new("/home/user/project/src"), &base));
        assert!(!is_within(Path::new("/home/user/other"), &base));
    }

    #[test]
    fn test_normalize() {
        let path = Path::new("/home/user/./project/../project/src");
        assert_eq!(normalize(path), PathBuf::from("/home/user/project/src"));
    }

    #[test]
    fn test_normalize_keeps_leading_parent_dirs() {
        assert_eq!(normalize(Path::new("../../proj/./a.txt")), PathBuf::from("../../proj/a.txt"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize(Path::new("/../etc")), PathBuf::from("/etc"));
    }

    #[test]
    fn test_absolute() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute(Path::new("a/./b")).unwrap(), normalize(&cwd.join("a/b")));
        assert_eq!(absolute(Path::new("/x/../y")).unwrap(), PathBuf::from("/y"));
        assert!(absolute(Path::new("../up")).unwrap().is_absolute());
    }

    #[test]
    fn test_relative_to() {
        let base = Path::new("/home/user/project");
        let path = Path::new("/home/user/project/src/main.rs");
        assert_eq!(relative_to(path, base), Some(PathBuf::from("src/main.rs")));
        assert_eq!(relative_to(Path::new("/elsewhere"), base), None);
    }

    #[test]
    fn test_safe_join() {
        let base = PathBuf::from("/home/user/project");
        assert!(safe_join(&base, Path::new("src/main.rs")).is_some());
        assert!(safe_join(&base, Path::new("../../../etc/passwd")).is_none());
    }

    #[test]
    fn test_safe_join_existing_base() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();

        let joined = safe_join(dir.path(), Path::new("a.txt")).unwrap();
        assert!(joined.ends_with("a.txt"));
        assert!(safe_join(dir.path(), Path::new("new/nested.txt")).is_some());
        assert!(safe_join(dir.path(), Path::new("../outside.txt")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_safe_join_relative_base_with_parent_dirs() {
        let dir = tempdir().unwrap();
        let cwd = std::env::current_dir().unwrap();
        let mut base = PathBuf::new();
        for _ in cwd.components().skip(1) {
            base.push("..");
        }
        let base = base.join(dir.path().strip_prefix("/").unwrap());

        let joined = safe_join(&base, Path::new("a.txt")).unwrap();
        assert!(joined.is_absolute());
        assert_eq!(joined, normalize(&dir.path().join("a.txt")));
        assert!(safe_join(&base, Path::new("../../outside.txt")).is_none());
    }
}
