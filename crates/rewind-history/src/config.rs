//! History store configuration.
//!
//! The scope is resolved once at startup into concrete roots:
//! 1. Defaults: project scope
//! 2. Project file: `<project_root>/.rewind/history.json`
//! 3. Environment override: `REWIND_HISTORY_SCOPE`

use crate::{HistoryError, HistoryResult};
use rewind_util::path;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Environment variable that overrides the configured scope.
pub const SCOPE_ENV_VAR: &str = "REWIND_HISTORY_SCOPE";

/// File name of the project history config inside the `.rewind` directory.
pub const CONFIG_FILE_NAME: &str = "history.json";

/// Where history is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryScope {
    /// Inside the project: `<project_root>/.rewind/`.
    #[default]
    Project,
    /// Shared across projects in the user data directory.
    Global,
}

impl fmt::Display for HistoryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryScope::Project => f.write_str("project"),
            HistoryScope::Global => f.write_str("global"),
        }
    }
}

impl FromStr for HistoryScope {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "project" => Ok(HistoryScope::Project),
            "global" => Ok(HistoryScope::Global),
            other => Err(HistoryError::validation(format!(
                "invalid history scope {other:?} (expected project or global)"
            ))),
        }
    }
}

/// History configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    pub scope: HistoryScope,
    /// Working root that change filenames are relative to.
    pub project_root: PathBuf,
}

/// Shape of `.rewind/history.json`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    scope: Option<HistoryScope>,
}

impl HistoryConfig {
    /// Project-scoped configuration for a working root.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            scope: HistoryScope::default(),
            project_root: project_root.into(),
        }
    }

    pub fn with_scope(mut self, scope: HistoryScope) -> Self {
        self.scope = scope;
        self
    }

    /// Load configuration for a project, applying the file and environment layers.
    pub fn load(project_root: &Path) -> HistoryResult<Self> {
        let config = Self::load_file(project_root)?;
        config.apply_env_override(std::env::var(SCOPE_ENV_VAR).ok().as_deref())
    }

    /// Load configuration from the project file only.
    pub fn load_file(project_root: &Path) -> HistoryResult<Self> {
        let mut config = Self::new(project_root);
        let file = path::project_dir(project_root).join(CONFIG_FILE_NAME);

        match std::fs::read(&file) {
            Ok(content) => {
                let parsed: ConfigFile = serde_json::from_slice(&content)?;
                if let Some(scope) = parsed.scope {
                    config.scope = scope;
                }
                debug!(path = %file.display(), scope = %config.scope, "Loaded history config");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(HistoryError::Io(e)),
        }

        Ok(config)
    }

    /// Apply an environment scope value, if any.
    pub fn apply_env_override(mut self, value: Option<&str>) -> HistoryResult<Self> {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.scope = value.parse()?;
        }
        Ok(self)
    }
}

/// Concrete store roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPaths {
    /// Holds one directory per change.
    pub changes_root: PathBuf,
    /// Holds one directory per revision.
    pub revisions_root: PathBuf,
}

impl HistoryPaths {
    pub fn new(changes_root: impl Into<PathBuf>, revisions_root: impl Into<PathBuf>) -> Self {
        Self {
            changes_root: changes_root.into(),
            revisions_root: revisions_root.into(),
        }
    }

    /// `changes/` and `revisions/` under one directory.
    pub fn under(dir: &Path) -> Self {
        Self::new(dir.join("changes"), dir.join("revisions"))
    }

    /// Resolve the roots for a configuration.
    pub fn resolve(config: &HistoryConfig) -> HistoryResult<Self> {
        match config.scope {
            HistoryScope::Project => Ok(Self::under(&path::project_dir(&config.project_root))),
            HistoryScope::Global => path::data_dir()
                .map(|dir| Self::under(&dir.join("history")))
                .ok_or_else(|| {
                    HistoryError::validation("could not determine the user data directory")
                }),
        }
    }
}
