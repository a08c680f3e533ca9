use crate::error::ConfigError;
use crate::graph::ConnectionPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tunables of a [`Session`](super::Session).
///
/// Every field is optional in the JSON form:
///
/// ```json
/// { "halt_on_error": true, "connection_policy": "replace", "history_limit": 100 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Whether a failing command stops the rest of its action.
    pub halt_on_error: bool,
    /// What connecting a second source into an already-driven input does.
    pub connection_policy: ConnectionPolicy,
    /// Maximum number of actions kept in the undo history. Unbounded when `None`.
    pub history_limit: Option<usize>,
    /// Base directory for relative network `source` paths.
    pub source_root: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            halt_on_error: true,
            connection_policy: ConnectionPolicy::Reject,
            history_limit: None,
            source_root: None,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn with_halt_on_error(mut self, halt_on_error: bool) -> Self {
        self.halt_on_error = halt_on_error;
        self
    }

    pub fn with_connection_policy(mut self, policy: ConnectionPolicy) -> Self {
        self.connection_policy = policy;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }
}
