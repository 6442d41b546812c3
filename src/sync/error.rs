use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::catalog::error::CatalogError;
use crate::source::error::SourceError;

/// One problem found while validating the sync entry list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub entity_key: String,
    pub message: String,
}

impl ConfigIssue {
    pub fn new(entity_key: &str, message: impl Into<String>) -> Self {
        Self {
            entity_key: entity_key.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entity_key, self.message)
    }
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  - {issue}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors that stop a run before any network activity
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Failed to read sync config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse sync config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid sync config ({} issues):\n{}", .0.len(), format_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

/// Per-entity failure reported by the orchestrator
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("No adapter registered for {entity_key}")]
    NoAdapter { entity_key: String },

    #[error("{0} is not in the sync config")]
    UnknownEntity(String),

    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}
