//! Structured error types for the ACVP harness

use crate::model::{DocumentKind, TestFamily};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("cannot read vector file {}: {source}", .path.display())]
    VectorRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid vector file {}: {source}", .path.display())]
    VectorParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{family}: {document} was not loaded")]
    MissingDocument {
        family: TestFamily,
        document: DocumentKind,
    },

    #[error("{family}: no group with tgId {group_id} in {document}")]
    GroupMismatch {
        family: TestFamily,
        document: DocumentKind,
        group_id: u64,
    },

    #[error("{family}: no case with tcId {case_id} in group {group_id} of {document}")]
    CaseMismatch {
        family: TestFamily,
        document: DocumentKind,
        group_id: u64,
        case_id: u64,
    },

    #[error(
        "{family}: missing required field `{field}` in group {group_id}{}",
        .case_id.map(|id| format!(" case {id}")).unwrap_or_default()
    )]
    MissingField {
        family: TestFamily,
        group_id: u64,
        case_id: Option<u64>,
        field: &'static str,
    },

    #[error("cannot read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HarnessError {
    /// True when a vector file simply is not there yet, as opposed to being unreadable or malformed.
    pub fn is_missing_vectors(&self) -> bool {
        matches!(
            self,
            HarnessError::VectorRead { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;

/// The subject could not be started at all.
///
/// Never escapes the runner: it is folded into a synthetic failing result.
#[derive(Debug, Error)]
#[error("failed to start subject `{}`: {source}", .program.display())]
pub struct LaunchError {
    pub program: PathBuf,
    #[source]
    pub source: std::io::Error,
}
