use std::path::PathBuf;

use thiserror::Error;

use crate::grain::SourceError;
use crate::state::StateError;

/// Failure writing a single artifact. Fatal for that recording only.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode artifact: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Run-level failures. Both leave the last page-boundary checkpoint on disk
/// and carry the number of recordings processed before the failure.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Sync aborted after {processed} recordings: {source}")]
    Aborted { processed: u64, source: SourceError },

    #[error("Could not save checkpoint after {processed} recordings: {source}")]
    Checkpoint { processed: u64, source: StateError },
}

impl SyncError {
    pub fn processed(&self) -> u64 {
        match self {
            SyncError::Aborted { processed, .. } | SyncError::Checkpoint { processed, .. } => {
                *processed
            }
        }
    }
}
