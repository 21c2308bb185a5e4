//! Error types for the checkpoint store.

use std::path::PathBuf;

use thiserror::Error;

/// Failures writing or removing the checkpoint file.
///
/// Reading never fails: a missing or corrupt checkpoint is reported as absent.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Checkpoint I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode checkpoint: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StateError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
