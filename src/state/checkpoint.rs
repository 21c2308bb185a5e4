use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::fs;

use super::error::StateError;

pub const DEFAULT_STATE_FILE: &str = ".cursor_state.json";

/// Last completed pagination position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointState {
    /// Cursor of the first page not yet fully processed.
    pub cursor: String,
    pub processed_count: u64,
    #[serde(rename = "timestamp", deserialize_with = "deserialize_saved_at")]
    pub saved_at: DateTime<Utc>,
}

/// Accept RFC 3339 timestamps as well as offset-less ISO timestamps, which
/// are read as local time.
fn deserialize_saved_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

/// Reads and writes the checkpoint file at one well-known path.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling temp file used for write-then-rename.
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
        self.path.with_file_name(format!(".{}.tmp", name.trim_start_matches('.')))
    }

    /// Overwrite the checkpoint with `cursor` and `processed_count`.
    ///
    /// The new content is written to a temp file and renamed into place, so a
    /// reader sees either the previous checkpoint or the new one.
    pub async fn save(
        &self,
        cursor: &str,
        processed_count: u64,
    ) -> Result<CheckpointState, StateError> {
        let state = CheckpointState {
            cursor: cursor.to_string(),
            processed_count,
            saved_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&state)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StateError::io(parent, e))?;
            }
        }

        let tmp = self.temp_path();
        fs::write(&tmp, &json)
            .await
            .map_err(|e| StateError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StateError::io(&self.path, e));
        }

        tracing::debug!(processed = processed_count, "Saved checkpoint");
        Ok(state)
    }

    /// Load the checkpoint, if any.
    ///
    /// Unreadable or unparsable content is logged and treated as absent.
    pub async fn load(&self) -> Option<CheckpointState> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(
                    "Could not read checkpoint {}: {}. Starting without it.",
                    self.path.display(),
                    e
                );
                return None;
            }
        };

        match serde_json::from_slice::<CheckpointState>(&bytes) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(
                    "Ignoring corrupt checkpoint {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Remove the checkpoint. Succeeds if it is already gone.
    pub async fn clear(&self) -> Result<(), StateError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!("Removed checkpoint {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StateError::io(&self.path, e)),
        }
    }
}
