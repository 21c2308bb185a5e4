//! Artifact writer: one pretty-printed JSON file per recording.

use std::fs::FileTimes;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::DateTime;
use serde::Serialize;
use serde_json::Value;
use tokio::fs;

use super::error::ArtifactError;
use super::paths::{self, Partition};
use crate::grain::{Participant, RecordingDetail};

/// On-disk projection of a recording.
#[derive(Debug, Serialize)]
struct RecordingArtifact<'a> {
    id: &'a str,
    title: Option<&'a str>,
    url: Option<&'a str>,
    source: Option<&'a str>,
    start_datetime: Option<&'a str>,
    participants: &'a [Participant],
    transcript: &'a Value,
}

impl<'a> From<&'a RecordingDetail> for RecordingArtifact<'a> {
    fn from(detail: &'a RecordingDetail) -> Self {
        Self {
            id: &detail.id,
            title: detail.title.as_deref(),
            url: detail.url.as_deref(),
            source: detail.source.as_deref(),
            start_datetime: detail.start_datetime.as_deref(),
            participants: &detail.participants,
            transcript: &detail.transcript,
        }
    }
}

/// Where an artifact was written.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedArtifact {
    pub path: PathBuf,
    /// `Flat(UnparsableDate)` means the recording had a start date that could
    /// not be read; callers should surface that.
    pub partition: Partition,
}

/// Write `detail` under `output_root` and return the final path.
///
/// The JSON is written to a hidden `.part` sibling first and renamed into
/// place, so an interrupted write never leaves a file the existence index
/// would mistake for a finished artifact.
pub async fn persist(
    detail: &RecordingDetail,
    output_root: &Path,
) -> Result<PersistedArtifact, ArtifactError> {
    let (path, partition) = paths::artifact_path(
        output_root,
        &detail.id,
        detail.title.as_deref(),
        detail.start_datetime.as_deref(),
    );

    let dir = partition.dir(output_root);
    fs::create_dir_all(&dir)
        .await
        .map_err(|e| ArtifactError::CreateDir {
            path: dir.clone(),
            source: e,
        })?;

    let json = serde_json::to_vec_pretty(&RecordingArtifact::from(detail))?;

    let part_path = temp_artifact_path(&path);
    if let Err(e) = fs::write(&part_path, &json).await {
        let _ = fs::remove_file(&part_path).await;
        return Err(ArtifactError::Write {
            path: part_path,
            source: e,
        });
    }
    if let Err(e) = fs::rename(&part_path, &path).await {
        let _ = fs::remove_file(&part_path).await;
        return Err(ArtifactError::Write { path, source: e });
    }

    if let Some(ts) = detail
        .start_datetime
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.timestamp())
    {
        let mtime_path = path.clone();
        match tokio::task::spawn_blocking(move || set_file_mtime(&mtime_path, ts)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Could not set mtime on {}: {}", path.display(), e),
            Err(e) => tracing::warn!("mtime task failed for {}: {}", path.display(), e),
        }
    }

    Ok(PersistedArtifact { path, partition })
}

fn temp_artifact_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.part", name))
}

/// Stamp the artifact with the recording's start time. Dates before 1970
/// clamp to the epoch.
fn set_file_mtime(path: &Path, timestamp: i64) -> std::io::Result<()> {
    let time = if timestamp >= 0 {
        UNIX_EPOCH + Duration::from_secs(timestamp as u64)
    } else {
        SystemTime::UNIX_EPOCH
    };
    let times = FileTimes::new().set_modified(time).set_accessed(time);
    let file = std::fs::File::options().write(true).open(path)?;
    file.set_times(times)
}
