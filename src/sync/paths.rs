//! Artifact placement and the filesystem existence index.
//!
//! Artifacts live at `<root>/YYYY/MM/DD/<id>_<title>.json`. The date comes
//! from the recording's `start_datetime`; when it is missing or unparsable the
//! artifact goes directly under `<root>`. Existence is keyed on the `<id>_`
//! prefix alone because titles can change between runs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Maximum characters kept from a sanitized title.
pub const MAX_TITLE_CHARS: usize = 50;

const UNTITLED: &str = "Untitled";

/// Why an artifact landed in the flat root instead of a date partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatReason {
    MissingDate,
    UnparsableDate,
}

/// Directory an artifact belongs to, relative to the output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Dated(NaiveDate),
    Flat(FlatReason),
}

impl Partition {
    pub fn for_start(start_datetime: Option<&str>) -> Self {
        match start_datetime {
            None => Partition::Flat(FlatReason::MissingDate),
            Some(raw) => match parse_start_date(raw) {
                Some(date) => Partition::Dated(date),
                None => Partition::Flat(FlatReason::UnparsableDate),
            },
        }
    }

    pub fn dir(&self, root: &Path) -> PathBuf {
        match self {
            Partition::Dated(date) => root
                .join(format!("{:04}", date.year()))
                .join(format!("{:02}", date.month()))
                .join(format!("{:02}", date.day())),
            Partition::Flat(_) => root.to_path_buf(),
        }
    }
}

/// Calendar date of an ISO 8601 timestamp, in the timestamp's own offset.
///
/// Accepts RFC 3339 (`2024-03-05T10:00:00Z`, `...+02:00`), offset-less
/// datetimes, and bare dates.
pub fn parse_start_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Keep ASCII letters, digits, space, `-` and `_`; trim; cap at
/// [`MAX_TITLE_CHARS`].
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let capped: String = kept.trim().chars().take(MAX_TITLE_CHARS).collect();
    capped.trim_end().to_string()
}

/// `<id>_<sanitized title>.json`
pub fn artifact_filename(id: &str, title: Option<&str>) -> String {
    format!("{}{}.json", id_prefix(id), sanitize_title(title.unwrap_or(UNTITLED)))
}

/// Full artifact path plus the partition it was placed in.
pub fn artifact_path(
    root: &Path,
    id: &str,
    title: Option<&str>,
    start_datetime: Option<&str>,
) -> (PathBuf, Partition) {
    let partition = Partition::for_start(start_datetime);
    let path = partition.dir(root).join(artifact_filename(id, title));
    (path, partition)
}

fn id_prefix(id: &str) -> String {
    format!("{}_", id)
}

/// Return the first artifact for `id` already present in its partition;
/// `None` means the recording still needs to be fetched.
///
/// Only regular files whose name starts with `<id>_` count. A missing or
/// unreadable partition directory means "not persisted".
pub async fn find_persisted(
    root: &Path,
    id: &str,
    start_datetime: Option<&str>,
) -> Option<PathBuf> {
    let dir = Partition::for_start(start_datetime).dir(root);
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!("Could not scan {}: {}", dir.display(), e);
            return None;
        }
    };

    let prefix = id_prefix(id);
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Error while scanning {}: {}", dir.display(), e);
                return None;
            }
        };
        let matches_id = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(&prefix));
        if !matches_id {
            continue;
        }
        if entry.file_type().await.is_ok_and(|t| t.is_file()) {
            return Some(entry.path());
        }
    }
}
