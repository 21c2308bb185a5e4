use async_trait::async_trait;

use super::error::SourceError;
use super::types::{RecordingDetail, RecordingPage};

/// Paginated access to a workspace's recordings.
///
/// Implementations hold no local state beyond their transport. The cursor is
/// opaque: callers pass back exactly what the previous page returned.
#[async_trait]
pub trait RecordingSource: Send + Sync {
    /// List one page of recordings, starting at `cursor` (or the beginning).
    async fn list_page(&self, cursor: Option<&str>) -> Result<RecordingPage, SourceError>;

    /// Fetch a single recording with participants and transcript.
    async fn fetch_detail(&self, id: &str) -> Result<RecordingDetail, SourceError>;
}
