//! Sync engine: walks the recordings listing page by page, skips recordings
//! already on disk, persists the rest, and checkpoints the cursor after each
//! fully processed page.
//!
//! Everything runs in one control flow. A crash or abort mid-page resumes at
//! the start of that page; the existence index turns the replayed records
//! into no-ops, so each recording is written at most once across restarts.

pub mod artifact;
pub mod error;
pub mod paths;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::grain::{RecordingSource, RecordingSummary, SourceError};
use crate::state::{CheckpointState, CheckpointStore};

pub use error::SyncError;
use paths::{FlatReason, Partition};

/// Subset of application config consumed by the sync engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub(crate) output_root: PathBuf,
    /// Pause after each recording that was actually fetched and written.
    pub(crate) record_delay: Duration,
    /// Pause between listing pages.
    pub(crate) page_delay: Duration,
}

/// Counters for one run. `processed` continues from the resumed checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub processed: u64,
    pub persisted: u64,
    pub skipped_existing: u64,
    pub not_found: u64,
    pub malformed: u64,
    pub failed: u64,
    pub pages: u64,
}

/// How a run that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Listing exhausted; the checkpoint has been removed.
    Completed(SyncStats),
    /// Shutdown requested; the last page-boundary checkpoint is kept.
    Interrupted(SyncStats),
}

/// In-memory state of a run, owned by [`SyncEngine::run`].
#[derive(Debug)]
struct RunState {
    cursor: Option<String>,
    stats: SyncStats,
}

impl RunState {
    fn new(resume: Option<&CheckpointState>) -> Self {
        Self {
            cursor: resume.map(|c| c.cursor.clone()),
            stats: SyncStats {
                processed: resume.map_or(0, |c| c.processed_count),
                ..SyncStats::default()
            },
        }
    }

    fn abort(&self, source: SourceError) -> SyncError {
        SyncError::Aborted {
            processed: self.stats.processed,
            source,
        }
    }
}

/// Result of handling a single listed recording.
#[derive(Debug)]
enum RecordOutcome {
    Persisted,
    AlreadyPresent,
    NotFound,
    Malformed,
    WriteFailed,
}

pub struct SyncEngine<'a> {
    source: &'a dyn RecordingSource,
    checkpoints: &'a CheckpointStore,
    config: &'a SyncConfig,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        source: &'a dyn RecordingSource,
        checkpoints: &'a CheckpointStore,
        config: &'a SyncConfig,
    ) -> Self {
        Self {
            source,
            checkpoints,
            config,
        }
    }

    /// Run until the listing is exhausted, a transport failure aborts the
    /// run, or `shutdown` is cancelled.
    ///
    /// `resume` is the checkpoint to continue from; `None` starts from the
    /// first page.
    pub async fn run(
        &self,
        resume: Option<&CheckpointState>,
        shutdown: CancellationToken,
    ) -> Result<SyncOutcome, SyncError> {
        let started = Instant::now();
        let mut state = RunState::new(resume);
        if let Some(checkpoint) = resume {
            tracing::info!(
                processed = checkpoint.processed_count,
                "Resuming from checkpoint saved {}",
                checkpoint.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }

        loop {
            if shutdown.is_cancelled() {
                return Ok(self.interrupted(state));
            }

            let page_number = state.stats.pages + 1;
            tracing::info!(page = page_number, "Fetching page");
            let page = self
                .source
                .list_page(state.cursor.as_deref())
                .await
                .map_err(|e| state.abort(e))?;

            if page.recordings.is_empty() {
                tracing::info!(page = page_number, "Empty page, listing exhausted");
                break;
            }
            tracing::info!(
                page = page_number,
                count = page.recordings.len(),
                "Processing recordings"
            );

            for summary in &page.recordings {
                if shutdown.is_cancelled() {
                    return Ok(self.interrupted(state));
                }
                let index = state.stats.processed + 1;
                match self.process_record(summary, index).await {
                    Ok(RecordOutcome::Persisted) => {
                        state.stats.persisted += 1;
                        state.stats.processed += 1;
                        tokio::time::sleep(self.config.record_delay).await;
                    }
                    Ok(RecordOutcome::AlreadyPresent) => {
                        state.stats.skipped_existing += 1;
                        state.stats.processed += 1;
                    }
                    Ok(RecordOutcome::NotFound) => {
                        state.stats.not_found += 1;
                        state.stats.processed += 1;
                    }
                    Ok(RecordOutcome::Malformed) => {
                        state.stats.malformed += 1;
                        state.stats.processed += 1;
                    }
                    Ok(RecordOutcome::WriteFailed) => {
                        state.stats.failed += 1;
                        state.stats.processed += 1;
                    }
                    Err(e) => return Err(state.abort(e)),
                }
            }
            state.stats.pages += 1;

            let Some(next) = page.next_cursor else {
                break;
            };
            self.checkpoints
                .save(&next, state.stats.processed)
                .await
                .map_err(|e| SyncError::Checkpoint {
                    processed: state.stats.processed,
                    source: e,
                })?;
            tracing::info!(
                page = page_number,
                processed = state.stats.processed,
                "Page complete"
            );
            state.cursor = Some(next);
            tokio::time::sleep(self.config.page_delay).await;
        }

        if let Err(e) = self.checkpoints.clear().await {
            tracing::warn!("Sync completed but the checkpoint could not be removed: {}", e);
        }
        log_summary(&state.stats, &self.config.output_root, started.elapsed());
        Ok(SyncOutcome::Completed(state.stats))
    }

    fn interrupted(&self, state: RunState) -> SyncOutcome {
        tracing::info!(
            processed = state.stats.processed,
            "Shutdown requested, stopping before the next recording"
        );
        SyncOutcome::Interrupted(state.stats)
    }

    /// Existence check, then fetch and persist if needed.
    ///
    /// Only transport failures are returned as errors. A missing or
    /// undecodable recording, or a failed write, is logged here and reported
    /// through the outcome.
    async fn process_record(
        &self,
        summary: &RecordingSummary,
        index: u64,
    ) -> Result<RecordOutcome, SourceError> {
        let root = &self.config.output_root;
        tracing::info!(index, id = %summary.id, "Processing: {}", summary.display_title());

        if let Some(existing) =
            paths::find_persisted(root, &summary.id, summary.start_datetime.as_deref()).await
        {
            tracing::info!("  Already downloaded: {}", relative_to(&existing, root).display());
            return Ok(RecordOutcome::AlreadyPresent);
        }

        let detail = match self.source.fetch_detail(&summary.id).await {
            Ok(detail) => detail,
            Err(e) if e.is_not_found() => {
                tracing::warn!(id = %summary.id, "Recording disappeared before fetch, skipping");
                return Ok(RecordOutcome::NotFound);
            }
            Err(e) if e.is_malformed() => {
                tracing::warn!(id = %summary.id, "Skipping recording with malformed detail: {}", e);
                return Ok(RecordOutcome::Malformed);
            }
            Err(e) => return Err(e),
        };

        match artifact::persist(&detail, root).await {
            Ok(written) => {
                if written.partition == Partition::Flat(FlatReason::UnparsableDate) {
                    tracing::warn!(
                        id = %detail.id,
                        "Could not parse start date {:?}, saved at output root",
                        detail.start_datetime.as_deref().unwrap_or_default()
                    );
                }
                tracing::info!("  Saved: {}", relative_to(&written.path, root).display());
                Ok(RecordOutcome::Persisted)
            }
            Err(e) => {
                tracing::error!(id = %detail.id, "Failed to save recording: {}", e);
                Ok(RecordOutcome::WriteFailed)
            }
        }
    }
}

fn relative_to<'p>(path: &'p Path, root: &Path) -> &'p Path {
    path.strip_prefix(root).unwrap_or(path)
}

fn log_summary(stats: &SyncStats, output_root: &Path, elapsed: Duration) {
    tracing::info!("── Summary ──");
    tracing::info!(
        "  {} processed: {} saved, {} already present, {} not found, {} malformed, {} failed",
        stats.processed,
        stats.persisted,
        stats.skipped_existing,
        stats.not_found,
        stats.malformed,
        stats.failed
    );
    tracing::info!("  pages: {}", stats.pages);
    tracing::info!("  destination: {}", output_root.display());
    tracing::info!("  elapsed: {}", format_duration(elapsed));
}

fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {:02}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}
