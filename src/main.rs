//! grain-sync — resumable downloader for Grain workspace recordings.
//!
//! Walks the workspace's recordings listing page by page and stores each
//! recording, with participants and transcript, as a JSON file under a
//! `YYYY/MM/DD` tree. Progress is checkpointed after every page so an
//! interrupted run picks up where it stopped without downloading anything
//! twice.

#![warn(clippy::all)]

mod cli;
mod config;
mod grain;
pub mod retry;
mod shutdown;
mod state;
mod sync;
mod types;

use std::io::{IsTerminal, Write};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Command;
use grain::{GrainClient, RecordingSource};
use state::{CheckpointState, CheckpointStore};
use sync::{SyncEngine, SyncOutcome};
use types::ResumeMode;

/// Ask a yes/no question on stdin. Anything but `y`/`yes` means no.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let answer = input.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

/// Decide whether to continue from a saved checkpoint.
///
/// Declining discards the checkpoint so the next save starts fresh.
async fn resolve_resume(
    store: &CheckpointStore,
    mode: ResumeMode,
) -> anyhow::Result<Option<CheckpointState>> {
    let Some(checkpoint) = store.load().await else {
        return Ok(None);
    };

    tracing::info!(
        "Found saved state from {}",
        checkpoint.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    tracing::info!("Already processed: {} recordings", checkpoint.processed_count);

    let resume = match mode {
        ResumeMode::Resume => true,
        ResumeMode::Fresh => false,
        ResumeMode::Ask if std::io::stdin().is_terminal() => {
            confirm("Resume from saved state? [y/N] ")?
        }
        ResumeMode::Ask => {
            tracing::info!("Non-interactive session, resuming from saved state");
            true
        }
    };

    if resume {
        Ok(Some(checkpoint))
    } else {
        store.clear().await?;
        tracing::info!("Discarded saved state, starting from the first page");
        Ok(None)
    }
}

async fn run_sync(args: cli::SyncArgs) -> anyhow::Result<()> {
    let config = config::Config::from_cli(args)?;
    tracing::debug!(?config, "Resolved configuration");

    let store = CheckpointStore::new(&config.state_file);
    let resume = resolve_resume(&store, config.resume_mode).await?;
    let client = GrainClient::new(config.client.clone())?;
    let shutdown_token = shutdown::install_signal_handler()?;
    let sync_config = config.sync_config();

    tracing::info!(
        destination = %config.directory.display(),
        "Fetching all recordings..."
    );
    let engine = SyncEngine::new(&client, &store, &sync_config);
    match engine.run(resume.as_ref(), shutdown_token).await {
        Ok(SyncOutcome::Completed(stats)) => {
            tracing::info!("Completed! Processed {} recordings", stats.processed);
            if stats.failed > 0 {
                tracing::warn!(
                    "{} recordings could not be saved; run again to retry them",
                    stats.failed
                );
            }
            if stats.malformed > 0 {
                tracing::warn!(
                    "{} recordings returned an unexpected body and were skipped",
                    stats.malformed
                );
            }
            Ok(())
        }
        Ok(SyncOutcome::Interrupted(stats)) => {
            tracing::info!(
                "Stopped after {} recordings. Run again to resume from {}",
                stats.processed,
                store.path().display()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Error during processing: {}", e);
            tracing::error!(
                "Processed {} recordings. Progress up to the last completed page is saved \
                 in {}; run again to resume",
                e.processed(),
                store.path().display()
            );
            Err(e.into())
        }
    }
}

async fn run_status(args: cli::StatusArgs) -> anyhow::Result<()> {
    let store = CheckpointStore::new(config::expand_tilde(&args.state.state_file));

    let Some(checkpoint) = store.load().await else {
        println!("No saved state at {}", store.path().display());
        println!("The next sync starts from the first page.");
        return Ok(());
    };

    println!("Checkpoint: {}", store.path().display());
    println!();
    println!("  Processed:  {}", checkpoint.processed_count);
    println!(
        "  Saved at:   {}",
        checkpoint.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Cursor:     {}", checkpoint.cursor);
    Ok(())
}

async fn run_reset_state(args: cli::ResetStateArgs) -> anyhow::Result<()> {
    let store = CheckpointStore::new(config::expand_tilde(&args.state.state_file));

    if !store.path().exists() {
        println!("No saved state at {}", store.path().display());
        return Ok(());
    }

    if !args.yes {
        println!("This will delete the checkpoint at:");
        println!("  {}", store.path().display());
        println!();
        if !confirm("Are you sure? [y/N] ")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.clear().await?;
    println!("Saved state deleted.");
    Ok(())
}

/// Save just the first listed recording, for checking credentials and the
/// output format before a full sync.
async fn run_sample(args: cli::SampleArgs) -> anyhow::Result<()> {
    let client = GrainClient::new(config::client_config(&args.api)?)?;
    let directory = config::expand_tilde(&args.output.directory);

    let page = client
        .list_page(None)
        .await
        .context("Failed to list recordings")?;
    let Some(first) = page.recordings.first() else {
        println!("No recordings found in workspace");
        return Ok(());
    };

    tracing::info!(id = %first.id, "Fetching recording: {}", first.display_title());
    let detail = client
        .fetch_detail(&first.id)
        .await
        .with_context(|| format!("Failed to fetch recording {}", first.id))?;
    let written = sync::artifact::persist(&detail, &directory)
        .await
        .context("Failed to save recording")?;

    println!("Sample complete! Check the output at: {}", written.path.display());
    println!("Run `grain-sync sync` to fetch all recordings.");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();

    match cli.effective_command() {
        Command::Sync(args) => run_sync(args).await,
        Command::Status(args) => run_status(args).await,
        Command::ResetState(args) => run_reset_state(args).await,
        Command::Sample(args) => run_sample(args).await,
    }
}
