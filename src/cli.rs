use clap::{Args, Parser, Subcommand};

use crate::grain::client::DEFAULT_BASE_URL;
use crate::state::DEFAULT_STATE_FILE;
use crate::types::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "grain-sync",
    version,
    about = "Download Grain recordings and transcripts as JSON",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Sync options when no subcommand is given
    #[command(flatten)]
    pub sync: SyncArgs,

    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,
}

impl Cli {
    /// The command to run; bare `grain-sync` means `grain-sync sync`.
    pub fn effective_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Sync(self.sync.clone()))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download every recording not yet on disk (default)
    Sync(SyncArgs),
    /// Show the saved checkpoint, if any
    Status(StatusArgs),
    /// Delete the saved checkpoint
    ResetState(ResetStateArgs),
    /// Fetch and save only the first listed recording
    Sample(SampleArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    /// Workspace access token
    #[arg(long, env = "GRAIN_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Workspace API base URL
    #[arg(long, env = "GRAIN_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Retries for rate-limited or failed requests before giving up
    #[arg(long, default_value_t = 2)]
    pub max_retries: u32,

    /// Base delay in seconds for retry backoff
    #[arg(long, default_value_t = 5)]
    pub retry_delay: u64,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output directory for recording JSON files
    #[arg(short = 'd', long, default_value = "recordings")]
    pub directory: String,
}

#[derive(Args, Debug, Clone)]
pub struct StateArgs {
    /// Checkpoint file used to resume interrupted syncs
    #[arg(long, default_value = DEFAULT_STATE_FILE)]
    pub state_file: String,
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub state: StateArgs,

    /// Pause after each downloaded recording, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub record_delay_ms: u64,

    /// Pause between listing pages, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub page_delay_ms: u64,

    /// Resume from a saved checkpoint without asking
    #[arg(long, conflicts_with = "fresh")]
    pub resume: bool,

    /// Discard any saved checkpoint and start from the first page
    #[arg(long)]
    pub fresh: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub state: StateArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ResetStateArgs {
    #[command(flatten)]
    pub state: StateArgs,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SampleArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_invocation_is_sync_with_defaults() {
        let cli = Cli::try_parse_from(["grain-sync"]).unwrap();
        match cli.effective_command() {
            Command::Sync(args) => {
                assert_eq!(args.output.directory, "recordings");
                assert_eq!(args.state.state_file, ".cursor_state.json");
                assert_eq!(args.record_delay_ms, 1000);
                assert_eq!(args.page_delay_ms, 500);
                assert_eq!(args.api.max_retries, 2);
                assert!(!args.resume && !args.fresh);
            }
            other => panic!("expected sync, got {:?}", other),
        }
        assert_eq!(cli.log_level, LogLevel::Info);
    }

    #[test]
    fn test_sync_subcommand_flags() {
        let cli = Cli::try_parse_from([
            "grain-sync",
            "sync",
            "--api-token",
            "tok",
            "-d",
            "/tmp/out",
            "--resume",
            "--page-delay-ms",
            "0",
        ])
        .unwrap();
        let Command::Sync(args) = cli.effective_command() else {
            panic!("expected sync");
        };
        assert_eq!(args.api.api_token.as_deref(), Some("tok"));
        assert_eq!(args.output.directory, "/tmp/out");
        assert!(args.resume);
        assert_eq!(args.page_delay_ms, 0);
    }

    #[test]
    fn test_resume_conflicts_with_fresh() {
        assert!(Cli::try_parse_from(["grain-sync", "--resume", "--fresh"]).is_err());
    }

    #[test]
    fn test_reset_state_subcommand() {
        let cli = Cli::try_parse_from(["grain-sync", "reset-state", "-y", "--state-file", "s.json"])
            .unwrap();
        let Command::ResetState(args) = cli.effective_command() else {
            panic!("expected reset-state");
        };
        assert!(args.yes);
        assert_eq!(args.state.state_file, "s.json");
    }

    #[test]
    fn test_global_log_level_after_subcommand() {
        let cli = Cli::try_parse_from(["grain-sync", "status", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert!(matches!(cli.effective_command(), Command::Status(_)));
    }
}
