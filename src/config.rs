use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{ApiArgs, SyncArgs};
use crate::grain::ClientConfig;
use crate::retry::RetryConfig;
use crate::sync::SyncConfig;
use crate::types::ResumeMode;

/// Resolved settings for a sync run.
#[derive(Debug)]
pub struct Config {
    pub client: ClientConfig,
    pub directory: PathBuf,
    pub state_file: PathBuf,
    pub record_delay: Duration,
    pub page_delay: Duration,
    pub resume_mode: ResumeMode,
}

pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Build HTTP client settings, requiring a non-empty token.
pub fn client_config(api: &ApiArgs) -> anyhow::Result<ClientConfig> {
    let api_token = match api.api_token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => anyhow::bail!(
            "No API token. Set the GRAIN_API_TOKEN environment variable or pass --api-token"
        ),
    };
    if api.base_url.trim().is_empty() {
        anyhow::bail!("--base-url must not be empty");
    }

    Ok(ClientConfig {
        base_url: api.base_url.trim().to_string(),
        api_token,
        timeout: Duration::from_secs(api.timeout),
        retry: RetryConfig {
            max_retries: api.max_retries,
            base_delay_secs: api.retry_delay,
            ..RetryConfig::default()
        },
    })
}

impl Config {
    pub fn from_cli(args: SyncArgs) -> anyhow::Result<Self> {
        Ok(Self {
            client: client_config(&args.api)?,
            directory: expand_tilde(&args.output.directory),
            state_file: expand_tilde(&args.state.state_file),
            record_delay: Duration::from_millis(args.record_delay_ms),
            page_delay: Duration::from_millis(args.page_delay_ms),
            resume_mode: ResumeMode::from_flags(args.resume, args.fresh),
        })
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            output_root: self.directory.clone(),
            record_delay: self.record_delay,
            page_delay: self.page_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;

    fn sync_args(extra: &[&str]) -> SyncArgs {
        let mut argv = vec!["grain-sync", "sync"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().effective_command() {
            Command::Sync(args) => args,
            other => panic!("expected sync, got {:?}", other),
        }
    }

    #[test]
    fn test_expand_tilde_with_home() {
        let result = expand_tilde("~/recordings");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(result, home.join("recordings"));
        }
    }

    #[test]
    fn test_expand_tilde_no_prefix() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_tilde("recordings"), PathBuf::from("recordings"));
    }

    #[test]
    fn test_from_cli_maps_delays_and_retry() {
        let cfg = Config::from_cli(sync_args(&[
            "--api-token",
            "tok",
            "--record-delay-ms",
            "250",
            "--page-delay-ms",
            "0",
            "--max-retries",
            "4",
            "--retry-delay",
            "1",
        ]))
        .unwrap();
        assert_eq!(cfg.record_delay, Duration::from_millis(250));
        assert_eq!(cfg.page_delay, Duration::ZERO);
        assert_eq!(cfg.client.retry.max_retries, 4);
        assert_eq!(cfg.client.retry.base_delay_secs, 1);
        assert_eq!(cfg.resume_mode, ResumeMode::Ask);

        let sync = cfg.sync_config();
        assert_eq!(sync.output_root, PathBuf::from("recordings"));
        assert_eq!(sync.record_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_from_cli_resume_flags() {
        let cfg = Config::from_cli(sync_args(&["--api-token", "tok", "--fresh"])).unwrap();
        assert_eq!(cfg.resume_mode, ResumeMode::Fresh);
    }

    #[test]
    fn test_blank_token_rejected() {
        let mut args = sync_args(&["--api-token", "tok"]);
        args.api.api_token = Some("   ".to_string());
        assert!(Config::from_cli(args.clone()).is_err());
        args.api.api_token = None;
        assert!(Config::from_cli(args).is_err());
    }

    #[test]
    fn test_debug_hides_token() {
        let cfg = Config::from_cli(sync_args(&["--api-token", "very-secret"])).unwrap();
        assert!(!format!("{:?}", cfg).contains("very-secret"));
    }
}
