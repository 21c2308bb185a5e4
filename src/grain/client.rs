use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::error::SourceError;
use super::source::RecordingSource;
use super::types::{RecordingDetail, RecordingPage};
use crate::retry::{self, RetryAction, RetryConfig};

pub const DEFAULT_BASE_URL: &str = "https://api.grain.com/_/workspace-api";

const DEFAULT_USER_AGENT: &str = concat!("grain-sync/", env!("CARGO_PKG_VERSION"));

/// Listing and detail requests always ask for participants and owners.
const INCLUDE_PARAMS: &[(&str, &str)] = &[
    ("include_participants", "true"),
    ("include_owners", "true"),
];

/// Connection settings for [`GrainClient`].
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_token: String,
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// HTTP client for the Grain workspace API.
#[derive(Debug, Clone)]
pub struct GrainClient {
    client: Client,
    base_url: String,
    retry: RetryConfig,
}

impl GrainClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_token))
            .context("API token contains characters that are not valid in an HTTP header")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry,
        })
    }

    fn recordings_url(&self) -> String {
        format!("{}/recordings", self.base_url)
    }

    fn recording_url(&self, id: &str) -> String {
        format!("{}/recordings/{}", self.base_url, id)
    }

    /// GET `url` and decode the JSON body, retrying transient failures.
    ///
    /// A 404 maps to `NotFound` only when `not_found_id` is given; on the
    /// listing endpoint it stays an ordinary HTTP status error.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        not_found_id: Option<&str>,
    ) -> Result<T, SourceError> {
        retry::retry_with_backoff(
            &self.retry,
            |e: &SourceError| {
                if e.is_retryable() {
                    RetryAction::Retry
                } else {
                    RetryAction::Abort
                }
            },
            || self.attempt_get(url, query, not_found_id),
        )
        .await
    }

    async fn attempt_get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        not_found_id: Option<&str>,
    ) -> Result<T, SourceError> {
        tracing::debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| SourceError::Http {
                source: e,
                url: url.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = not_found_id {
                return Err(SourceError::NotFound { id: id.to_string() });
            }
        }
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(|e| SourceError::Http {
            source: e,
            url: url.to_string(),
        })?;
        serde_json::from_slice(&body).map_err(|e| SourceError::Decode {
            source: e,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl RecordingSource for GrainClient {
    async fn list_page(&self, cursor: Option<&str>) -> Result<RecordingPage, SourceError> {
        let mut query: Vec<(&str, &str)> = INCLUDE_PARAMS.to_vec();
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }
        self.get_json(&self.recordings_url(), &query, None).await
    }

    async fn fetch_detail(&self, id: &str) -> Result<RecordingDetail, SourceError> {
        let mut query: Vec<(&str, &str)> = INCLUDE_PARAMS.to_vec();
        query.push(("transcript_format", "json"));
        self.get_json(&self.recording_url(id), &query, Some(id)).await
    }
}
