use thiserror::Error;

/// Errors from the recording source.
///
/// `NotFound` means the recording vanished between listing and detail fetch.
/// `Decode` means the body arrived but did not have the expected shape. The
/// engine skips a recording on either. The remaining variants are transport
/// failures that abort the run; `is_retryable()` decides which of those are
/// worth another attempt before giving up.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Recording {id} not found")]
    NotFound { id: String },

    #[error("HTTP error {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("HTTP request to {url} failed: {source}")]
    Http { source: reqwest::Error, url: String },

    #[error("Unexpected response body from {url}: {source}")]
    Decode {
        source: serde_json::Error,
        url: String,
    },
}

impl SourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, SourceError::Decode { .. })
    }

    /// Whether this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            SourceError::Http { source, .. } => !source.is_builder(),
            SourceError::NotFound { .. } => false,
            SourceError::Decode { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16) -> SourceError {
        SourceError::HttpStatus {
            status,
            url: "x".into(),
        }
    }

    #[test]
    fn test_client_errors_not_retryable() {
        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!status(403).is_retryable());
    }

    #[test]
    fn test_rate_limit_and_server_errors_retryable() {
        assert!(status(429).is_retryable());
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
    }

    #[test]
    fn test_not_found_is_skippable_not_retryable() {
        let e = SourceError::NotFound { id: "rec_1".into() };
        assert!(e.is_not_found());
        assert!(!e.is_retryable());
        assert!(!status(500).is_not_found());
    }

    #[test]
    fn test_decode_is_malformed_not_retryable() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e = SourceError::Decode {
            source,
            url: "x".into(),
        };
        assert!(e.is_malformed());
        assert!(!e.is_retryable());
        assert!(!status(502).is_malformed());
    }

    #[test]
    fn test_connection_error_retryable() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let err = rt
            .block_on(reqwest::Client::new().get("http://127.0.0.1:1").send())
            .unwrap_err();
        let e = SourceError::Http {
            source: err,
            url: "x".into(),
        };
        assert!(e.is_retryable());
    }
}
