//! Error types for scanwatch

use crate::http::RemoteFailure;
use crate::pipeline::AbortReason;
use thiserror::Error;

/// Main error type for scanwatch operations
#[derive(Debug, Error)]
pub enum ScanwatchError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(RemoteFailure),

    #[error("Scan launch failed: {0}")]
    ScanLaunchFailed(RemoteFailure),

    #[error("Polling aborted: {0}")]
    PollingAborted(AbortReason),

    #[error("Retrieving scan results failed: {0}")]
    ResultsFetchFailed(RemoteFailure),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ScanwatchError {
    /// Returns true for the four stage failures that halt a pipeline run
    pub fn is_pipeline_halt(&self) -> bool {
        matches!(
            self,
            ScanwatchError::AuthenticationFailed(_)
                | ScanwatchError::ScanLaunchFailed(_)
                | ScanwatchError::PollingAborted(_)
                | ScanwatchError::ResultsFetchFailed(_)
        )
    }
}

/// Result type alias for scanwatch operations
pub type Result<T> = std::result::Result<T, ScanwatchError>;
