//! Waits for a scan to reach a terminal state
//!
//! Each cycle sleeps for the configured interval and then reads the scan's results
//! endpoint: 200 means complete, 202 means still running, anything else (including
//! no response at all) ends the wait. The loop is bounded by an attempt cap and an
//! optional wall-clock timeout.

use crate::http::{ApiClient, RemoteFailure};
use crate::models::{PipelineConfig, ScanId, SessionToken};
use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info};

/// One read of a scan's status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    /// 200: results are ready
    Complete,
    /// 202: scan still running
    InProgress,
    /// Any other HTTP status
    Unexpected(u16),
    /// No status code at all
    NoResponse(RemoteFailure),
}

impl ScanStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScanStatus::InProgress)
    }

    /// True when the scan ended without results that can be fetched
    pub fn is_failure(&self) -> bool {
        self.is_terminal() && *self != ScanStatus::Complete
    }

    fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::OK => ScanStatus::Complete,
            StatusCode::ACCEPTED => ScanStatus::InProgress,
            other => ScanStatus::Unexpected(other.as_u16()),
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStatus::Complete => write!(f, "complete"),
            ScanStatus::InProgress => write!(f, "in progress"),
            ScanStatus::Unexpected(status) => write!(f, "unexpected status {status}"),
            ScanStatus::NoResponse(failure) => write!(f, "{failure}"),
        }
    }
}

/// Why polling stopped without the scan completing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbortReason {
    #[error("no status code received ({0})")]
    NoResponse(RemoteFailure),

    #[error("unexpected status code {0}")]
    UnexpectedStatus(u16),

    #[error("scan still in progress after {0} status queries")]
    AttemptsExhausted(u32),

    #[error("scan still in progress after {0:?}")]
    TimedOut(Duration),
}

/// Result of waiting for a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed { queries: u32 },
    Aborted { queries: u32, reason: AbortReason },
}

impl PollOutcome {
    /// True when the scan reached a state whose results can be fetched
    pub fn is_complete(&self) -> bool {
        matches!(self, PollOutcome::Completed { .. })
    }

    /// Number of status queries issued
    pub fn queries(&self) -> u32 {
        match self {
            PollOutcome::Completed { queries } | PollOutcome::Aborted { queries, .. } => *queries,
        }
    }
}

/// Polls a scan's status until it completes, fails, or a limit is hit
pub struct ScanStatusPoller<'a> {
    api: &'a ApiClient,
    interval: Duration,
    max_attempts: Option<u32>,
    timeout: Option<Duration>,
}

impl<'a> ScanStatusPoller<'a> {
    pub fn new(api: &'a ApiClient, interval: Duration) -> Self {
        Self {
            api,
            interval,
            max_attempts: None,
            timeout: None,
        }
    }

    /// Creates a poller with the interval and limits from configuration
    pub fn from_config(api: &'a ApiClient, config: &PipelineConfig) -> Self {
        Self::new(api, config.poll_interval())
            .with_max_attempts(config.poll_attempt_limit())
            .with_timeout(config.poll_timeout())
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads the scan's status once
    pub async fn check_status(&self, token: &SessionToken, scan_id: &ScanId) -> ScanStatus {
        let segments = ["scans", scan_id.as_str(), "results"];
        match self.api.get(&segments, token).await {
            Ok(response) => ScanStatus::from_status(response.status()),
            // retries exhausted on a rate limit still leave us with a status code
            Err(RemoteFailure::Status { status, .. }) => ScanStatus::Unexpected(status),
            Err(failure) => ScanStatus::NoResponse(failure),
        }
    }

    /// Waits until the scan completes or polling has to stop
    pub async fn await_completion(&self, token: &SessionToken, scan_id: &ScanId) -> PollOutcome {
        info!("Waiting for scan {scan_id} to complete");
        let mut queries = 0;

        let result = match self.timeout {
            Some(limit) => timeout(limit, self.poll(token, scan_id, &mut queries))
                .await
                .unwrap_or(Err(AbortReason::TimedOut(limit))),
            None => self.poll(token, scan_id, &mut queries).await,
        };

        match result {
            Ok(()) => {
                info!("Scan {scan_id} completed after {queries} status queries");
                PollOutcome::Completed { queries }
            }
            Err(reason) => {
                error!("Polling scan {scan_id} aborted: {reason}");
                PollOutcome::Aborted { queries, reason }
            }
        }
    }

    async fn poll(
        &self,
        token: &SessionToken,
        scan_id: &ScanId,
        queries: &mut u32,
    ) -> Result<(), AbortReason> {
        loop {
            if let Some(max) = self.max_attempts {
                if *queries >= max {
                    return Err(AbortReason::AttemptsExhausted(*queries));
                }
            }

            sleep(self.interval).await;
            *queries += 1;

            let status = self.check_status(token, scan_id).await;
            debug!("Scan {scan_id} status query {}: {status}", *queries);

            match status {
                ScanStatus::Complete => return Ok(()),
                ScanStatus::InProgress => continue,
                ScanStatus::Unexpected(code) => return Err(AbortReason::UnexpectedStatus(code)),
                ScanStatus::NoResponse(failure) => return Err(AbortReason::NoResponse(failure)),
            }
        }
    }
}
