//! Classification of failed remote calls
//!
//! Every stage reports failures through the same `RemoteFailure` value so the
//! server-error / no-response / malformed-request distinction is made in one place.

use reqwest::StatusCode;
use std::fmt;
use tracing::error;

/// Longest response body excerpt kept for diagnostics
const BODY_EXCERPT_LEN: usize = 200;

/// Why a call to the scanning service did not produce a usable response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFailure {
    /// The server answered with a non-success status
    Status { status: u16, body: String },
    /// No response was received (connection refused, reset, timeout)
    NoResponse(String),
    /// The request could not be built
    MalformedRequest(String),
    /// A success response whose body did not have the expected shape
    MalformedResponse(String),
}

impl RemoteFailure {
    /// Builds a status failure, keeping a short excerpt of the body
    pub fn status(status: StatusCode, body: &str) -> Self {
        let body: String = body.trim().chars().take(BODY_EXCERPT_LEN).collect();
        RemoteFailure::Status {
            status: status.as_u16(),
            body,
        }
    }

    /// HTTP status, if the server responded at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RemoteFailure::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Failures worth another attempt: nothing came back, or the server asked us to slow down
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteFailure::NoResponse(_)) || self.is_rate_limited()
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(StatusCode::TOO_MANY_REQUESTS.as_u16())
    }

    /// Logs the failure for a pipeline stage with whatever detail is available
    pub fn log(&self, stage: &str) {
        match self {
            RemoteFailure::Status { status, body } if body.is_empty() => {
                error!("{stage} failed with status code: {status}");
            }
            RemoteFailure::Status { status, body } => {
                error!("{stage} failed with status code: {status} ({body})");
            }
            RemoteFailure::NoResponse(detail) => {
                error!("{stage} failed: No response from server ({detail})");
            }
            RemoteFailure::MalformedRequest(detail) => {
                error!("{stage} failed: Malformed request ({detail})");
            }
            RemoteFailure::MalformedResponse(detail) => {
                error!("{stage} failed: Malformed response ({detail})");
            }
        }
    }
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteFailure::Status { status, .. } => write!(f, "server responded with status {status}"),
            RemoteFailure::NoResponse(detail) => write!(f, "no response from server: {detail}"),
            RemoteFailure::MalformedRequest(detail) => write!(f, "malformed request: {detail}"),
            RemoteFailure::MalformedResponse(detail) => write!(f, "malformed response: {detail}"),
        }
    }
}

/// Classifies a transport-level error from reqwest
pub fn classify(err: &reqwest::Error) -> RemoteFailure {
    if let Some(status) = err.status() {
        return RemoteFailure::status(status, "");
    }
    if err.is_builder() {
        return RemoteFailure::MalformedRequest(err.to_string());
    }
    if err.is_decode() {
        return RemoteFailure::MalformedResponse(err.to_string());
    }
    // connect, timeout, request and body errors all mean we never got a usable answer
    RemoteFailure::NoResponse(err.to_string())
}
