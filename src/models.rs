//! Core data models for scanwatch

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

/// Username and password exchanged for a session token
#[derive(Clone, Default, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bearer token issued by the scanning service
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken(<redacted>)")
    }
}

/// Identifier of one scan job on the remote service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanId(String);

impl ScanId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of a scan launch request
#[derive(Debug, Clone, Serialize)]
pub struct ScanRequest {
    pub url: String,
}

impl ScanRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Severity level reported by the scanning service.
///
/// Parsing is an exact, case-sensitive match on the service's labels; anything
/// else is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
    Other(String),
}

impl From<String> for Severity {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Critical" => Severity::Critical,
            "High" => Severity::High,
            "Medium" => Severity::Medium,
            "Low" => Severity::Low,
            "Info" => Severity::Info,
            _ => Severity::Other(raw),
        }
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "Critical"),
            Severity::High => write!(f, "High"),
            Severity::Medium => write!(f, "Medium"),
            Severity::Low => write!(f, "Low"),
            Severity::Info => write!(f, "Info"),
            Severity::Other(raw) => f.write_str(raw),
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Other(String::new())
    }
}

/// A vulnerability as returned in the scan results payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: Severity,
}

/// Reads an explicit `null` the same way as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Full results payload of a completed scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResults {
    pub vulnerabilities: Vec<Vulnerability>,
}

/// A high-severity vulnerability reduced to what the report shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighSeverityFinding {
    pub title: String,
    pub description: String,
    pub url: String,
}

/// Vulnerability counts per severity level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeveritySummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub other: usize,
}

/// Outcome of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Local identifier for this run, used to correlate log lines
    pub run_id: String,
    /// Target URL that was scanned
    pub target: String,
    /// Identifier the service assigned to the scan
    pub scan_id: ScanId,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    /// Number of status queries issued while waiting for completion
    pub status_queries: u32,
    /// Total number of vulnerabilities in the results payload
    pub total_vulnerabilities: usize,
    /// Counts per severity level across the whole payload
    pub summary: SeveritySummary,
    /// Vulnerabilities whose severity is exactly "High", in payload order
    pub findings: Vec<HighSeverityFinding>,
    /// Total HTTP requests made, retries included
    pub total_requests: u64,
}

impl PipelineReport {
    pub fn new(target: impl Into<String>, scan_id: ScanId) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            target: target.into(),
            scan_id,
            started_at: Local::now(),
            finished_at: None,
            status_queries: 0,
            total_vulnerabilities: 0,
            summary: SeveritySummary::default(),
            findings: Vec::new(),
            total_requests: 0,
        }
    }

    /// Marks the run as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }
}

/// Configuration for a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Base URL of the scanning service API
    pub api_url: String,
    /// URL the service is asked to scan
    pub target_url: String,
    /// Credentials exchanged for a session token
    #[serde(skip)]
    pub credentials: Credentials,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header value
    pub user_agent: String,
    /// HTTP/HTTPS proxy URL
    pub proxy: Option<String>,
    /// Delay before each status query in milliseconds
    pub poll_interval_ms: u64,
    /// Maximum number of status queries (0 = unbounded)
    pub max_poll_attempts: u32,
    /// Wall-clock limit for the whole wait
    pub poll_timeout_secs: Option<u64>,
    /// Extra attempts for a call that failed transiently
    pub max_retries: u32,
    /// Backoff before the first retry, doubled for each subsequent one
    pub retry_backoff_ms: u64,
}

impl PipelineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout_secs.map(Duration::from_secs)
    }

    /// Attempt cap as an option, `None` when polling is unbounded
    pub fn poll_attempt_limit(&self) -> Option<u32> {
        (self.max_poll_attempts > 0).then_some(self.max_poll_attempts)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            target_url: String::new(),
            credentials: Credentials::default(),
            timeout_secs: 30,
            user_agent: "Scanwatch/0.1.0".to_string(),
            proxy: None,
            poll_interval_ms: 10_000,
            max_poll_attempts: 360,
            poll_timeout_secs: None,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}
