//! Configuration management for scanwatch
//!
//! Layers, lowest precedence first: defaults, TOML file, environment, CLI flags.

use crate::error::{Result, ScanwatchError};
use crate::models::PipelineConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;
use url::Url;

pub const ENV_API_URL: &str = "API_URL";
pub const ENV_USERNAME: &str = "USERNAME";
pub const ENV_PASSWORD: &str = "PASSWORD";
pub const ENV_SCAN_URL: &str = "SCAN_URL";

/// File-based configuration structure
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api: Option<ApiSection>,
    scan: Option<ScanSection>,
    polling: Option<PollingSection>,
    retry: Option<RetrySection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ApiSection {
    url: Option<String>,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
    proxy: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScanSection {
    target: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PollingSection {
    interval_ms: Option<u64>,
    max_attempts: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RetrySection {
    max_retries: Option<u32>,
    backoff_ms: Option<u64>,
}

/// Loads configuration from a TOML file and merges with defaults
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses TOML configuration text and merges with defaults
pub fn parse_config(content: &str) -> Result<PipelineConfig> {
    let file_config: FileConfig = toml::from_str(content)?;
    let mut config = PipelineConfig::default();

    if let Some(api) = file_config.api {
        if let Some(url) = api.url {
            config.api_url = url;
        }
        if let Some(timeout) = api.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(ua) = api.user_agent {
            config.user_agent = ua;
        }
        if api.proxy.is_some() {
            config.proxy = api.proxy;
        }
    }

    if let Some(target) = file_config.scan.and_then(|scan| scan.target) {
        config.target_url = target;
    }

    if let Some(polling) = file_config.polling {
        if let Some(interval) = polling.interval_ms {
            config.poll_interval_ms = interval;
        }
        if let Some(max) = polling.max_attempts {
            config.max_poll_attempts = max;
        }
        if polling.timeout_secs.is_some() {
            config.poll_timeout_secs = polling.timeout_secs;
        }
    }

    if let Some(retry) = file_config.retry {
        if let Some(max) = retry.max_retries {
            config.max_retries = max;
        }
        if let Some(backoff) = retry.backoff_ms {
            config.retry_backoff_ms = backoff;
        }
    }

    Ok(config)
}

/// Applies environment values on top of an existing config.
///
/// `lookup` is usually `std::env::var(..).ok()`; empty values are ignored.
pub fn apply_env<F>(config: &mut PipelineConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(url) = get(ENV_API_URL) {
        config.api_url = url;
    }
    if let Some(username) = get(ENV_USERNAME) {
        config.credentials.username = username;
    }
    if let Some(password) = get(ENV_PASSWORD) {
        config.credentials.password = password;
    }
    if let Some(target) = get(ENV_SCAN_URL) {
        config.target_url = target;
    }
}

/// Applies the process environment, reading a `.env` file first when one exists
pub fn apply_process_env(config: &mut PipelineConfig) {
    if let Some(problem) = dotenv_problem(&dotenv::dotenv()) {
        warn!("Ignoring .env file: {problem}");
    }
    apply_env(config, |key| std::env::var(key).ok());
}

/// Describes a `.env` load failure worth reporting; a missing file is not one
fn dotenv_problem(result: &std::result::Result<PathBuf, dotenv::Error>) -> Option<String> {
    match result {
        Ok(_) => None,
        Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => Some(e.to_string()),
    }
}

/// Merges CLI arguments into an existing PipelineConfig
#[allow(clippy::too_many_arguments)]
pub fn merge_cli_args(
    config: &mut PipelineConfig,
    api_url: Option<String>,
    target: Option<String>,
    username: Option<String>,
    timeout: Option<u64>,
    poll_interval_ms: Option<u64>,
    max_poll_attempts: Option<u32>,
    poll_timeout: Option<u64>,
) {
    if let Some(url) = api_url {
        config.api_url = url;
    }
    if let Some(t) = target {
        config.target_url = t;
    }
    if let Some(u) = username {
        config.credentials.username = u;
    }
    if let Some(t) = timeout {
        config.timeout_secs = t;
    }
    if let Some(i) = poll_interval_ms {
        config.poll_interval_ms = i;
    }
    if let Some(m) = max_poll_attempts {
        config.max_poll_attempts = m;
    }
    if poll_timeout.is_some() {
        config.poll_timeout_secs = poll_timeout;
    }
}

/// Checks that a merged config can drive a full pipeline run
pub fn validate(config: &PipelineConfig) -> Result<()> {
    validate_connection(config)?;
    require_http_url("scan target URL", ENV_SCAN_URL, &config.target_url)?;

    if config.poll_interval_ms == 0 {
        return Err(ScanwatchError::ConfigError(
            "poll interval must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Checks that a merged config is enough to authenticate against the service
pub fn validate_connection(config: &PipelineConfig) -> Result<()> {
    require_http_url("API URL", ENV_API_URL, &config.api_url)?;

    if config.credentials.username.is_empty() {
        return Err(ScanwatchError::ConfigError(format!(
            "username is required (set {ENV_USERNAME})"
        )));
    }
    if config.credentials.password.is_empty() {
        return Err(ScanwatchError::ConfigError(format!(
            "password is required (set {ENV_PASSWORD})"
        )));
    }
    if config.timeout_secs == 0 {
        return Err(ScanwatchError::ConfigError(
            "request timeout must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn require_http_url(label: &str, env_key: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ScanwatchError::ConfigError(format!(
            "{label} is required (set {env_key})"
        )));
    }
    let url = Url::parse(value)
        .map_err(|e| ScanwatchError::ConfigError(format!("invalid {label} '{value}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ScanwatchError::ConfigError(format!(
            "{label} must use http or https, got '{other}'"
        ))),
    }
}
