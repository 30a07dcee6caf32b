//! Common test utilities
#![allow(dead_code)]

use scanwatch::models::{Credentials, PipelineConfig, SessionToken};
use std::net::TcpListener;

pub const USERNAME: &str = "scanner";
pub const PASSWORD: &str = "s3cret";
pub const TOKEN: &str = "tok-abc123";
pub const TARGET: &str = "https://target.example.com";

/// Creates a test PipelineConfig pointing to a wiremock server
pub fn test_config(api_url: &str) -> PipelineConfig {
    PipelineConfig {
        api_url: api_url.to_string(),
        target_url: TARGET.to_string(),
        credentials: Credentials::new(USERNAME, PASSWORD),
        timeout_secs: 5,
        user_agent: "Scanwatch-Test/0.1.0".to_string(),
        poll_interval_ms: 10,
        max_poll_attempts: 50,
        poll_timeout_secs: None,
        max_retries: 0,
        retry_backoff_ms: 10,
        ..PipelineConfig::default()
    }
}

pub fn token() -> SessionToken {
    SessionToken::new(TOKEN)
}

pub fn bearer() -> String {
    format!("Bearer {TOKEN}")
}

/// Base URL of a local port that nothing listens on
pub fn unreachable_api_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}
