//! HTTP client wrapper for the scanning service API with transient-failure retries

use crate::error::{Result, ScanwatchError};
use crate::http::classify::{classify, RemoteFailure};
use crate::models::{PipelineConfig, SessionToken};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

/// Client bound to one scanning service base URL
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    request_count: Arc<AtomicU64>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl ApiClient {
    /// Creates a new ApiClient from pipeline configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ScanwatchError::ConfigError(format!(
                "API URL cannot be used as a base: {}",
                config.api_url
            )));
        }

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent);

        if let Some(ref proxy_url) = config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| ScanwatchError::ConfigError(format!("Invalid proxy URL: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            base_url,
            request_count: Arc::new(AtomicU64::new(0)),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// Resolves path segments against the base URL, encoding each segment
    pub fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, RemoteFailure> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                RemoteFailure::MalformedRequest(format!("{} cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// POSTs a JSON body, optionally with a bearer token, and returns any response
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
        token: Option<&SessionToken>,
    ) -> std::result::Result<Response, RemoteFailure> {
        let url = self.endpoint(segments)?;
        self.request_with_retry(
            || self.build_post(url.clone(), body, token),
            RemoteFailure::is_transient,
        )
        .await
    }

    /// POSTs a JSON body that creates something on the server.
    ///
    /// Only rate-limit rejections are retried: a request that got no response may
    /// still have been applied.
    pub async fn post_json_once<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
        token: Option<&SessionToken>,
    ) -> std::result::Result<Response, RemoteFailure> {
        let url = self.endpoint(segments)?;
        self.request_with_retry(
            || self.build_post(url.clone(), body, token),
            RemoteFailure::is_rate_limited,
        )
        .await
    }

    fn build_post<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
        token: Option<&SessionToken>,
    ) -> reqwest::RequestBuilder {
        let req = self.client.post(url).json(body);
        match token {
            Some(token) => req.bearer_auth(token.as_str()),
            None => req,
        }
    }

    /// GETs an endpoint with a bearer token and returns any response
    pub async fn get(
        &self,
        segments: &[&str],
        token: &SessionToken,
    ) -> std::result::Result<Response, RemoteFailure> {
        let url = self.endpoint(segments)?;
        self.request_with_retry(
            || self.client.get(url.clone()).bearer_auth(token.as_str()),
            RemoteFailure::is_transient,
        )
        .await
    }

    /// Returns the total number of requests made
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Executes a request, retrying failures accepted by `retryable` with exponential backoff.
    ///
    /// Any other response is returned as-is, whatever its status; callers decide
    /// which statuses they accept.
    async fn request_with_retry<F>(
        &self,
        build_request: F,
        retryable: fn(&RemoteFailure) -> bool,
    ) -> std::result::Result<Response, RemoteFailure>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                let backoff = backoff_delay(self.retry_backoff, attempt);
                debug!("Retry attempt {attempt}, waiting {backoff:?}");
                sleep(backoff).await;
            }

            self.request_count.fetch_add(1, Ordering::Relaxed);

            let failure = match build_request().send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!("Response: {status} for {}", response.url());

                    if status != StatusCode::TOO_MANY_REQUESTS {
                        return Ok(response);
                    }
                    let failure = RemoteFailure::status(status, "");
                    if !retryable(&failure) {
                        return Ok(response);
                    }
                    warn!("Rate limited by server, backing off");
                    failure
                }
                Err(e) => {
                    let failure = classify(&e);
                    if !retryable(&failure) {
                        return Err(failure);
                    }
                    warn!("Request failed (attempt {attempt}): {e}");
                    failure
                }
            };

            if attempt >= self.max_retries {
                return Err(failure);
            }
            attempt += 1;
        }
    }
}

/// Delay before retry `attempt` (1-based): `base` doubled per earlier retry, saturating
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.checked_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
        .unwrap_or(Duration::MAX)
}

/// Turns a non-2xx response into a status failure
pub async fn expect_success(response: Response) -> std::result::Result<Response, RemoteFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteFailure::status(status, &body))
}

/// Decodes a JSON response body
pub async fn decode_json<T: DeserializeOwned>(
    response: Response,
) -> std::result::Result<T, RemoteFailure> {
    response.json::<T>().await.map_err(|e| classify(&e))
}
