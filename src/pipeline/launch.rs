//! Submits a target URL to the scanning service

use crate::error::{Result, ScanwatchError};
use crate::http::{decode_json, expect_success, ApiClient, RemoteFailure};
use crate::models::{ScanId, ScanRequest, SessionToken};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

#[derive(Debug, Deserialize)]
struct LaunchResponse {
    #[serde(default, rename = "scanId")]
    scan_id: Option<Value>,
}

/// Client for the service's `/scan` endpoint
pub struct ScanLauncher<'a> {
    api: &'a ApiClient,
}

impl<'a> ScanLauncher<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Launches a scan and returns its identifier.
    ///
    /// Every call creates a new scan job on the service.
    pub async fn launch_scan(&self, token: &SessionToken, request: &ScanRequest) -> Result<ScanId> {
        info!("Launching scan for {}", request.url);
        let scan_id = self.submit(token, request).await.map_err(|failure| {
            failure.log("Scan launch");
            ScanwatchError::ScanLaunchFailed(failure)
        })?;
        info!("Scan launched with ID {scan_id}");
        Ok(scan_id)
    }

    async fn submit(
        &self,
        token: &SessionToken,
        request: &ScanRequest,
    ) -> std::result::Result<ScanId, RemoteFailure> {
        let response = self.api.post_json_once(&["scan"], request, Some(token)).await?;
        let body: LaunchResponse = decode_json(expect_success(response).await?).await?;
        parse_scan_id(body.scan_id)
    }
}

/// Accepts a non-empty string or a number as the scan identifier
fn parse_scan_id(value: Option<Value>) -> std::result::Result<ScanId, RemoteFailure> {
    match value {
        Some(Value::String(id)) if !id.is_empty() => Ok(ScanId::new(id)),
        Some(Value::Number(id)) => Ok(ScanId::new(id.to_string())),
        Some(other) => Err(RemoteFailure::MalformedResponse(format!(
            "unusable scanId: {other}"
        ))),
        None => Err(RemoteFailure::MalformedResponse(
            "response did not contain a scanId".to_string(),
        )),
    }
}
