//! Retrieves the results payload of a completed scan

use crate::error::{Result, ScanwatchError};
use crate::http::{decode_json, expect_success, ApiClient, RemoteFailure};
use crate::models::{ScanId, ScanResults, SessionToken};
use tracing::info;

/// Client for the service's `/scans/{id}/results` endpoint
pub struct ResultsFetcher<'a> {
    api: &'a ApiClient,
}

impl<'a> ResultsFetcher<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Fetches the full results of a scan
    pub async fn fetch_results(&self, token: &SessionToken, scan_id: &ScanId) -> Result<ScanResults> {
        let results = self.fetch(token, scan_id).await.map_err(|failure| {
            failure.log("Retrieving scan results");
            ScanwatchError::ResultsFetchFailed(failure)
        })?;
        info!(
            "Retrieved {} vulnerabilities for scan {scan_id}",
            results.vulnerabilities.len()
        );
        Ok(results)
    }

    async fn fetch(
        &self,
        token: &SessionToken,
        scan_id: &ScanId,
    ) -> std::result::Result<ScanResults, RemoteFailure> {
        let segments = ["scans", scan_id.as_str(), "results"];
        let response = self.api.get(&segments, token).await?;
        decode_json(expect_success(response).await?).await
    }
}
