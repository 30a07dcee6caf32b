//! Scan lifecycle pipeline: authenticate, launch, wait, fetch, filter

pub mod auth;
pub mod filter;
pub mod launch;
pub mod poller;
pub mod results;

pub use auth::AuthClient;
pub use filter::{filter_high_severity, summarize};
pub use launch::ScanLauncher;
pub use poller::{AbortReason, PollOutcome, ScanStatus, ScanStatusPoller};
pub use results::ResultsFetcher;

use crate::error::{Result, ScanwatchError};
use crate::http::ApiClient;
use crate::models::{PipelineConfig, PipelineReport, ScanId, ScanRequest, ScanResults, SessionToken};
use tracing::{info, info_span, Instrument};

/// Runs the stages in order against one scanning service.
///
/// Any stage failure ends the run; nothing is retried across stages.
pub struct Pipeline {
    api: ApiClient,
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline from validated configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let api = ApiClient::from_config(&config)?;
        Ok(Self { api, config })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Runs the full pipeline and returns the report of high-severity findings
    pub async fn run(&self) -> Result<PipelineReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        self.run_stages(run_id.clone())
            .instrument(info_span!("run", id = %run_id))
            .await
    }

    async fn run_stages(&self, run_id: String) -> Result<PipelineReport> {
        let token = self.authenticate().await?;

        let request = ScanRequest::new(&self.config.target_url);
        let scan_id = ScanLauncher::new(&self.api)
            .launch_scan(&token, &request)
            .await?;

        let mut report = PipelineReport::new(&self.config.target_url, scan_id.clone());
        report.run_id = run_id;

        let outcome = ScanStatusPoller::from_config(&self.api, &self.config)
            .await_completion(&token, &scan_id)
            .await;
        report.status_queries = outcome.queries();
        if let PollOutcome::Aborted { reason, .. } = outcome {
            return Err(ScanwatchError::PollingAborted(reason));
        }

        let results = ResultsFetcher::new(&self.api)
            .fetch_results(&token, &scan_id)
            .await?;

        self.fill_report(&mut report, &results);
        info!(
            "Scan {scan_id} finished: {} of {} vulnerabilities are high severity",
            report.findings.len(),
            report.total_vulnerabilities
        );
        Ok(report)
    }

    /// Authenticates with the configured credentials
    pub async fn authenticate(&self) -> Result<SessionToken> {
        AuthClient::new(&self.api)
            .authenticate(&self.config.credentials)
            .await
    }

    /// Authenticates and reads the status of an existing scan once
    pub async fn status(&self, scan_id: &ScanId) -> Result<ScanStatus> {
        let token = self.authenticate().await?;
        Ok(ScanStatusPoller::from_config(&self.api, &self.config)
            .check_status(&token, scan_id)
            .await)
    }

    /// Authenticates, fetches and filters the results of an already finished scan
    pub async fn results(&self, scan_id: &ScanId) -> Result<PipelineReport> {
        let token = self.authenticate().await?;
        let results = ResultsFetcher::new(&self.api)
            .fetch_results(&token, scan_id)
            .await?;

        let mut report = PipelineReport::new(&self.config.target_url, scan_id.clone());
        self.fill_report(&mut report, &results);
        Ok(report)
    }

    fn fill_report(&self, report: &mut PipelineReport, results: &ScanResults) {
        report.total_vulnerabilities = results.vulnerabilities.len();
        report.summary = summarize(results);
        report.findings = filter_high_severity(results);
        report.total_requests = self.api.request_count();
        report.finish();
    }
}
