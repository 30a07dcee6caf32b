//! End-to-end tests of the scan lifecycle pipeline

mod common;

use common::{bearer, test_config, PASSWORD, TARGET, TOKEN, USERNAME};
use scanwatch::error::ScanwatchError;
use scanwatch::models::{HighSeverityFinding, ScanId};
use scanwatch::pipeline::{AbortReason, Pipeline, ScanStatus};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESULTS_PATH: &str = "/scans/scan-123/results";

async fn mount_auth(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth"))
        .and(body_json(json!({"username": USERNAME, "password": PASSWORD})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": TOKEN})))
        .expect(1)
        .mount(mock_server)
        .await;
}

async fn mount_launch(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/scan"))
        .and(header("Authorization", bearer().as_str()))
        .and(body_json(json!({"url": TARGET})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"scanId": "scan-123"})))
        .expect(1)
        .mount(mock_server)
        .await;
}

fn results_body() -> serde_json::Value {
    json!({
        "vulnerabilities": [
            {
                "title": "SQL Injection",
                "description": "The id parameter is concatenated into a query",
                "url": "https://target.example.com/item?id=1",
                "severity": "High"
            },
            {
                "title": "Missing X-Content-Type-Options",
                "description": "Responses can be MIME-sniffed",
                "url": "https://target.example.com/",
                "severity": "Low"
            }
        ]
    })
}

#[tokio::test]
async fn test_end_to_end_reports_high_findings() {
    let mock_server = MockServer::start().await;
    mount_auth(&mock_server).await;
    mount_launch(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(RESULTS_PATH))
        .and(header("Authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    // answers the completing status query and the fetch
    Mock::given(method("GET"))
        .and(path(RESULTS_PATH))
        .and(header("Authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(test_config(&mock_server.uri())).expect("pipeline");
    let report = pipeline.run().await.expect("run should succeed");

    assert_eq!(report.scan_id, ScanId::new("scan-123"));
    assert_eq!(report.target, TARGET);
    assert_eq!(report.status_queries, 2);
    assert_eq!(report.total_vulnerabilities, 2);
    assert_eq!(report.summary.high, 1);
    assert_eq!(report.summary.low, 1);
    assert_eq!(
        report.findings,
        vec![HighSeverityFinding {
            title: "SQL Injection".to_string(),
            description: "The id parameter is concatenated into a query".to_string(),
            url: "https://target.example.com/item?id=1".to_string(),
        }]
    );
    assert_eq!(report.total_requests, 5);
    assert!(report.finished_at.is_some());
}

#[tokio::test]
async fn test_launch_failure_halts_before_polling() {
    let mock_server = MockServer::start().await;
    mount_auth(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/scan"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(test_config(&mock_server.uri())).expect("pipeline");
    let err = pipeline.run().await.expect_err("run must halt");

    assert!(matches!(err, ScanwatchError::ScanLaunchFailed(_)));
}

#[tokio::test]
async fn test_polling_abort_skips_fetch() {
    let mock_server = MockServer::start().await;
    mount_auth(&mock_server).await;
    mount_launch(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(RESULTS_PATH))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(RESULTS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(test_config(&mock_server.uri())).expect("pipeline");
    let err = pipeline.run().await.expect_err("run must halt");

    match err {
        ScanwatchError::PollingAborted(reason) => {
            assert_eq!(reason, AbortReason::UnexpectedStatus(500))
        }
        other => panic!("expected PollingAborted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_failure_after_completion() {
    let mock_server = MockServer::start().await;
    mount_auth(&mock_server).await;
    mount_launch(&mock_server).await;

    // completion is signalled, but the body is not a results payload
    Mock::given(method("GET"))
        .and(path(RESULTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("ready"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(test_config(&mock_server.uri())).expect("pipeline");
    let err = pipeline.run().await.expect_err("run must halt");

    assert!(matches!(err, ScanwatchError::ResultsFetchFailed(_)));
    assert!(err.is_pipeline_halt());
}

#[tokio::test]
async fn test_status_of_existing_scan() {
    let mock_server = MockServer::start().await;
    mount_auth(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(RESULTS_PATH))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(test_config(&mock_server.uri())).expect("pipeline");
    let status = pipeline
        .status(&ScanId::new("scan-123"))
        .await
        .expect("status read");

    assert_eq!(status, ScanStatus::InProgress);
    assert!(!status.is_failure());
}

#[tokio::test]
async fn test_status_of_failed_scan() {
    let mock_server = MockServer::start().await;
    mount_auth(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(RESULTS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(test_config(&mock_server.uri())).expect("pipeline");
    let status = pipeline
        .status(&ScanId::new("scan-123"))
        .await
        .expect("status read");

    assert_eq!(status, ScanStatus::Unexpected(500));
    assert!(status.is_failure());
}

#[tokio::test]
async fn test_results_of_existing_scan() {
    let mock_server = MockServer::start().await;
    mount_auth(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(RESULTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(test_config(&mock_server.uri())).expect("pipeline");
    let report = pipeline
        .results(&ScanId::new("scan-123"))
        .await
        .expect("results");

    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].title, "SQL Injection");
    assert_eq!(report.status_queries, 0);
}
