//! Integration tests for result retrieval and high-severity filtering

mod common;

use common::{bearer, test_config, token};
use scanwatch::error::ScanwatchError;
use scanwatch::http::{ApiClient, RemoteFailure};
use scanwatch::models::{HighSeverityFinding, ScanId, Severity};
use scanwatch::pipeline::{filter_high_severity, ResultsFetcher};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESULTS_PATH: &str = "/scans/scan-123/results";

fn scan_id() -> ScanId {
    ScanId::new("scan-123")
}

fn vuln(n: u32, severity: &str) -> serde_json::Value {
    json!({
        "title": format!("Finding {n}"),
        "description": format!("Description {n}"),
        "url": format!("https://target.example.com/page/{n}"),
        "severity": severity,
    })
}

#[tokio::test]
async fn test_fetch_and_filter_high_severity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(RESULTS_PATH))
        .and(header("Authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vulnerabilities": [
                vuln(1, "High"),
                vuln(2, "Low"),
                vuln(3, "High"),
                vuln(4, "Medium"),
                vuln(5, "High"),
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let api = ApiClient::from_config(&config).expect("client");

    let results = ResultsFetcher::new(&api)
        .fetch_results(&token(), &scan_id())
        .await
        .expect("fetch should succeed");

    assert_eq!(results.vulnerabilities.len(), 5);
    assert_eq!(results.vulnerabilities[3].severity, Severity::Medium);

    let findings = filter_high_severity(&results);
    let expected: Vec<HighSeverityFinding> = [1, 3, 5]
        .iter()
        .map(|n| HighSeverityFinding {
            title: format!("Finding {n}"),
            description: format!("Description {n}"),
            url: format!("https://target.example.com/page/{n}"),
        })
        .collect();
    assert_eq!(findings, expected);
}

#[tokio::test]
async fn test_fetch_tolerates_extra_and_missing_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(RESULTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "scanId": "scan-123",
            "vulnerabilities": [
                {"title": "No severity"},
                {"title": "Lowercase", "severity": "high", "cwe": "CWE-79"},
            ]
        })))
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let api = ApiClient::from_config(&config).expect("client");

    let results = ResultsFetcher::new(&api)
        .fetch_results(&token(), &scan_id())
        .await
        .expect("fetch should succeed");

    assert_eq!(results.vulnerabilities.len(), 2);
    assert!(filter_high_severity(&results).is_empty());
}

#[tokio::test]
async fn test_fetch_tolerates_null_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(RESULTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vulnerabilities": [
                vuln(1, "High"),
                {"title": "Banner", "description": null, "url": "u2", "severity": null},
                {"title": null, "description": "d3", "url": null, "severity": "Low"},
            ]
        })))
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let api = ApiClient::from_config(&config).expect("client");

    let results = ResultsFetcher::new(&api)
        .fetch_results(&token(), &scan_id())
        .await
        .expect("null fields must not fail the fetch");

    assert_eq!(results.vulnerabilities.len(), 3);
    assert_eq!(results.vulnerabilities[2].severity, Severity::Low);

    let findings = filter_high_severity(&results);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].title, "Finding 1");
}

#[tokio::test]
async fn test_fetch_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(RESULTS_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("scan not found"))
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let api = ApiClient::from_config(&config).expect("client");

    let err = ResultsFetcher::new(&api)
        .fetch_results(&token(), &scan_id())
        .await
        .expect_err("404 must fail");

    match err {
        ScanwatchError::ResultsFetchFailed(failure) => assert_eq!(failure.status_code(), Some(404)),
        other => panic!("expected ResultsFetchFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(RESULTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let api = ApiClient::from_config(&config).expect("client");

    let err = ResultsFetcher::new(&api)
        .fetch_results(&token(), &scan_id())
        .await
        .expect_err("non-json body must fail");

    assert!(matches!(
        err,
        ScanwatchError::ResultsFetchFailed(RemoteFailure::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn test_fetch_missing_vulnerabilities() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(RESULTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "done"})))
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri());
    let api = ApiClient::from_config(&config).expect("client");

    let result = ResultsFetcher::new(&api)
        .fetch_results(&token(), &scan_id())
        .await;

    assert!(matches!(
        result,
        Err(ScanwatchError::ResultsFetchFailed(RemoteFailure::MalformedResponse(_)))
    ));
}
