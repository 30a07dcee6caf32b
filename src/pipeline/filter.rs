//! Reduces a results payload to its high-severity findings

use crate::models::{HighSeverityFinding, ScanResults, Severity, SeveritySummary};

/// Keeps the vulnerabilities whose severity is exactly "High", in payload order
pub fn filter_high_severity(results: &ScanResults) -> Vec<HighSeverityFinding> {
    results
        .vulnerabilities
        .iter()
        .filter(|v| v.severity == Severity::High)
        .map(|v| HighSeverityFinding {
            title: v.title.clone(),
            description: v.description.clone(),
            url: v.url.clone(),
        })
        .collect()
}

/// Counts every vulnerability in the payload by severity level
pub fn summarize(results: &ScanResults) -> SeveritySummary {
    let mut summary = SeveritySummary::default();
    for vuln in &results.vulnerabilities {
        match vuln.severity {
            Severity::Critical => summary.critical += 1,
            Severity::High => summary.high += 1,
            Severity::Medium => summary.medium += 1,
            Severity::Low => summary.low += 1,
            Severity::Info => summary.info += 1,
            Severity::Other(_) => summary.other += 1,
        }
    }
    summary
}
