//! JSON report output

use crate::error::Result;
use crate::models::{HighSeverityFinding, PipelineReport};

/// Renders the high-severity findings as a pretty-printed JSON array
pub fn render_findings(findings: &[HighSeverityFinding]) -> Result<String> {
    Ok(serde_json::to_string_pretty(findings)?)
}

/// Renders the whole report, including run metadata and the severity summary
pub fn render_report(report: &PipelineReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
