//! Table report output

use crate::models::PipelineReport;
use colored::Colorize;
use tabled::builder::Builder;
use tabled::settings::Style;

/// Renders the severity summary followed by the high-severity findings
pub fn render(report: &PipelineReport) -> String {
    let summary = &report.summary;
    let mut builder = Builder::default();
    builder.push_record(["Severity", "Count"]);
    for (label, count) in [
        ("Critical", summary.critical),
        ("High", summary.high),
        ("Medium", summary.medium),
        ("Low", summary.low),
        ("Info", summary.info),
        ("Other", summary.other),
    ] {
        builder.push_record([label.to_string(), count.to_string()]);
    }
    builder.push_record(["Total".to_string(), report.total_vulnerabilities.to_string()]);

    let mut counts = builder.build();
    counts.with(Style::rounded());

    let mut out = format!(
        "\n  {} {}\n  {} {}\n{counts}\n",
        "Target:".bold(),
        report.target.green(),
        "Scan:".bold(),
        report.scan_id.to_string().cyan()
    );

    if report.findings.is_empty() {
        out.push_str(&format!("\n  {}\n", "No high-severity findings.".green()));
        return out;
    }

    let mut builder = Builder::default();
    builder.push_record(["Title", "Description", "URL"]);
    for finding in &report.findings {
        builder.push_record([
            finding.title.clone(),
            finding.description.clone(),
            finding.url.clone(),
        ]);
    }
    let mut findings = builder.build();
    findings.with(Style::rounded());

    out.push_str(&format!(
        "\n  {}\n{findings}\n",
        format!("{} High severity findings", report.findings.len())
            .bright_red()
            .bold()
    ));
    out
}
