//! Console output of pipeline reports

pub mod json;
pub mod table;

use std::str::FromStr;

/// How the final report is written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// The high-severity findings as a JSON array
    #[default]
    Json,
    /// Severity summary and findings as tables
    Table,
    /// The full run report as JSON, metadata included
    Report,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            "report" => Ok(OutputFormat::Report),
            other => Err(format!(
                "unknown output format '{other}' (use json, table or report)"
            )),
        }
    }
}
