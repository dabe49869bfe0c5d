#![warn(missing_docs)]
//! Cadence Report - Run Reporting
//!
//! Builds a serializable report from the engine's event stream and renders
//! it in several formats:
//! - JSON (machine-readable, versioned schema)
//! - CSV (spreadsheet-compatible)
//! - Human-readable terminal output

mod csv_out;
mod human;
mod json;
mod report;

pub use csv_out::generate_csv_report;
pub use human::{format_duration_ms, format_human_output, format_ops};
pub use json::{SCHEMA_VERSION, generate_json_report};
pub use report::{
    EntryMetrics, ReportConfig, ReportEntry, ReportMeta, ReportSummary, RunReport, SystemInfo,
    build_report,
};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON with full schema
    Json,
    /// CSV for spreadsheets
    Csv,
    /// Human-readable terminal output
    Human,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
