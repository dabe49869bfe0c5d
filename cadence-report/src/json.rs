//! JSON Output

use crate::report::RunReport;

/// Version of the JSON report schema.
pub const SCHEMA_VERSION: u32 = 1;

/// Generate a prettified JSON report.
pub fn generate_json_report(report: &RunReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportConfig, ReportMeta, ReportSummary, SystemInfo};
    use chrono::Utc;

    #[test]
    fn test_json_round_trips() {
        let report = RunReport {
            meta: ReportMeta {
                schema_version: SCHEMA_VERSION,
                version: "0.0.0".to_string(),
                timestamp: Utc::now(),
                system: SystemInfo {
                    os: "linux".to_string(),
                    cpu_cores: 4,
                },
                config: ReportConfig {
                    data_unit_sizes: vec![10],
                    data_units_count: 5,
                    series_size: 1,
                    series_count: 1,
                    delay: 0,
                    force_gc: false,
                    memory_measurements_count: None,
                },
            },
            entries: vec![],
            summary: ReportSummary {
                status: "completed".to_string(),
                failure: None,
                results_emitted: 0,
                progress: 100,
            },
        };

        let json = generate_json_report(&report).unwrap();
        assert!(json.contains("\"schema_version\": 1"));
        assert!(json.contains("\"forceGC\": false"));
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.summary.status, "completed");
    }
}
