//! Report Data Structures

use cadence_core::ResolvedConfig;
use cadence_engine::{ProgressEvent, RunStatus, RunSummary};
use cadence_stats::Summary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Complete report of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Metadata: versions, timestamp, system, configuration.
    pub meta: ReportMeta,
    /// One entry per emitted (leaf, size) result, in traversal order.
    pub entries: Vec<ReportEntry>,
    /// Terminal run summary.
    pub summary: ReportSummary,
}

/// Report metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Report schema version.
    pub schema_version: u32,
    /// Harness version that produced the report.
    pub version: String,
    /// When the report was built.
    pub timestamp: DateTime<Utc>,
    /// Host description.
    pub system: SystemInfo,
    /// Resolved configuration the run executed with.
    pub config: ReportConfig,
}

/// Host description captured in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system family.
    pub os: String,
    /// Logical CPU count.
    pub cpu_cores: u32,
}

/// Snapshot of the resolved run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    /// Candidate data sizes, in execution order.
    pub data_unit_sizes: Vec<u64>,
    /// Synthetic data units generated per size.
    pub data_units_count: u32,
    /// Target invocations per series.
    pub series_size: u32,
    /// Timed series per leaf per size.
    pub series_count: u32,
    /// Settle delay between series, in milliseconds.
    pub delay: u64,
    /// Whether a GC hint preceded each series.
    #[serde(rename = "forceGC")]
    pub force_gc: bool,
    /// Memory passes per leaf per size, when memory was measured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_measurements_count: Option<u32>,
}

impl From<&ResolvedConfig> for ReportConfig {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            data_unit_sizes: config.data_unit_sizes.clone(),
            data_units_count: config.data_units_count,
            series_size: config.series_size,
            series_count: config.series_count,
            delay: config.delay.as_millis() as u64,
            force_gc: config.force_gc,
            memory_measurements_count: config.memory_measurements_count,
        }
    }
}

/// One (leaf, data size) result in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    /// Slash-joined leaf path.
    pub path: String,
    /// Display title of the leaf.
    pub title: String,
    /// The data size this entry covers.
    pub data_size: u64,
    /// Kind-specific metrics.
    pub metrics: EntryMetrics,
}

/// Metrics of one report entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EntryMetrics {
    /// Timed unit.
    #[serde(rename_all = "camelCase")]
    Measure {
        /// Operations per second.
        ops_per_sec: Summary,
        /// Per-operation duration in milliseconds.
        duration_ms: Summary,
        /// Memory deltas in bytes, when sampled.
        #[serde(skip_serializing_if = "Option::is_none")]
        memory_bytes: Option<Summary>,
    },
    /// Numeric-evaluation unit.
    #[serde(rename_all = "camelCase")]
    Evaluate {
        /// Chart identifier the values feed.
        chart: String,
        /// Summary over the returned values.
        values: Summary,
    },
}

/// Terminal summary captured in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// `completed`, `stopped` or `failed`.
    pub status: String,
    /// Failure description for failed runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Progress events emitted.
    pub results_emitted: u64,
    /// Final progress percentage.
    pub progress: u8,
}

/// Assemble a report from the recorded event stream of one run.
pub fn build_report(
    events: &[ProgressEvent],
    summary: &RunSummary,
    config: &ResolvedConfig,
) -> RunReport {
    let entries = events.iter().filter_map(entry_from_event).collect();

    let status = match summary.status {
        RunStatus::Completed => "completed",
        RunStatus::Stopped => "stopped",
        RunStatus::Failed => "failed",
    };

    RunReport {
        meta: ReportMeta {
            schema_version: crate::SCHEMA_VERSION,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            system: SystemInfo {
                os: std::env::consts::OS.to_string(),
                cpu_cores: std::thread::available_parallelism()
                    .map(|p| p.get() as u32)
                    .unwrap_or(1),
            },
            config: ReportConfig::from(config),
        },
        entries,
        summary: ReportSummary {
            status: status.to_string(),
            failure: summary.error.as_ref().map(|e| e.to_string()),
            results_emitted: summary.results_emitted,
            progress: summary.progress,
        },
    }
}

fn entry_from_event(event: &ProgressEvent) -> Option<ReportEntry> {
    let metrics = if let Some(result) = &event.result {
        EntryMetrics::Measure {
            ops_per_sec: result.ops_per_sec,
            duration_ms: result.duration_ms,
            memory_bytes: result.memory_bytes,
        }
    } else if let Some(custom) = &event.custom_result {
        EntryMetrics::Evaluate {
            chart: custom.chart.clone(),
            values: custom.values,
        }
    } else {
        return None;
    };

    Some(ReportEntry {
        path: event.path.join("/"),
        title: event.title.clone(),
        data_size: event.data_size,
        metrics,
    })
}
