//! Output Formatting
//!
//! Human-readable terminal rendering: entries grouped by parent path with
//! throughput, per-operation duration and optional memory lines.

use crate::report::{EntryMetrics, RunReport};

/// Format a report for terminal display.
pub fn format_human_output(report: &RunReport) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("Cadence Results\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    let mut current_parent: Option<String> = None;
    for entry in &report.entries {
        let parent = entry
            .path
            .rsplit_once('/')
            .map(|(head, _)| head.to_string())
            .unwrap_or_else(|| entry.path.clone());
        if current_parent.as_deref() != Some(parent.as_str()) {
            output.push_str(&format!("Group: {}\n", parent));
            output.push_str(&"-".repeat(60));
            output.push('\n');
            current_parent = Some(parent);
        }

        output.push_str(&format!("  {} (size {})\n", entry.title, entry.data_size));
        match &entry.metrics {
            EntryMetrics::Measure {
                ops_per_sec,
                duration_ms,
                memory_bytes,
            } => {
                output.push_str(&format!(
                    "      ops/sec: avg {}  min {}  max {}\n",
                    format_ops(ops_per_sec.avg),
                    format_ops(ops_per_sec.min),
                    format_ops(ops_per_sec.max),
                ));
                output.push_str(&format!(
                    "      per op:  avg {}  min {}  max {}\n",
                    format_duration_ms(duration_ms.avg),
                    format_duration_ms(duration_ms.min),
                    format_duration_ms(duration_ms.max),
                ));
                if let Some(memory) = memory_bytes {
                    output.push_str(&format!(
                        "      memory:  avg {}  min {}  max {}\n",
                        format_bytes(memory.avg),
                        format_bytes(memory.min),
                        format_bytes(memory.max),
                    ));
                }
            }
            EntryMetrics::Evaluate { chart, values } => {
                output.push_str(&format!(
                    "      values ({}): avg {:.3}  min {:.3}  max {:.3}\n",
                    chart, values.avg, values.min, values.max
                ));
            }
        }
        output.push('\n');
    }

    output.push_str("Summary\n");
    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "  status: {}  results: {}  progress: {}%\n",
        report.summary.status, report.summary.results_emitted, report.summary.progress
    ));
    if let Some(failure) = &report.summary.failure {
        output.push_str(&format!("  failure: {}\n", failure));
    }

    output
}

/// Format a millisecond duration with an adaptive unit.
pub fn format_duration_ms(ms: f64) -> String {
    if ms < 0.001 {
        format!("{:.0} ns", ms * 1_000_000.0)
    } else if ms < 1.0 {
        format!("{:.2} µs", ms * 1_000.0)
    } else if ms < 1_000.0 {
        format!("{:.2} ms", ms)
    } else {
        format!("{:.2} s", ms / 1_000.0)
    }
}

/// Format an ops/sec figure with an adaptive magnitude suffix.
pub fn format_ops(ops: f64) -> String {
    if ops >= 1_000_000.0 {
        format!("{:.2}M", ops / 1_000_000.0)
    } else if ops >= 1_000.0 {
        format!("{:.2}K", ops / 1_000.0)
    } else {
        format!("{:.2}", ops)
    }
}

fn format_bytes(bytes: f64) -> String {
    if bytes >= 1_048_576.0 {
        format!("{:.2} MiB", bytes / 1_048_576.0)
    } else if bytes >= 1_024.0 {
        format!("{:.2} KiB", bytes / 1_024.0)
    } else {
        format!("{:.0} B", bytes)
    }
}
