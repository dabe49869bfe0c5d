//! CSV Output
//!
//! One row per report entry. Measure and evaluate entries share one column
//! set; columns that do not apply to an entry's kind stay empty.

use crate::report::{EntryMetrics, RunReport};

const HEADER: [&str; 16] = [
    "path",
    "title",
    "data_size",
    "kind",
    "ops_avg",
    "ops_min",
    "ops_max",
    "duration_avg_ms",
    "duration_min_ms",
    "duration_max_ms",
    "memory_avg_bytes",
    "memory_min_bytes",
    "memory_max_bytes",
    "value_avg",
    "value_min",
    "value_max",
];

/// Generate a CSV report. Returns an empty string if serialization fails,
/// which cannot happen for in-memory writes.
pub fn generate_csv_report(report: &RunReport) -> String {
    write_csv(report).unwrap_or_default()
}

fn write_csv(report: &RunReport) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    let mut writer = csv::Writer::from_writer(&mut buf);
    writer.write_record(HEADER)?;

    for entry in &report.entries {
        let mut row: Vec<String> = vec![
            entry.path.clone(),
            entry.title.clone(),
            entry.data_size.to_string(),
        ];
        match &entry.metrics {
            EntryMetrics::Measure {
                ops_per_sec,
                duration_ms,
                memory_bytes,
            } => {
                row.push("measure".to_string());
                for v in [ops_per_sec.avg, ops_per_sec.min, ops_per_sec.max] {
                    row.push(format!("{:.6}", v));
                }
                for v in [duration_ms.avg, duration_ms.min, duration_ms.max] {
                    row.push(format!("{:.6}", v));
                }
                match memory_bytes {
                    Some(memory) => {
                        for v in [memory.avg, memory.min, memory.max] {
                            row.push(format!("{:.0}", v));
                        }
                    }
                    None => row.extend(std::iter::repeat(String::new()).take(3)),
                }
                row.extend(std::iter::repeat(String::new()).take(3));
            }
            EntryMetrics::Evaluate { values, .. } => {
                row.push("evaluate".to_string());
                row.extend(std::iter::repeat(String::new()).take(9));
                for v in [values.avg, values.min, values.max] {
                    row.push(format!("{:.6}", v));
                }
            }
        }
        writer.write_record(&row)?;
    }

    writer.flush().map_err(csv::Error::from)?;
    drop(writer);
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
