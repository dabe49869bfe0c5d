//! Progress Events and Result Records
//!
//! One event per completed (leaf, data size) pair. The serialized field
//! names are part of the transport contract and must stay stable: exactly
//! one of `result`/`customResult` is present depending on the leaf kind.

use cadence_stats::Summary;
use serde::{Deserialize, Serialize};

/// Summary for one measure leaf at one data size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    /// Full path of the leaf.
    pub path: Vec<String>,
    /// Display title of the leaf.
    pub title: String,
    /// Operations per second, derived by inverting the duration summary.
    pub ops_per_sec: Summary,
    /// Per-operation duration in milliseconds.
    pub duration_ms: Summary,
    /// Per-pass memory deltas in bytes; absent when memory sampling was not
    /// configured for the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_bytes: Option<Summary>,
}

/// Summary for one evaluate leaf at one data size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomResultRecord {
    /// Full path of the leaf.
    pub path: Vec<String>,
    /// Display title of the leaf.
    pub title: String,
    /// Identifier of the chart this leaf feeds.
    pub chart: String,
    /// Summary over the returned values.
    pub values: Summary,
}

/// One progress event, emitted after a (leaf, size) pair completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Full path of the leaf.
    pub path: Vec<String>,
    /// Display title of the leaf.
    pub title: String,
    /// The data size this event covers.
    pub data_size: u64,
    /// Run progress in integer percent, 0..=100.
    pub progress: u8,
    /// Present for measure leaves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultRecord>,
    /// Present for evaluate leaves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_result: Option<CustomResultRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let event = ProgressEvent {
            path: vec!["Encoding".into(), "JSON".into(), "serialize".into()],
            title: "serialize".into(),
            data_size: 100,
            progress: 50,
            result: Some(ResultRecord {
                path: vec!["Encoding".into(), "JSON".into(), "serialize".into()],
                title: "serialize".into(),
                ops_per_sec: Summary {
                    avg: 100.0,
                    min: 50.0,
                    max: 200.0,
                },
                duration_ms: Summary {
                    avg: 10.0,
                    min: 5.0,
                    max: 20.0,
                },
                memory_bytes: None,
            }),
            custom_result: None,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["dataSize"], 100);
        assert_eq!(json["progress"], 50);
        assert!(json.get("customResult").is_none());
        assert_eq!(json["result"]["opsPerSec"]["avg"], 100.0);
        // Memory is omitted, not null, when unsampled.
        assert!(json["result"].get("memoryBytes").is_none());
    }
}
