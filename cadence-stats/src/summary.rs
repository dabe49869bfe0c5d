//! Summary Statistics
//!
//! A measurement series produces one duration sample per series. The reducer
//! divides each sample by the intra-series repetition count to get a
//! per-operation duration, summarizes those, and derives the throughput
//! summary from the duration summary rather than from per-series throughput
//! values. The min/max pairing flips in that conversion: the fastest series
//! (min duration) sets the throughput ceiling (max ops/sec).

use serde::{Deserialize, Serialize};

use crate::MS_PER_SEC;

/// `{avg, min, max}` over one sample set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Arithmetic mean of the samples.
    pub avg: f64,
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
}

/// Reduced timing metrics for one measure leaf at one data size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasureStats {
    /// Operations per second, derived from the duration summary.
    pub ops_per_sec: Summary,
    /// Per-operation duration in milliseconds.
    pub duration_ms: Summary,
}

/// Reduce a sample set to `{avg, min, max}` with no unit conversion.
///
/// Used for memory deltas and evaluate-leaf values. The slice must be
/// non-empty; an empty slice yields NaN avg and infinite min/max.
pub fn summarize(values: &[f64]) -> Summary {
    let sum: f64 = values.iter().sum();
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    Summary {
        avg: sum / values.len() as f64,
        min,
        max,
    }
}

/// Reduce per-series durations (milliseconds, one sample per series) into
/// timing metrics.
///
/// Each sample covers `series_size` invocations of the target, so samples
/// are first divided by `series_size` to yield per-operation durations.
/// The throughput summary inverts the duration summary: `avg = 1000/avg`,
/// `min = 1000/max`, `max = 1000/min`.
pub fn reduce_durations(series_ms: &[f64], series_size: u32) -> MeasureStats {
    let per_op: Vec<f64> = series_ms
        .iter()
        .map(|d| d / series_size as f64)
        .collect();
    let duration_ms = summarize(&per_op);

    let ops_per_sec = Summary {
        avg: MS_PER_SEC / duration_ms.avg,
        min: MS_PER_SEC / duration_ms.max,
        max: MS_PER_SEC / duration_ms.min,
    };

    MeasureStats {
        ops_per_sec,
        duration_ms,
    }
}

/// Reduce per-pass memory deltas (bytes) directly, no normalization.
pub fn reduce_memory(deltas: &[f64]) -> Summary {
    summarize(deltas)
}

/// Reduce evaluate-leaf return values directly, no unit conversion.
pub fn reduce_eval(values: &[f64]) -> Summary {
    summarize(values)
}
