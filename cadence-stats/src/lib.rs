#![warn(missing_docs)]
//! Cadence Statistical Reduction
//!
//! Folds raw per-series samples into `{avg, min, max}` summaries:
//! - Duration series are normalized to a single operation before reduction
//! - Ops/sec is derived by inverting the duration summary (min duration
//!   yields max throughput, and vice versa)
//! - Memory deltas and evaluate-leaf values are reduced directly
//!
//! All reducers are pure functions over non-empty slices. Callers must never
//! hand an empty sample set to a reducer; the average of zero samples is not
//! a number and is deliberately not special-cased here.

mod summary;

pub use summary::{MeasureStats, Summary, reduce_durations, reduce_eval, reduce_memory, summarize};

/// Milliseconds per second, used when converting a per-operation duration
/// into operations per second.
pub const MS_PER_SEC: f64 = 1000.0;
