//! Run Configuration
//!
//! A run is configured by layering caller-supplied overrides over
//! process-wide defaults. Every override is optional; serialized field names
//! are fixed by the transport protocol and must not change.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pattern::SelectionPattern;

/// Caller-supplied overrides for one run. Absent fields fall back to
/// [`Defaults`]; absent `memory_measurements_count` disables memory sampling
/// entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
    /// Selection patterns, OR semantics. `None` or empty selects everything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_paths: Option<Vec<SelectionPattern>>,
    /// Candidate data sizes, in execution order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_unit_sizes: Option<Vec<u64>>,
    /// Synthetic data units generated per size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_units_count: Option<u32>,
    /// Target invocations per series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_size: Option<u32>,
    /// Timed series per leaf per size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_count: Option<u32>,
    /// Settle delay between series, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
    /// Issue a GC hint before each series.
    #[serde(rename = "forceGC", skip_serializing_if = "Option::is_none")]
    pub force_gc: Option<bool>,
    /// Memory-sampling passes per leaf per size; absent means memory is not
    /// measured for this run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_measurements_count: Option<u32>,
}

/// Process-wide defaults a [`RunConfig`] merges over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
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
    /// Issue a GC hint before each series.
    pub force_gc: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            data_unit_sizes: vec![100, 1_000, 10_000],
            data_units_count: 100,
            series_size: 100,
            series_count: 5,
            delay: 100,
            force_gc: true,
        }
    }
}

/// Fully-merged configuration the engine runs from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Selection patterns; empty selects everything.
    pub selected_paths: Vec<SelectionPattern>,
    /// Candidate data sizes, in execution order.
    pub data_unit_sizes: Vec<u64>,
    /// Synthetic data units generated per size.
    pub data_units_count: u32,
    /// Target invocations per series.
    pub series_size: u32,
    /// Timed series per leaf per size.
    pub series_count: u32,
    /// Settle delay between series.
    pub delay: Duration,
    /// Issue a GC hint before each series.
    pub force_gc: bool,
    /// Memory-sampling passes; `None` disables memory sampling.
    pub memory_measurements_count: Option<u32>,
}

impl RunConfig {
    /// Merge this configuration over the given defaults.
    pub fn resolve(&self, defaults: &Defaults) -> ResolvedConfig {
        ResolvedConfig {
            selected_paths: self.selected_paths.clone().unwrap_or_default(),
            data_unit_sizes: self
                .data_unit_sizes
                .clone()
                .unwrap_or_else(|| defaults.data_unit_sizes.clone()),
            data_units_count: self.data_units_count.unwrap_or(defaults.data_units_count),
            series_size: self.series_size.unwrap_or(defaults.series_size),
            series_count: self.series_count.unwrap_or(defaults.series_count),
            delay: Duration::from_millis(self.delay.unwrap_or(defaults.delay)),
            force_gc: self.force_gc.unwrap_or(defaults.force_gc),
            memory_measurements_count: self.memory_measurements_count,
        }
    }
}

impl ResolvedConfig {
    /// Whether this configuration describes zero work: no sizes, no data
    /// units, or a degenerate series shape. Such runs complete immediately
    /// with an empty plan.
    pub fn is_empty_workload(&self) -> bool {
        self.data_unit_sizes.is_empty()
            || self.data_units_count == 0
            || self.series_size == 0
            || self.series_count == 0
    }
}
