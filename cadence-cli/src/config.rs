//! Configuration loading from cadence.toml
//!
//! Process-wide defaults can be specified in a `cadence.toml` file in the
//! project root. The file is discovered by walking up from the current
//! directory; CLI flags override anything found here.

use cadence_core::Defaults;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cadence configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CadenceConfig {
    /// Runner defaults.
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Runner defaults for suite execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Candidate data sizes, in execution order.
    #[serde(default = "default_sizes")]
    pub data_unit_sizes: Vec<u64>,
    /// Synthetic data units generated per size.
    #[serde(default = "default_units")]
    pub data_units_count: u32,
    /// Target invocations per series.
    #[serde(default = "default_series_size")]
    pub series_size: u32,
    /// Timed series per leaf per size.
    #[serde(default = "default_series_count")]
    pub series_count: u32,
    /// Settle delay between series, in milliseconds.
    #[serde(default = "default_delay")]
    pub delay: u64,
    /// Issue a GC hint before each series.
    #[serde(default = "default_force_gc")]
    pub force_gc: bool,
    /// Memory-sampling passes; omit to skip memory measurement.
    #[serde(default)]
    pub memory_measurements_count: Option<u32>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            data_unit_sizes: default_sizes(),
            data_units_count: default_units(),
            series_size: default_series_size(),
            series_count: default_series_count(),
            delay: default_delay(),
            force_gc: default_force_gc(),
            memory_measurements_count: None,
        }
    }
}

fn default_sizes() -> Vec<u64> {
    Defaults::default().data_unit_sizes
}
fn default_units() -> u32 {
    Defaults::default().data_units_count
}
fn default_series_size() -> u32 {
    Defaults::default().series_size
}
fn default_series_count() -> u32 {
    Defaults::default().series_count
}
fn default_delay() -> u64 {
    Defaults::default().delay
}
fn default_force_gc() -> bool {
    Defaults::default().force_gc
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human", "json", "csv".
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl CadenceConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from the
    /// current directory.
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("cadence.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Process-wide defaults derived from this file.
    pub fn defaults(&self) -> Defaults {
        Defaults {
            data_unit_sizes: self.runner.data_unit_sizes.clone(),
            data_units_count: self.runner.data_units_count,
            series_size: self.runner.series_size,
            series_count: self.runner.series_count,
            delay: self.runner.delay,
            force_gc: self.runner.force_gc,
        }
    }
}
