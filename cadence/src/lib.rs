#![warn(missing_docs)]
//! # Cadence
//!
//! Hierarchical performance-measurement harness for Rust.
//!
//! Cadence runs suites of measured units organized in nested groups:
//! - **Typed suite builder**: groups, sync/async measure leaves and
//!   evaluate leaves, validated as they are recorded
//! - **Shared data generators**: leaves declaring the same generator share
//!   one synthetic dataset per data size instead of regenerating it
//! - **Fixed series sampling**: a configurable number of timed series per
//!   unit per size, with per-operation duration and ops/sec summaries
//! - **Optional memory passes**: GC-hinted before/after probe deltas
//! - **Streaming progress**: one event per completed (unit, size) pair,
//!   cooperative stop and per-group skip
//!
//! ## Quick Start
//!
//! ```ignore
//! use cadence::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let bytes = Gen::new(|size| vec![0u8; size as usize]);
//!     let mut builder = Suite::builder();
//!     builder.group("Checksum", |g| {
//!         g.measure("sum", &bytes, |data: &Vec<u8>| {
//!             let _ = data.iter().map(|&b| b as u64).sum::<u64>();
//!         });
//!     });
//!     cadence::run(&builder.build()?)
//! }
//! ```

// Re-export core types
pub use cadence_core::{
    CancelToken, DataGenerator, Datum, Defaults, EvalLeaf, Gen, GeneratorId, GroupNode,
    GroupScope, LeafKind, MeasureLeaf, MeasureTarget, Node, PathFilter, Probe, RegisteredLeaf,
    RegistryError, ResolvedConfig, RunConfig, SelectionPattern, StdProbe, Suite, SuiteBuilder,
};

// Re-export engine types
pub use cadence_engine::{
    CustomResultRecord, ExecutionPlan, OwnerKey, ProgressEvent, RecordingObserver, ResultRecord,
    RunController, RunError, RunHandle, RunObserver, RunState, RunStatus, RunSummary, build_plan,
    matches,
};

// Re-export stats
pub use cadence_stats::{MeasureStats, Summary, reduce_durations, reduce_eval, reduce_memory};

// Re-export report building
pub use cadence_report::{OutputFormat, RunReport, build_report, generate_json_report};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Defaults, Gen, ProgressEvent, RunConfig, RunController, RunObserver, Suite, SuiteBuilder,
    };
}

/// Run the Cadence CLI harness.
///
/// Call this from your suite binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     cadence::run(&suite)
/// }
/// ```
pub use cadence_cli::run;
