#![warn(missing_docs)]
//! Cadence Engine - Measurement Scheduling
//!
//! Turns a registered suite into an ordered execution plan and drives it:
//!
//! ```text
//! Suite (from cadence-core)
//!       │
//!       ▼
//! ┌─────────────┐
//! │   matcher   │  Per-level path patterns, prefix semantics
//! └──────┬──────┘
//!        ▼
//! ┌─────────────┐
//! │   planner   │  Declaration-ordered groups, shared-generator detection
//! └──────┬──────┘
//!        ▼
//! ┌─────────────┐
//! │ controller  │  group → size → leaf traversal, stop/skip, one event
//! └──────┬──────┘  per completed (leaf, size)
//!        ▼
//!   ProgressEvent stream + completion signal
//! ```
//!
//! Execution is single-threaded and cooperative: one leaf runs to completion
//! before the next starts, and cancellation is a polled flag checked at group,
//! size and leaf boundaries only.

mod controller;
mod events;
mod matcher;
mod planner;
mod progress;

pub use controller::{
    RecordingObserver, RunController, RunError, RunHandle, RunObserver, RunState, RunStatus,
    RunSummary,
};
pub use events::{CustomResultRecord, ProgressEvent, ResultRecord};
pub use matcher::matches;
pub use planner::{ExecutionPlan, LeafRef, OwnerKey, PlanGroup, PlannedLeaf, build_plan};
pub use progress::ProgressTracker;
