//! Run Controller
//!
//! Drives the execution plan through the sampler and reducer in a fixed
//! traversal order: group → data size → leaf. Stop and skip are cooperative
//! flags consulted at exactly three check points (group start, size start,
//! before each leaf); an in-flight leaf always completes. The observer's
//! completion signal fires exactly once on every path out of a run.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use cadence_core::{
    CancelToken, DataGenerator, Datum, Defaults, Probe, ResolvedConfig, RunConfig, Sampler,
    StdProbe, Suite,
};
use cadence_stats::{reduce_durations, reduce_eval, reduce_memory};
use thiserror::Error;

use crate::events::{CustomResultRecord, ProgressEvent, ResultRecord};
use crate::planner::{LeafRef, OwnerKey, build_plan};
use crate::progress::ProgressTracker;

/// Fatal run failures. Capability absence is never one of these; it only
/// degrades precision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// A target function panicked during sampling.
    #[error("target function panicked at '{path}': {message}")]
    TargetPanicked {
        /// Slash-joined path of the failing leaf.
        path: String,
        /// Extracted panic message.
        message: String,
    },

    /// A data generator panicked while producing a dataset.
    #[error("data generator panicked at '{path}': {message}")]
    GeneratorPanicked {
        /// Slash-joined path of the leaf or group being generated for.
        path: String,
        /// Extracted panic message.
        message: String,
    },
}

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Constructed, not started.
    Idle,
    /// Traversing the plan.
    Running,
    /// Unwinding after a stop request or a skip of the active group.
    Stopping,
    /// Finished; the completion signal has fired.
    Completed,
}

impl RunState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => RunState::Idle,
            1 => RunState::Running,
            2 => RunState::Stopping,
            _ => RunState::Completed,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Plan exhausted normally.
    Completed,
    /// A stop request aborted the plan at a check point.
    Stopped,
    /// A target or generator failure ended the run.
    Failed,
}

/// Terminal summary of one run, handed to the observer exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// How the run ended.
    pub status: RunStatus,
    /// The fatal error, when `status` is [`RunStatus::Failed`].
    pub error: Option<RunError>,
    /// Data-size units processed.
    pub units_processed: u64,
    /// Progress events emitted.
    pub results_emitted: u64,
    /// Final progress percentage.
    pub progress: u8,
}

/// Receives the event stream of one run.
pub trait RunObserver {
    /// One completed (leaf, data size) pair.
    fn on_progress(&mut self, event: ProgressEvent);

    /// The run is over. Fires exactly once, on every path.
    fn on_complete(&mut self, summary: &RunSummary);
}

/// Observer that records everything it sees. Useful for report building and
/// tests.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    /// Events in delivery order.
    pub events: Vec<ProgressEvent>,
    /// The completion summary, once delivered.
    pub summary: Option<RunSummary>,
}

impl RunObserver for RecordingObserver {
    fn on_progress(&mut self, event: ProgressEvent) {
        self.events.push(event);
    }

    fn on_complete(&mut self, summary: &RunSummary) {
        self.summary = Some(summary.clone());
    }
}

/// Cloneable control surface for a run: cooperative stop and per-group skip,
/// plus state introspection.
#[derive(Debug, Clone)]
pub struct RunHandle {
    cancel: CancelToken,
    skips: Arc<Mutex<HashSet<OwnerKey>>>,
    state: Arc<AtomicU8>,
}

impl RunHandle {
    fn new() -> Self {
        Self {
            cancel: CancelToken::new(),
            skips: Arc::new(Mutex::new(HashSet::new())),
            state: Arc::new(AtomicU8::new(RunState::Idle as u8)),
        }
    }

    /// Request a cooperative stop. The run aborts at the next check point;
    /// an in-flight leaf completes first.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Skip the group with this owner key. Consulted at the three check
    /// points; a request arriving mid-leaf does not abort the leaf.
    pub fn skip(&self, key: OwnerKey) {
        self.skips
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key);
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::Relaxed))
    }

    fn set_state(&self, state: RunState) {
        self.state.store(state as u8, Ordering::Relaxed);
    }

    fn is_skipped(&self, key: &OwnerKey) -> bool {
        self.skips
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(key)
    }
}

/// Schedules one run over a suite. Consumed by [`RunController::start`];
/// obtain a [`RunHandle`] first for stop/skip control.
pub struct RunController<'s> {
    suite: &'s Suite,
    defaults: Defaults,
    probe: Arc<dyn Probe>,
    handle: RunHandle,
}

impl<'s> RunController<'s> {
    /// Controller over the standard probe and default configuration.
    pub fn new(suite: &'s Suite) -> Self {
        Self::with_probe(suite, Arc::new(StdProbe::new()))
    }

    /// Controller over an injected probe.
    pub fn with_probe(suite: &'s Suite, probe: Arc<dyn Probe>) -> Self {
        Self {
            suite,
            defaults: Defaults::default(),
            probe,
            handle: RunHandle::new(),
        }
    }

    /// Replace the process-wide defaults the run configuration merges over.
    pub fn defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Control surface for this run.
    pub fn handle(&self) -> RunHandle {
        self.handle.clone()
    }

    /// Execute the run to completion, streaming events to `observer`.
    ///
    /// Results are delivered strictly in traversal order, one event per
    /// (leaf, size) pair, never out of order and never twice. The observer's
    /// completion signal fires exactly once, also on failure.
    pub fn start(self, config: &RunConfig, observer: &mut dyn RunObserver) -> RunSummary {
        let resolved = config.resolve(&self.defaults);
        self.handle.set_state(RunState::Running);
        tracing::info!(
            sizes = ?resolved.data_unit_sizes,
            series_count = resolved.series_count,
            series_size = resolved.series_size,
            "run started"
        );

        let plan = build_plan(self.suite.root(), &resolved);
        let mut tracker = ProgressTracker::new(plan.total_units);
        let probe = Arc::clone(&self.probe);
        let mut sampler = Sampler::new(probe.as_ref());

        let mut results_emitted = 0u64;
        let mut stopped = false;
        let mut error: Option<RunError> = None;

        'groups: for group in &plan.groups {
            if self.handle.cancel.is_cancelled() {
                self.handle.set_state(RunState::Stopping);
                stopped = true;
                break 'groups;
            }
            // A skip of the previous group left us in Stopping; the plan
            // itself continues.
            if self.handle.state() == RunState::Stopping {
                self.handle.set_state(RunState::Running);
            }
            if self.handle.is_skipped(&group.owner_key) {
                tracing::debug!(group = %group.owner_key, "group skipped");
                continue 'groups;
            }

            for &size in &resolved.data_unit_sizes {
                if self.handle.cancel.is_cancelled() {
                    self.handle.set_state(RunState::Stopping);
                    stopped = true;
                    break 'groups;
                }
                if self.handle.is_skipped(&group.owner_key) {
                    self.handle.set_state(RunState::Stopping);
                    continue 'groups;
                }

                // Shareable groups generate each size's dataset exactly once.
                let shared: Option<Vec<Datum>> = match (&group.shared_generator, group.leaves.first())
                {
                    (Some(_), Some(first)) => {
                        match generate_dataset(
                            first.leaf.generator(),
                            size,
                            resolved.data_units_count,
                            &group.owner_key.to_string(),
                        ) {
                            Ok(dataset) => Some(dataset),
                            Err(e) => {
                                error = Some(e);
                                break 'groups;
                            }
                        }
                    }
                    _ => None,
                };

                for planned in &group.leaves {
                    if self.handle.cancel.is_cancelled() {
                        self.handle.set_state(RunState::Stopping);
                        stopped = true;
                        break 'groups;
                    }
                    if self.handle.is_skipped(&group.owner_key) {
                        self.handle.set_state(RunState::Stopping);
                        continue 'groups;
                    }

                    let leaf = planned.leaf;
                    let own_storage;
                    let dataset: &[Datum] = match &shared {
                        Some(dataset) => dataset,
                        None => {
                            match generate_dataset(
                                leaf.generator(),
                                size,
                                resolved.data_units_count,
                                &leaf.path().join("/"),
                            ) {
                                Ok(dataset) => {
                                    own_storage = dataset;
                                    &own_storage
                                }
                                Err(e) => {
                                    error = Some(e);
                                    break 'groups;
                                }
                            }
                        }
                    };

                    match run_leaf(&mut sampler, leaf, dataset, &resolved, &self.handle.cancel) {
                        Ok((result, custom_result)) => {
                            let progress = tracker.complete(size);
                            observer.on_progress(ProgressEvent {
                                path: leaf.path().to_vec(),
                                title: leaf.title().to_string(),
                                data_size: size,
                                progress,
                                result,
                                custom_result,
                            });
                            results_emitted += 1;
                        }
                        Err(e) => {
                            error = Some(e);
                            break 'groups;
                        }
                    }
                }
            }
        }

        let status = if error.is_some() {
            RunStatus::Failed
        } else if stopped {
            RunStatus::Stopped
        } else {
            RunStatus::Completed
        };
        self.handle.set_state(RunState::Completed);

        let summary = RunSummary {
            status,
            error,
            units_processed: tracker.done_units(),
            results_emitted,
            progress: tracker.percent(),
        };
        tracing::info!(?status, results = results_emitted, "run finished");
        observer.on_complete(&summary);
        summary
    }
}

/// Sample and reduce one (leaf, size) unit. A panic inside the target is
/// fatal for the whole run.
fn run_leaf(
    sampler: &mut Sampler<'_>,
    leaf: LeafRef<'_>,
    dataset: &[Datum],
    config: &ResolvedConfig,
    cancel: &CancelToken,
) -> Result<(Option<ResultRecord>, Option<CustomResultRecord>), RunError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match leaf {
        LeafRef::Measure(measure) => {
            let raw = sampler.run_measure(measure, dataset, config, cancel);
            let stats = reduce_durations(&raw.durations_ms, config.series_size);
            let memory_bytes = raw.memory_bytes.as_deref().map(reduce_memory);
            (
                Some(ResultRecord {
                    path: measure.path.clone(),
                    title: measure.title.clone(),
                    ops_per_sec: stats.ops_per_sec,
                    duration_ms: stats.duration_ms,
                    memory_bytes,
                }),
                None,
            )
        }
        LeafRef::Evaluate(eval) => {
            let values = sampler.run_eval(eval, dataset);
            (
                None,
                Some(CustomResultRecord {
                    path: eval.path.clone(),
                    title: eval.title.clone(),
                    chart: eval.chart.clone(),
                    values: reduce_eval(&values),
                }),
            )
        }
    }));

    outcome.map_err(|payload| RunError::TargetPanicked {
        path: leaf.path().join("/"),
        message: panic_message(payload),
    })
}

fn generate_dataset(
    generator: &DataGenerator,
    size: u64,
    count: u32,
    origin: &str,
) -> Result<Vec<Datum>, RunError> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        (0..count).map(|_| generator.generate(size)).collect()
    }))
    .map_err(|payload| RunError::GeneratorPanicked {
        path: origin.to_string(),
        message: panic_message(payload),
    })
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::Gen;
    use std::sync::atomic::AtomicUsize;

    fn quick_config(sizes: Vec<u64>) -> RunConfig {
        RunConfig {
            data_unit_sizes: Some(sizes),
            data_units_count: Some(2),
            series_size: Some(1),
            series_count: Some(1),
            delay: Some(0),
            force_gc: Some(false),
            ..Default::default()
        }
    }

    fn two_group_suite() -> Suite {
        let gen = Gen::new(|size| size);
        let mut builder = Suite::builder();
        builder.group("first", |g| {
            g.measure("a", &gen, |_: &u64| {});
        });
        builder.group("second", |g| {
            g.measure("b", &gen, |_: &u64| {});
        });
        builder.build().unwrap()
    }

    #[test]
    fn test_state_machine_idle_to_completed() {
        let suite = two_group_suite();
        let controller = RunController::new(&suite);
        let handle = controller.handle();
        assert_eq!(handle.state(), RunState::Idle);

        let mut observer = RecordingObserver::default();
        controller.start(&quick_config(vec![1]), &mut observer);
        assert_eq!(handle.state(), RunState::Completed);
    }

    #[test]
    fn test_empty_plan_completes_at_100() {
        let suite = two_group_suite();
        let controller = RunController::new(&suite);
        let mut observer = RecordingObserver::default();
        let summary = controller.start(&quick_config(vec![]), &mut observer);

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.results_emitted, 0);
        assert_eq!(summary.progress, 100);
        assert!(observer.events.is_empty());
        assert!(observer.summary.is_some());
    }

    #[test]
    fn test_pre_issued_skip_omits_group_entirely() {
        let suite = two_group_suite();
        let controller = RunController::new(&suite);
        controller.handle().skip(OwnerKey(vec!["first".into()]));

        let mut observer = RecordingObserver::default();
        let summary = controller.start(&quick_config(vec![1, 2]), &mut observer);

        assert_eq!(summary.status, RunStatus::Completed);
        assert!(observer.events.iter().all(|e| e.path[0] == "second"));
        assert_eq!(observer.events.len(), 2);
    }

    #[test]
    fn test_stop_aborts_at_next_check_point() {
        struct StopAfterFirst {
            handle: RunHandle,
            events: Vec<ProgressEvent>,
            completions: usize,
        }
        impl RunObserver for StopAfterFirst {
            fn on_progress(&mut self, event: ProgressEvent) {
                self.handle.stop();
                self.events.push(event);
            }
            fn on_complete(&mut self, _summary: &RunSummary) {
                self.completions += 1;
            }
        }

        let suite = two_group_suite();
        let controller = RunController::new(&suite);
        let mut observer = StopAfterFirst {
            handle: controller.handle(),
            events: Vec::new(),
            completions: 0,
        };
        let summary = controller.start(&quick_config(vec![1, 2]), &mut observer);

        assert_eq!(summary.status, RunStatus::Stopped);
        assert_eq!(observer.events.len(), 1);
        assert_eq!(observer.completions, 1);
        assert!(summary.progress < 100);
    }

    #[test]
    fn test_target_panic_is_fatal_and_reported_once() {
        let gen = Gen::new(|size| size);
        let mut builder = Suite::builder();
        builder.group("g", |g| {
            g.measure("boom", &gen, |_: &u64| panic!("kaboom"));
            g.measure("never", &gen, |_: &u64| {});
        });
        let suite = builder.build().unwrap();

        let controller = RunController::new(&suite);
        let mut observer = RecordingObserver::default();
        let summary = controller.start(&quick_config(vec![1]), &mut observer);

        assert_eq!(summary.status, RunStatus::Failed);
        assert!(observer.events.is_empty());
        match summary.error {
            Some(RunError::TargetPanicked { ref path, ref message }) => {
                assert_eq!(path, "g/boom");
                assert_eq!(message, "kaboom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(observer.summary.is_some());
    }

    #[test]
    fn test_generator_panic_is_fatal() {
        let gen: Gen<u64> = Gen::new(|_| panic!("no data"));
        let mut builder = Suite::builder();
        builder.measure("unit", &gen, |_: &u64| {});
        let suite = builder.build().unwrap();

        let controller = RunController::new(&suite);
        let mut observer = RecordingObserver::default();
        let summary = controller.start(&quick_config(vec![1]), &mut observer);

        assert_eq!(summary.status, RunStatus::Failed);
        assert!(matches!(
            summary.error,
            Some(RunError::GeneratorPanicked { .. })
        ));
    }

    #[test]
    fn test_shared_generator_invoked_once_per_group_size() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counting = calls.clone();
        let gen = Gen::new(move |size| {
            counting.fetch_add(1, Ordering::Relaxed);
            size
        });

        let mut builder = Suite::builder();
        builder.group("g", |g| {
            g.measure("a", &gen, |_: &u64| {});
            g.measure("b", &gen, |_: &u64| {});
        });
        let suite = builder.build().unwrap();

        let controller = RunController::new(&suite);
        let mut observer = RecordingObserver::default();
        let mut config = quick_config(vec![10]);
        config.data_units_count = Some(5);
        let summary = controller.start(&config, &mut observer);

        assert_eq!(summary.results_emitted, 2);
        // One dataset of 5 units for the whole group, not one per leaf.
        assert_eq!(calls.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn test_distinct_generators_generate_per_leaf() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counting_a = calls.clone();
        let counting_b = calls.clone();
        let gen_a = Gen::new(move |size| {
            counting_a.fetch_add(1, Ordering::Relaxed);
            size
        });
        let gen_b = Gen::new(move |size| {
            counting_b.fetch_add(1, Ordering::Relaxed);
            size
        });

        let mut builder = Suite::builder();
        builder.group("g", |g| {
            g.measure("a", &gen_a, |_: &u64| {});
            g.measure("b", &gen_b, |_: &u64| {});
        });
        let suite = builder.build().unwrap();

        let controller = RunController::new(&suite);
        let mut observer = RecordingObserver::default();
        let mut config = quick_config(vec![10]);
        config.data_units_count = Some(5);
        controller.start(&config, &mut observer);

        assert_eq!(calls.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn test_traversal_order_group_size_leaf() {
        let gen = Gen::new(|size| size);
        let mut builder = Suite::builder();
        builder.group("g", |g| {
            g.measure("a", &gen, |_: &u64| {});
            g.measure("b", &gen, |_: &u64| {});
        });
        let suite = builder.build().unwrap();

        let controller = RunController::new(&suite);
        let mut observer = RecordingObserver::default();
        controller.start(&quick_config(vec![1, 2]), &mut observer);

        let order: Vec<(u64, &str)> = observer
            .events
            .iter()
            .map(|e| (e.data_size, e.title.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "a"), (1, "b"), (2, "a"), (2, "b")]);
    }
}
