//! Sampler
//!
//! Runs the timed series and memory passes for a single leaf at a single
//! data size. The sampler is deliberately dumb: it knows nothing about
//! plans, progress or skipping — the run controller owns all of that. A
//! stop request only shortens the settle delay between series; it never
//! aborts a leaf that is already sampling.

use std::time::{Duration, Instant};

use crate::cancel::CancelToken;
use crate::config::ResolvedConfig;
use crate::hierarchy::{Datum, EvalLeaf, MeasureLeaf, MeasureTarget};
use crate::probe::Probe;

/// Granularity of the cooperative settle wait.
const SETTLE_SLICE: Duration = Duration::from_millis(10);

/// Raw samples for one (leaf, data size) unit.
#[derive(Debug, Clone)]
pub struct RawSamples {
    /// One elapsed-time sample per series, in milliseconds.
    pub durations_ms: Vec<f64>,
    /// One clamped delta per memory pass, in bytes. `None` when memory
    /// sampling was not configured.
    pub memory_bytes: Option<Vec<f64>>,
}

/// Drives target invocations for one leaf at a time.
///
/// Asynchronous targets run on a lazily built current-thread runtime and are
/// awaited one invocation at a time, so "concurrent" targets are strictly
/// serialized.
pub struct Sampler<'p> {
    probe: &'p dyn Probe,
    cached_runtime: Option<tokio::runtime::Runtime>,
}

impl<'p> Sampler<'p> {
    /// Create a sampler over the given probe.
    pub fn new(probe: &'p dyn Probe) -> Self {
        Self {
            probe,
            cached_runtime: None,
        }
    }

    /// Run all configured series (and memory passes, if any) for one measure
    /// leaf. `dataset` must be non-empty; invocations cycle through it by
    /// index modulo its length.
    pub fn run_measure(
        &mut self,
        leaf: &MeasureLeaf,
        dataset: &[Datum],
        config: &ResolvedConfig,
        cancel: &CancelToken,
    ) -> RawSamples {
        let mut durations_ms = Vec::with_capacity(config.series_count as usize);

        for series in 0..config.series_count {
            if config.force_gc {
                self.probe.hint_gc();
            }
            let start = self.probe.now_ms();
            self.run_series(leaf, dataset, config.series_size);
            durations_ms.push(self.probe.now_ms() - start);

            if series + 1 < config.series_count {
                settle(config.delay, cancel);
            }
        }

        let memory_bytes = config
            .memory_measurements_count
            .map(|passes| self.run_memory_passes(leaf, dataset, passes));

        RawSamples {
            durations_ms,
            memory_bytes,
        }
    }

    /// Invoke an evaluate leaf once per datum and collect the returned
    /// numbers. No series or repetition dimension, no timing.
    pub fn run_eval(&mut self, leaf: &EvalLeaf, dataset: &[Datum]) -> Vec<f64> {
        dataset.iter().map(|datum| leaf.target.call(datum)).collect()
    }

    fn run_series(&mut self, leaf: &MeasureLeaf, dataset: &[Datum], series_size: u32) {
        match &leaf.target {
            MeasureTarget::Sync(target) => {
                for i in 0..series_size {
                    target(&dataset[i as usize % dataset.len()]);
                }
            }
            MeasureTarget::Async(target) => {
                let rt = runtime(&mut self.cached_runtime);
                for i in 0..series_size {
                    rt.block_on(target(dataset[i as usize % dataset.len()].clone()));
                }
            }
        }
    }

    /// Memory passes are independent of the timed series: each pass hints
    /// the collector, brackets a single invocation with probe snapshots and
    /// records the non-negative delta.
    fn run_memory_passes(&mut self, leaf: &MeasureLeaf, dataset: &[Datum], passes: u32) -> Vec<f64> {
        let mut deltas = Vec::with_capacity(passes as usize);
        for pass in 0..passes {
            self.probe.hint_gc();
            let before = self.probe.memory_used_bytes();
            self.invoke_once(leaf, &dataset[pass as usize % dataset.len()]);
            let after = self.probe.memory_used_bytes();
            deltas.push(after.saturating_sub(before) as f64);
        }
        deltas
    }

    fn invoke_once(&mut self, leaf: &MeasureLeaf, datum: &Datum) {
        match &leaf.target {
            MeasureTarget::Sync(target) => target(datum),
            MeasureTarget::Async(target) => {
                let rt = runtime(&mut self.cached_runtime);
                rt.block_on(target(datum.clone()));
            }
        }
    }
}

/// Cache the runtime across invocations to avoid per-call construction cost.
fn runtime(slot: &mut Option<tokio::runtime::Runtime>) -> &tokio::runtime::Runtime {
    slot.get_or_insert_with(|| {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime")
    })
}

/// Cooperative inter-series wait. Sleeps in small slices so an external stop
/// cuts the wait short without aborting the in-flight leaf.
fn settle(delay: Duration, cancel: &CancelToken) {
    if delay.is_zero() {
        return;
    }
    let deadline = Instant::now() + delay;
    while !cancel.is_cancelled() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        std::thread::sleep(remaining.min(SETTLE_SLICE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Defaults, RunConfig};
    use crate::hierarchy::{Gen, Node, Suite};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    /// Deterministic probe: the clock advances 10ms per reading and memory
    /// grows 512 bytes per reading.
    struct TickProbe {
        ticks: AtomicU64,
    }

    impl TickProbe {
        fn new() -> Self {
            Self {
                ticks: AtomicU64::new(0),
            }
        }
    }

    impl Probe for TickProbe {
        fn now_ms(&self) -> f64 {
            self.ticks.fetch_add(1, Ordering::Relaxed) as f64 * 10.0
        }

        fn memory_used_bytes(&self) -> u64 {
            self.ticks.fetch_add(1, Ordering::Relaxed) * 512
        }
    }

    fn config(series_count: u32, series_size: u32, memory: Option<u32>) -> ResolvedConfig {
        RunConfig {
            data_unit_sizes: Some(vec![1]),
            data_units_count: Some(4),
            series_size: Some(series_size),
            series_count: Some(series_count),
            delay: Some(0),
            force_gc: Some(false),
            memory_measurements_count: memory,
            ..Default::default()
        }
        .resolve(&Defaults::default())
    }

    fn measure_suite(calls: Arc<AtomicUsize>) -> Suite {
        let gen = Gen::new(|size| size);
        let mut builder = Suite::builder();
        builder.measure("unit", &gen, move |_: &u64| {
            calls.fetch_add(1, Ordering::Relaxed);
        });
        builder.build().unwrap()
    }

    fn first_measure_leaf(suite: &Suite) -> &MeasureLeaf {
        match &suite.root().children[0] {
            Node::Measure(leaf) => leaf,
            _ => panic!("expected measure leaf"),
        }
    }

    fn dataset(len: usize) -> Vec<Datum> {
        (0..len as u64).map(|i| Arc::new(i) as Datum).collect()
    }

    #[test]
    fn test_one_duration_sample_per_series() {
        let calls = Arc::new(AtomicUsize::new(0));
        let suite = measure_suite(calls.clone());
        let probe = TickProbe::new();
        let mut sampler = Sampler::new(&probe);

        let raw = sampler.run_measure(
            first_measure_leaf(&suite),
            &dataset(4),
            &config(3, 7, None),
            &CancelToken::new(),
        );

        assert_eq!(raw.durations_ms.len(), 3);
        // TickProbe advances 10ms between the start and end reading.
        assert!(raw.durations_ms.iter().all(|&d| (d - 10.0).abs() < 1e-9));
        assert_eq!(calls.load(Ordering::Relaxed), 21);
        assert!(raw.memory_bytes.is_none());
    }

    #[test]
    fn test_series_cycles_dataset_modulo_length() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_in_target = seen.clone();
        let gen = Gen::new(|size| size);
        let mut builder = Suite::builder();
        builder.measure("unit", &gen, move |value: &u64| {
            seen_in_target.lock().unwrap().push(*value);
        });
        let suite = builder.build().unwrap();

        let probe = TickProbe::new();
        let mut sampler = Sampler::new(&probe);
        sampler.run_measure(
            first_measure_leaf(&suite),
            &dataset(3),
            &config(1, 7, None),
            &CancelToken::new(),
        );

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_memory_passes_record_clamped_deltas() {
        let calls = Arc::new(AtomicUsize::new(0));
        let suite = measure_suite(calls.clone());
        let probe = TickProbe::new();
        let mut sampler = Sampler::new(&probe);

        let raw = sampler.run_measure(
            first_measure_leaf(&suite),
            &dataset(2),
            &config(1, 1, Some(4)),
            &CancelToken::new(),
        );

        let memory = raw.memory_bytes.unwrap();
        assert_eq!(memory.len(), 4);
        // TickProbe grows by 512 bytes per reading, so each delta is 512.
        assert!(memory.iter().all(|&d| (d - 512.0).abs() < 1e-9));
        // 1 series invocation + 4 memory-pass invocations.
        assert_eq!(calls.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn test_async_target_serialized_per_invocation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_target = calls.clone();
        let gen = Gen::new(|size| size);
        let mut builder = Suite::builder();
        builder.measure_async("unit", &gen, move |_: Arc<u64>| {
            let calls = calls_in_target.clone();
            async move {
                tokio::task::yield_now().await;
                calls.fetch_add(1, Ordering::Relaxed);
            }
        });
        let suite = builder.build().unwrap();

        let probe = TickProbe::new();
        let mut sampler = Sampler::new(&probe);
        let raw = sampler.run_measure(
            first_measure_leaf(&suite),
            &dataset(2),
            &config(2, 5, None),
            &CancelToken::new(),
        );

        assert_eq!(raw.durations_ms.len(), 2);
        assert_eq!(calls.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn test_eval_returns_one_value_per_datum() {
        let gen = Gen::new(|size| size);
        let mut builder = Suite::builder();
        builder.evaluate("unit", &gen, "chart-1", |value: &u64| *value as f64 * 2.0);
        let suite = builder.build().unwrap();
        let leaf = match &suite.root().children[0] {
            Node::Evaluate(leaf) => leaf,
            _ => panic!("expected evaluate leaf"),
        };

        let probe = TickProbe::new();
        let mut sampler = Sampler::new(&probe);
        let values = sampler.run_eval(leaf, &dataset(3));
        assert_eq!(values, vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_cancelled_token_shortens_settle() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let start = Instant::now();
        settle(Duration::from_millis(500), &cancel);
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
