//! Demo suite exercising the main Cadence features: shared generators,
//! sync and async measure leaves, and an evaluate group.
//!
//! Run with, for example:
//!
//! ```text
//! cargo run --bin demo_suite -- --sizes 100,1000 --series-count 3 --delay 10
//! cargo run --bin demo_suite -- --select 'Sorting/*' --memory 5
//! cargo run --bin demo_suite -- list
//! ```

use cadence::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_values(size: u64) -> Vec<u32> {
    // Seed from the size so every series sees identical data.
    let mut rng = StdRng::seed_from_u64(size);
    (0..size).map(|_| rng.gen::<u32>()).collect()
}

fn main() -> anyhow::Result<()> {
    // One generator shared by the whole Sorting group, so its dataset is
    // generated once per data size for all three leaves.
    let values = Gen::new(random_values);
    let text = Gen::new(|size| "lorem ipsum dolor sit amet ".repeat(size as usize / 8 + 1));

    let mut builder = Suite::builder();

    builder.group("Sorting", |g| {
        g.measure("stable", &values, |data: &Vec<u32>| {
            let mut copy = data.clone();
            copy.sort();
        });
        g.measure("unstable", &values, |data: &Vec<u32>| {
            let mut copy = data.clone();
            copy.sort_unstable();
        });
        g.measure("binary_heap", &values, |data: &Vec<u32>| {
            let heap: std::collections::BinaryHeap<u32> = data.iter().copied().collect();
            let _ = heap.into_sorted_vec();
        });
    });

    builder.group("Text", |g| {
        g.measure("count_words", &text, |s: &String| {
            let _ = s.split_whitespace().count();
        });
        g.measure_async("count_words_async", &text, |s| async move {
            tokio::task::yield_now().await;
            let _ = s.split_whitespace().count();
        });
    });

    builder.group("Dedup", |g| {
        g.evaluate("distinct_ratio", &values, "dedup-chart", |data: &Vec<u32>| {
            let distinct: std::collections::HashSet<u32> = data.iter().copied().collect();
            distinct.len() as f64 / data.len().max(1) as f64
        });
    });

    cadence::run(&builder.build()?)
}
