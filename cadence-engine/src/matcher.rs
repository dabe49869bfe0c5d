//! Path Matcher
//!
//! Evaluates whether a concrete leaf path satisfies a selection pattern.
//! Patterns are prefix constraints: every specified level must match the
//! corresponding path segment, and unspecified deeper levels match
//! implicitly. A pattern with more levels than the path never matches.

use cadence_core::{PathFilter, SelectionPattern};

/// Whether `path` satisfies `pattern`.
///
/// Pure and stateless; runs once per candidate leaf per pattern per run.
pub fn matches(path: &[String], pattern: &SelectionPattern) -> bool {
    let levels = pattern.levels();
    if levels.len() > path.len() {
        return false;
    }
    levels
        .iter()
        .zip(path)
        .all(|(filter, segment)| accepts(filter, segment))
}

fn accepts(filter: &PathFilter, segment: &str) -> bool {
    match filter {
        PathFilter::Any => true,
        PathFilter::Exact(name) => name == segment,
        PathFilter::OneOf(names) => names.iter().any(|n| n == segment),
    }
}
