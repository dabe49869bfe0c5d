//! Plan Builder
//!
//! Flattens the hierarchy into an ordered execution plan. Groups appear in
//! order of first appearance during a depth-first, declaration-order
//! traversal; leaves within a group are ordered by a registration index
//! assigned at traversal time. The index is tracked explicitly — it is the
//! canonical tie-break and is not derivable from child position once measure
//! and evaluate leaves have been merged into one sequence.

use std::fmt;

use cadence_core::{
    DataGenerator, EvalLeaf, GeneratorId, GroupNode, MeasureLeaf, Node, ResolvedConfig,
};
use serde::{Deserialize, Serialize};

use crate::matcher::matches;

/// Path to a leaf's parent group (or the leaf's own single-segment path for
/// top-level leaves). The unit of skipping and of generator sharing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerKey(pub Vec<String>);

impl OwnerKey {
    /// Build the owner key for a leaf path.
    pub fn for_leaf_path(path: &[String]) -> Self {
        if path.len() > 1 {
            Self(path[..path.len() - 1].to_vec())
        } else {
            Self(path.to_vec())
        }
    }

    /// The key's path segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Borrowed view of a runnable leaf.
#[derive(Debug, Clone, Copy)]
pub enum LeafRef<'a> {
    /// Timed unit.
    Measure(&'a MeasureLeaf),
    /// Numeric-evaluation unit.
    Evaluate(&'a EvalLeaf),
}

impl<'a> LeafRef<'a> {
    /// Display title.
    pub fn title(&self) -> &'a str {
        match self {
            LeafRef::Measure(l) => &l.title,
            LeafRef::Evaluate(l) => &l.title,
        }
    }

    /// Full path from the root.
    pub fn path(&self) -> &'a [String] {
        match self {
            LeafRef::Measure(l) => &l.path,
            LeafRef::Evaluate(l) => &l.path,
        }
    }

    /// The leaf's data generator.
    pub fn generator(&self) -> &'a DataGenerator {
        match self {
            LeafRef::Measure(l) => &l.generator,
            LeafRef::Evaluate(l) => &l.generator,
        }
    }
}

/// One leaf scheduled for execution.
#[derive(Debug, Clone, Copy)]
pub struct PlannedLeaf<'a> {
    /// Registration index: traversal-time counter across all groups.
    pub index: u64,
    /// The leaf itself.
    pub leaf: LeafRef<'a>,
}

/// All scheduled leaves sharing one owner key, processed together.
#[derive(Debug)]
pub struct PlanGroup<'a> {
    /// The owning path key.
    pub owner_key: OwnerKey,
    /// Leaves in registration order.
    pub leaves: Vec<PlannedLeaf<'a>>,
    /// Set when every included leaf carries the same generator; the
    /// controller then generates each size's dataset once per group.
    pub shared_generator: Option<GeneratorId>,
}

/// Ordered execution plan plus the precomputed progress denominator.
#[derive(Debug, Default)]
pub struct ExecutionPlan<'a> {
    /// Groups in order of first appearance.
    pub groups: Vec<PlanGroup<'a>>,
    /// Sum over included leaves of the sum of configured data sizes.
    pub total_units: u64,
}

impl<'a> ExecutionPlan<'a> {
    /// Total number of scheduled leaves.
    pub fn leaf_count(&self) -> usize {
        self.groups.iter().map(|g| g.leaves.len()).sum()
    }
}

/// Build the execution plan for a hierarchy under the given configuration.
///
/// Degenerate configurations (no sizes, zero units or a zero series shape)
/// yield an empty plan; groups emptied by selection filtering are dropped
/// rather than reported.
pub fn build_plan<'a>(root: &'a GroupNode, config: &ResolvedConfig) -> ExecutionPlan<'a> {
    let mut plan = ExecutionPlan::default();
    if config.is_empty_workload() {
        return plan;
    }

    let mut next_index = 0u64;
    for child in &root.children {
        walk(child, config, &mut plan.groups, &mut next_index);
    }

    let size_sum: u64 = config.data_unit_sizes.iter().sum();
    for group in &mut plan.groups {
        // Registration order is the canonical tie-break within a group.
        group.leaves.sort_by_key(|l| l.index);
        group.shared_generator = shared_generator(&group.leaves);
        plan.total_units += group.leaves.len() as u64 * size_sum;
    }

    tracing::debug!(
        groups = plan.groups.len(),
        leaves = plan.leaf_count(),
        total_units = plan.total_units,
        "execution plan built"
    );
    plan
}

fn walk<'a>(
    node: &'a Node,
    config: &ResolvedConfig,
    groups: &mut Vec<PlanGroup<'a>>,
    next_index: &mut u64,
) {
    match node {
        Node::Group(group) => {
            for child in &group.children {
                walk(child, config, groups, next_index);
            }
        }
        Node::Measure(leaf) => visit(LeafRef::Measure(leaf), config, groups, next_index),
        Node::Evaluate(leaf) => visit(LeafRef::Evaluate(leaf), config, groups, next_index),
    }
}

fn visit<'a>(
    leaf: LeafRef<'a>,
    config: &ResolvedConfig,
    groups: &mut Vec<PlanGroup<'a>>,
    next_index: &mut u64,
) {
    // Every traversed leaf consumes an index, selected or not.
    let index = *next_index;
    *next_index += 1;

    if !is_selected(leaf.path(), config) {
        return;
    }

    let owner_key = OwnerKey::for_leaf_path(leaf.path());
    let pos = match groups.iter().position(|g| g.owner_key == owner_key) {
        Some(existing) => existing,
        None => {
            groups.push(PlanGroup {
                owner_key,
                leaves: Vec::new(),
                shared_generator: None,
            });
            groups.len() - 1
        }
    };
    groups[pos].leaves.push(PlannedLeaf { index, leaf });
}

fn is_selected(path: &[String], config: &ResolvedConfig) -> bool {
    config.selected_paths.is_empty()
        || config.selected_paths.iter().any(|p| matches(path, p))
}

fn shared_generator(leaves: &[PlannedLeaf<'_>]) -> Option<GeneratorId> {
    let first = leaves.first()?.leaf.generator().id();
    leaves
        .iter()
        .all(|l| l.leaf.generator().id() == first)
        .then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{Defaults, Gen, PathFilter, RunConfig, SelectionPattern, Suite};

    fn resolved(config: RunConfig) -> ResolvedConfig {
        config.resolve(&Defaults::default())
    }

    fn sample_suite() -> Suite {
        let shared = Gen::new(|size| size);
        let other = Gen::new(|size| size);
        let mut builder = Suite::builder();
        builder.group("Encoding", |g| {
            g.group("JSON", |g| {
                g.measure("serialize", &shared, |_: &u64| {});
                g.measure("deserialize", &shared, |_: &u64| {});
            });
            g.group("Binary", |g| {
                g.measure("pack", &shared, |_: &u64| {});
                g.measure("unpack", &other, |_: &u64| {});
            });
        });
        builder.measure("standalone", &other, |_: &u64| {});
        builder.build().unwrap()
    }

    #[test]
    fn test_groups_in_first_appearance_order() {
        let suite = sample_suite();
        let plan = build_plan(
            suite.root(),
            &resolved(RunConfig {
                data_unit_sizes: Some(vec![10]),
                ..Default::default()
            }),
        );

        let keys: Vec<String> = plan.groups.iter().map(|g| g.owner_key.to_string()).collect();
        assert_eq!(keys, vec!["Encoding/JSON", "Encoding/Binary", "standalone"]);
    }

    #[test]
    fn test_leaves_keep_registration_order() {
        let suite = sample_suite();
        let plan = build_plan(
            suite.root(),
            &resolved(RunConfig {
                data_unit_sizes: Some(vec![10]),
                ..Default::default()
            }),
        );

        let titles: Vec<&str> = plan.groups[0].leaves.iter().map(|l| l.leaf.title()).collect();
        assert_eq!(titles, vec!["serialize", "deserialize"]);
        assert!(plan.groups[0].leaves[0].index < plan.groups[0].leaves[1].index);
    }

    #[test]
    fn test_top_level_leaf_owns_itself() {
        let suite = sample_suite();
        let plan = build_plan(
            suite.root(),
            &resolved(RunConfig {
                data_unit_sizes: Some(vec![10]),
                ..Default::default()
            }),
        );

        let standalone = plan.groups.last().unwrap();
        assert_eq!(standalone.owner_key.segments(), ["standalone"]);
        assert_eq!(standalone.leaves.len(), 1);
    }

    #[test]
    fn test_shared_generator_detected_per_group() {
        let suite = sample_suite();
        let plan = build_plan(
            suite.root(),
            &resolved(RunConfig {
                data_unit_sizes: Some(vec![10]),
                ..Default::default()
            }),
        );

        // JSON leaves share one generator; Binary leaves do not.
        assert!(plan.groups[0].shared_generator.is_some());
        assert!(plan.groups[1].shared_generator.is_none());
        // A single-leaf group trivially shares.
        assert!(plan.groups[2].shared_generator.is_some());
    }

    #[test]
    fn test_selection_is_or_across_patterns() {
        let suite = sample_suite();
        let config = resolved(RunConfig {
            data_unit_sizes: Some(vec![10]),
            selected_paths: Some(vec![
                SelectionPattern(vec![PathFilter::Any, PathFilter::Exact("Binary".into())]),
                SelectionPattern(vec![PathFilter::Exact("standalone".into())]),
            ]),
            ..Default::default()
        });
        let plan = build_plan(suite.root(), &config);

        let keys: Vec<String> = plan.groups.iter().map(|g| g.owner_key.to_string()).collect();
        assert_eq!(keys, vec!["Encoding/Binary", "standalone"]);
        assert_eq!(plan.leaf_count(), 3);
    }

    #[test]
    fn test_filtered_out_groups_are_dropped() {
        let suite = sample_suite();
        let config = resolved(RunConfig {
            data_unit_sizes: Some(vec![10]),
            selected_paths: Some(vec![SelectionPattern(vec![PathFilter::Exact(
                "nonexistent".into(),
            )])]),
            ..Default::default()
        });
        let plan = build_plan(suite.root(), &config);
        assert!(plan.groups.is_empty());
        assert_eq!(plan.total_units, 0);
    }

    #[test]
    fn test_total_units_sums_sizes_per_leaf() {
        let suite = sample_suite();
        let plan = build_plan(
            suite.root(),
            &resolved(RunConfig {
                data_unit_sizes: Some(vec![10, 100]),
                ..Default::default()
            }),
        );
        // 5 leaves x (10 + 100)
        assert_eq!(plan.total_units, 550);
    }

    #[test]
    fn test_empty_workload_yields_empty_plan() {
        let suite = sample_suite();
        let plan = build_plan(
            suite.root(),
            &resolved(RunConfig {
                data_unit_sizes: Some(vec![]),
                ..Default::default()
            }),
        );
        assert!(plan.groups.is_empty());
        assert_eq!(plan.total_units, 0);
    }

    #[test]
    fn test_shared_detection_ignores_filtered_leaves() {
        // Binary group mixes generators, but filtering down to "pack" leaves
        // a single generator in play.
        let suite = sample_suite();
        let config = resolved(RunConfig {
            data_unit_sizes: Some(vec![10]),
            selected_paths: Some(vec![SelectionPattern(vec![
                PathFilter::Any,
                PathFilter::Exact("Binary".into()),
                PathFilter::Exact("pack".into()),
            ])]),
            ..Default::default()
        });
        let plan = build_plan(suite.root(), &config);
        assert_eq!(plan.groups.len(), 1);
        assert!(plan.groups[0].shared_generator.is_some());
    }
}
