//! Leaf selection from CLI flags: structural patterns plus an optional
//! regex narrowing over slash-joined paths.

use cadence_core::{Node, PathFilter, SelectionPattern, Suite};
use cadence_engine::matches;
use regex::Regex;

/// Parse one `--select` argument into a pattern.
///
/// Segments are separated by '/': `*` matches any name, `{a,b}` matches
/// any name in the set, anything else matches exactly.
pub fn parse_pattern(raw: &str) -> SelectionPattern {
    let levels = raw
        .split('/')
        .map(|segment| {
            if segment == "*" {
                PathFilter::Any
            } else if let Some(inner) = segment
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
            {
                PathFilter::OneOf(inner.split(',').map(|s| s.trim().to_string()).collect())
            } else {
                PathFilter::Exact(segment.to_string())
            }
        })
        .collect();
    SelectionPattern(levels)
}

/// All leaf paths of the suite in declaration order.
pub fn leaf_paths(suite: &Suite) -> Vec<Vec<String>> {
    fn walk(node: &Node, out: &mut Vec<Vec<String>>) {
        match node {
            Node::Group(group) => {
                for child in &group.children {
                    walk(child, out);
                }
            }
            Node::Measure(_) | Node::Evaluate(_) => out.push(node.path().to_vec()),
        }
    }
    let mut out = Vec::new();
    for child in &suite.root().children {
        walk(child, &mut out);
    }
    out
}

/// Combine `--select` patterns and the `--filter` regex into the run
/// configuration's selection. The regex narrows within the structural
/// selection by expanding to exact-path patterns; `Some(vec![])` means
/// nothing survived and the caller should not start a run.
pub fn build_selected_paths(
    suite: &Suite,
    select: &[String],
    filter: Option<&str>,
) -> anyhow::Result<Option<Vec<SelectionPattern>>> {
    let select_patterns: Vec<SelectionPattern> =
        select.iter().map(|s| parse_pattern(s)).collect();

    let Some(filter) = filter else {
        return Ok((!select_patterns.is_empty()).then_some(select_patterns));
    };

    let re = Regex::new(filter)
        .map_err(|e| anyhow::anyhow!("invalid --filter regex: {}", e))?;

    let mut exact = Vec::new();
    for path in leaf_paths(suite) {
        let structurally_selected =
            select_patterns.is_empty() || select_patterns.iter().any(|p| matches(&path, p));
        if structurally_selected && re.is_match(&path.join("/")) {
            exact.push(SelectionPattern(
                path.into_iter().map(PathFilter::Exact).collect(),
            ));
        }
    }
    Ok(Some(exact))
}
