//! Selection Patterns
//!
//! A pattern is one filter per hierarchy level, shorter than or equal to the
//! paths it selects. The wire shape mirrors the transport format: `null` for
//! "any", a string for an exact name, an array for a set of names.

use serde::{Deserialize, Serialize};

/// Per-level filter of a selection pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathFilter {
    /// Match this exact name.
    Exact(String),
    /// Match any name in this set.
    OneOf(Vec<String>),
    /// Match any name at this level. Serialized as `null`.
    Any,
}

/// Ordered per-level filters; a prefix constraint on leaf paths.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionPattern(pub Vec<PathFilter>);

impl SelectionPattern {
    /// The per-level filters, outermost first.
    pub fn levels(&self) -> &[PathFilter] {
        &self.0
    }
}

impl From<Vec<PathFilter>> for SelectionPattern {
    fn from(levels: Vec<PathFilter>) -> Self {
        Self(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape_round_trip() {
        let pattern = SelectionPattern(vec![
            PathFilter::Any,
            PathFilter::Exact("Binary".to_string()),
            PathFilter::OneOf(vec!["a".to_string(), "b".to_string()]),
        ]);
        let json = serde_json::to_string(&pattern).unwrap();
        assert_eq!(json, r#"[null,"Binary",["a","b"]]"#);

        let back: SelectionPattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pattern);
    }
}
