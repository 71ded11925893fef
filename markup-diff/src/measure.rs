//! Leaf similarity measurements.
//!
//! This module provides the attribute canonicalizer used before any
//! attribute comparison, and the character-level text drift used by the
//! text contents component of the heuristic.

use similar::{ChangeTag, TextDiff};

use crate::node::normalize_whitespace;

/// Canonicalizes an attribute value before equality comparison.
///
/// Whitespace runs collapse to a single space, the value is trimmed and one
/// pair of matching surrounding quotes (left over from sloppy quoting) is
/// removed. An absent attribute stays absent: it never equals an empty one.
pub fn canonicalize_attribute(value: Option<&str>) -> Option<String> {
    let value = value?;
    let collapsed = normalize_whitespace(value);
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|&q| {
            collapsed
                .strip_prefix(q)
                .and_then(|rest| rest.strip_suffix(q))
        })
        .map(str::trim)
        .unwrap_or(&collapsed);
    Some(unquoted.to_string())
}

/// Returns true if two attribute values differ after canonicalization.
pub fn attribute_values_differ(a: Option<&str>, b: Option<&str>) -> bool {
    canonicalize_attribute(a) != canonicalize_attribute(b)
}

/// Character-level drift between two strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextDrift {
    /// Total length of inserted and deleted character runs.
    pub changed: usize,
    /// Length of the longer of the two strings, in characters.
    pub possible: usize,
}

impl TextDrift {
    /// Measures the drift between `a` and `b`.
    pub fn between(a: &str, b: &str) -> Self {
        let possible = a.chars().count().max(b.chars().count());
        if a == b {
            return TextDrift {
                changed: 0,
                possible,
            };
        }

        let diff = TextDiff::from_chars(a, b);
        let changed = diff
            .iter_all_changes()
            .filter(|change| change.tag() != ChangeTag::Equal)
            .map(|change| change.value().chars().count())
            .sum();

        TextDrift { changed, possible }
    }

    /// Fraction of characters that changed, in `[0, 2]`; 0 when both are empty.
    ///
    /// A full replacement counts both the deletion and the insertion, so the
    /// ratio can exceed 1.
    pub fn ratio(&self) -> f64 {
        if self.possible == 0 {
            0.0
        } else {
            self.changed as f64 / self.possible as f64
        }
    }
}

/// Returns the fraction of characters that differ between `a` and `b`.
pub fn text_change_ratio(a: &str, b: &str) -> f64 {
    TextDrift::between(a, b).ratio()
}
