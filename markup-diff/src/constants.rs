//! Constants used throughout markup-diff.

/// Base weights of the node-similarity heuristic, as `(same, differs)`.
///
/// Each is scaled by the matching multiplier in [`crate::Weights`].
pub const NAME_WEIGHTS: (f64, f64) = (10.0, -10.0);

/// The id super-attribute: agreement is near-conclusive, disagreement is not.
pub const ID_WEIGHTS: (f64, f64) = (45.0, -15.0);

/// All other attributes, judged as an aggregate.
pub const ATTRIBUTE_WEIGHTS: (f64, f64) = (12.0, -12.0);

/// Structural churn among the children.
pub const CONTENTS_WEIGHTS: (f64, f64) = (11.0, -11.0);

/// Descendant text drift.
pub const TEXT_CONTENTS_WEIGHTS: (f64, f64) = (5.0, -5.0);

/// Attributes differ significantly when more than this fraction differs.
pub const ATTRIBUTE_DIFF_RATIO: f64 = 0.5;

/// Contents differ significantly when more than this fraction of children churned.
pub const CONTENTS_DIFF_RATIO: f64 = 0.99;

/// Default fraction of changed characters above which text differs significantly.
pub const DEFAULT_TEXT_THRESHOLD: f64 = 0.5;

/// Locator of the document root.
pub const ROOT_MARKER: &str = ":root";

/// Separator between locator segments (child combinator).
pub const SEGMENT_SEPARATOR: &str = " > ";

/// Elements that never have children in HTML.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Returns true if `name` is an HTML void element.
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(name))
}
