//! markup-diff - structure-aware change detection for HTML-like documents
//!
//! This library compares two versions of a markup document and reports
//! which elements were added, removed or changed. Formatting noise such as
//! attribute order, whitespace runs and quoting does not count as a change.
//!
//! # Overview
//!
//! - A weighted node-similarity [`Heuristic`] decides whether two candidate
//!   nodes are the same node with edits, or two unrelated nodes. A shared
//!   `id` is strong evidence of identity; tag names, other attributes,
//!   child churn and descendant text make up the rest.
//! - Every reported change carries a [`Locator`]: a CSS-like selector such
//!   as `:root > div#content > p:nth-of-type(2)` that resolves back to
//!   exactly the node it names.
//!
//! # Example
//!
//! ```
//! use markup_diff::{compare, ChangeType, CompareOptions};
//!
//! let before = "<div> <b>1</b> <strong>2</strong> </div>";
//! let after = "<div> <b>1</b> <i>new</i> <strong>2</strong> </div>";
//! let comparison = compare(before, after, &CompareOptions::default()).unwrap();
//!
//! assert!(comparison.different);
//! assert_eq!(comparison.changes.len(), 1);
//! assert_eq!(comparison.changes[0].change_type, ChangeType::Added);
//! assert_eq!(comparison.changes[0].path().unwrap(), ":root > div > i");
//! ```

pub mod constants;
pub mod diff;
pub mod error;
pub mod markup;
pub mod matching;
pub mod measure;
pub mod node;
pub mod path;

// Re-export commonly used types
pub use diff::{
    compare, compare_files, compare_trees, Change, ChangeSide, ChangeType, CompareOptions,
    Comparison, Differ,
};
pub use error::{Error, Result};
pub use markup::{parse_file, parse_str, to_markup, MarkupParser, MarkupPrinter};
pub use matching::{Component, Differences, Evaluation, Heuristic, Verdict, Weights};
pub use measure::{attribute_values_differ, canonicalize_attribute, text_change_ratio, TextDrift};
pub use node::{text_content, DfsTreeIterator, NodeContent, NodeInner, NodeRef, WeakNodeRef};
pub use path::{locate, resolve, select, Locator, Selector};
