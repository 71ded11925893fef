//! Document comparison.
//!
//! [`compare`] parses two documents and reports what changed between them
//! as an ordered list of [`Change`]s. The walk is top-down over both trees:
//! sibling sequences are aligned, unmatched children become additions and
//! removals, and matched pairs are diffed recursively before the
//! [`Heuristic`](crate::matching::Heuristic) judges them with the changes
//! found beneath.

mod align;
mod compare;
mod digest;

pub use compare::{compare, compare_files, compare_trees, Differ};

use std::fmt;

use serde::Serialize;

use crate::matching::Weights;
use crate::node::NodeRef;
use crate::path::{locate, Locator};

/// Kind of a reported change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// The node exists only in the after document.
    Added,
    /// The node exists only in the before document.
    Removed,
    /// The node exists in both documents with different contents.
    Changed,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeType::Added => "added",
            ChangeType::Removed => "removed",
            ChangeType::Changed => "changed",
        })
    }
}

/// One side (before or after) of a change.
#[derive(Debug, Clone, Default)]
pub struct ChangeSide {
    /// The node on this side, absent for the missing side of an addition
    /// or removal.
    pub node: Option<NodeRef>,
    /// The node's parent, or for a missing side, the parent on this side
    /// the node was added to or removed from.
    pub parent: Option<NodeRef>,
    /// Locator of `node`, absent when it is missing or unaddressable.
    pub path: Option<Locator>,
    /// Locator of `parent`.
    pub parent_path: Option<Locator>,
}

impl ChangeSide {
    fn present(node: &NodeRef, parent: Option<NodeRef>) -> Self {
        ChangeSide {
            node: Some(node.clone()),
            path: locate(node),
            parent_path: parent.as_ref().and_then(locate),
            parent,
        }
    }

    fn missing(parent: &NodeRef) -> Self {
        ChangeSide {
            node: None,
            path: None,
            parent_path: locate(parent),
            parent: Some(parent.clone()),
        }
    }
}

/// A single reported difference between two documents.
#[derive(Debug, Clone)]
pub struct Change {
    /// What happened.
    pub change_type: ChangeType,
    /// The before side.
    pub before: ChangeSide,
    /// The after side.
    pub after: ChangeSide,
}

impl Change {
    /// `node` was added under `after_parent`; `before_parent` is its
    /// counterpart in the before document.
    pub fn added(before_parent: &NodeRef, after_parent: &NodeRef, node: &NodeRef) -> Self {
        Change {
            change_type: ChangeType::Added,
            before: ChangeSide::missing(before_parent),
            after: ChangeSide::present(node, Some(after_parent.clone())),
        }
    }

    /// `node` was removed from `before_parent`; `after_parent` is its
    /// counterpart in the after document.
    pub fn removed(before_parent: &NodeRef, after_parent: &NodeRef, node: &NodeRef) -> Self {
        Change {
            change_type: ChangeType::Removed,
            before: ChangeSide::present(node, Some(before_parent.clone())),
            after: ChangeSide::missing(after_parent),
        }
    }

    /// `before` became `after`.
    pub fn changed(before: &NodeRef, after: &NodeRef) -> Self {
        let before_parent = before.borrow().parent();
        let after_parent = after.borrow().parent();
        Change {
            change_type: ChangeType::Changed,
            before: ChangeSide::present(before, before_parent),
            after: ChangeSide::present(after, after_parent),
        }
    }

    /// The side that holds the node the change is about: the after side,
    /// except for removals.
    pub fn side(&self) -> &ChangeSide {
        match self.change_type {
            ChangeType::Removed => &self.before,
            ChangeType::Added | ChangeType::Changed => &self.after,
        }
    }

    /// Returns the node the change is about.
    pub fn node(&self) -> Option<&NodeRef> {
        self.side().node.as_ref()
    }

    /// Returns the locator of the node the change is about.
    pub fn path(&self) -> Option<&Locator> {
        self.side().path.as_ref()
    }

    /// Returns true if the changed node has a locator.
    pub fn is_addressable(&self) -> bool {
        self.path().is_some()
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.path() {
            Some(path) => write!(f, "{} {}", self.change_type, path),
            None => write!(f, "{} (unaddressable)", self.change_type),
        }
    }
}

/// Result of comparing two documents.
///
/// Holds on to both documents, so that the nodes in the changes can still
/// walk up to their roots.
#[derive(Debug, Clone, Default)]
pub struct Comparison {
    /// True if any change was found.
    pub different: bool,
    /// Changes in document order.
    pub changes: Vec<Change>,
    documents: Option<(NodeRef, NodeRef)>,
}

impl Comparison {
    fn new(changes: Vec<Change>, before: &NodeRef, after: &NodeRef) -> Self {
        Comparison {
            different: !changes.is_empty(),
            changes,
            documents: Some((before.clone(), after.clone())),
        }
    }

    /// Returns the before document's root.
    pub fn before(&self) -> Option<&NodeRef> {
        self.documents.as_ref().map(|(before, _)| before)
    }

    /// Returns the after document's root.
    pub fn after(&self) -> Option<&NodeRef> {
        self.documents.as_ref().map(|(_, after)| after)
    }

    /// Returns the change types in order.
    pub fn change_types(&self) -> Vec<ChangeType> {
        self.changes.iter().map(|c| c.change_type).collect()
    }
}

/// Settings for one comparison run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompareOptions {
    /// Heuristic weights.
    pub weights: Weights,
    /// Leave comments out of the comparison.
    pub ignore_comments: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        CompareOptions {
            weights: Weights::default(),
            ignore_comments: true,
        }
    }
}

impl CompareOptions {
    /// Options using the given weights.
    pub fn with_weights(weights: Weights) -> Self {
        CompareOptions {
            weights,
            ..Self::default()
        }
    }

    /// Returns a copy that compares comments too.
    pub fn keep_comments(self) -> Self {
        CompareOptions {
            ignore_comments: false,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_str;

    fn child(node: &NodeRef, index: usize) -> NodeRef {
        node.borrow().children()[index].clone()
    }

    #[test]
    fn test_added_change_sides() {
        let before = parse_str("<div></div>").unwrap();
        let after = parse_str("<div><i>new</i></div>").unwrap();
        let (div_a, div_b) = (child(&before, 0), child(&after, 0));
        let change = Change::added(&div_a, &div_b, &child(&div_b, 0));

        assert_eq!(change.change_type, ChangeType::Added);
        assert!(change.before.node.is_none());
        assert_eq!(change.before.parent_path.as_ref().unwrap(), ":root > div");
        assert_eq!(change.path().unwrap(), ":root > div > i");
        assert_eq!(change.to_string(), "added :root > div > i");
    }

    #[test]
    fn test_removed_change_is_about_the_before_node() {
        let before = parse_str("<p><b>x</b></p>").unwrap();
        let after = parse_str("<p></p>").unwrap();
        let (p_a, p_b) = (child(&before, 0), child(&after, 0));
        let b = child(&p_a, 0);
        let change = Change::removed(&p_a, &p_b, &b);

        assert!(crate::node::same_node(change.node().unwrap(), &b));
        assert!(change.after.node.is_none());
        assert_eq!(change.after.parent_path.as_ref().unwrap(), ":root > p");
    }

    #[test]
    fn test_changed_takes_parents_from_the_nodes() {
        let before = parse_str(r#"<p class="a">x</p>"#).unwrap();
        let after = parse_str(r#"<p class="b">x</p>"#).unwrap();
        let change = Change::changed(&child(&before, 0), &child(&after, 0));

        assert_eq!(change.before.path.as_ref().unwrap(), ":root > p.a");
        assert_eq!(change.after.path.as_ref().unwrap(), ":root > p.b");
        assert!(change.after.parent.as_ref().unwrap().borrow().is_root());
        assert_eq!(change.after.parent_path.as_ref().unwrap(), ":root");
    }

    #[test]
    fn test_text_changes_are_unaddressable() {
        let before = parse_str("<p>x</p>").unwrap();
        let after = parse_str("<p></p>").unwrap();
        let (p_a, p_b) = (child(&before, 0), child(&after, 0));
        let change = Change::removed(&p_a, &p_b, &child(&p_a, 0));
        assert!(!change.is_addressable());
        assert_eq!(change.to_string(), "removed (unaddressable)");
    }

    #[test]
    fn test_change_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ChangeType::Removed).unwrap(),
            "\"removed\""
        );
    }

    #[test]
    fn test_default_options() {
        let options = CompareOptions::default();
        assert!(options.ignore_comments);
        assert!(!options.keep_comments().ignore_comments);
        assert_eq!(options.weights, Weights::default());
    }
}
