//! The comparison walk.

use std::path::Path;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use super::align::{align, Step};
use super::digest::DigestCache;
use super::{Change, CompareOptions, Comparison};
use crate::error::Result;
use crate::markup::{parse_file, parse_str};
use crate::matching::{Differences, Heuristic, Verdict};
use crate::node::{node_key, NodeRef};

/// What diffing one candidate pair produced.
#[derive(Debug, Default)]
struct Outcome {
    verdict: Verdict,
    /// Changes to report for the pair, its own entry first.
    changes: Vec<Change>,
}

/// Compares document trees.
///
/// Candidate pairs are diffed at most once: outcomes are cached by node
/// identity, as are subtree digests. A `Differ` may be reused for several
/// comparisons under the same options; each comparison starts with empty
/// caches.
pub struct Differ {
    options: CompareOptions,
    heuristic: Heuristic,
    digests: DigestCache,
    /// Outcomes by (before node, after node).
    outcomes: FxHashMap<(usize, usize), Rc<Outcome>>,
}

impl Default for Differ {
    fn default() -> Self {
        Self::new(CompareOptions::default())
    }
}

impl Differ {
    /// Creates a differ for the given options.
    pub fn new(options: CompareOptions) -> Self {
        Differ {
            options,
            heuristic: Heuristic::new(options.weights),
            digests: DigestCache::new(options.ignore_comments),
            outcomes: FxHashMap::default(),
        }
    }

    /// Returns the options in use.
    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// Compares two document roots. Roots are always treated as the same
    /// node.
    pub fn compare_trees(&mut self, before: &NodeRef, after: &NodeRef) -> Comparison {
        self.outcomes.clear();
        self.digests.clear();
        debug!(
            weights = ?self.options.weights,
            ignore_comments = self.options.ignore_comments,
            "comparing documents"
        );
        let outcome = self.diff_pair(before, after);
        debug!(
            changes = outcome.changes.len(),
            pairs = self.outcomes.len(),
            "comparison finished"
        );
        Comparison::new(outcome.changes.clone(), before, after)
    }

    /// Diffs a candidate pair, reusing an earlier outcome if there is one.
    fn diff_pair(&mut self, a: &NodeRef, b: &NodeRef) -> Rc<Outcome> {
        let key = (node_key(a), node_key(b));
        if let Some(outcome) = self.outcomes.get(&key) {
            return Rc::clone(outcome);
        }
        let outcome = Rc::new(self.evaluate_pair(a, b));
        self.outcomes.insert(key, Rc::clone(&outcome));
        outcome
    }

    fn evaluate_pair(&mut self, a: &NodeRef, b: &NodeRef) -> Outcome {
        if self.digests.digest(a) == self.digests.digest(b) {
            trace!("subtrees are equal");
            return Outcome::default();
        }

        let below = self.diff_children(a, b);
        let evaluation = self.heuristic.assess(a, b, &below);

        // Text and comment changes have no locator; they surface as a
        // change of their parent
        let unaddressable = below.iter().any(|change| !change.is_addressable());
        let mut changes = Vec::new();
        if evaluation.verdict != Verdict::Identical
            && (evaluation.differences.intersects(Differences::LOCAL) || unaddressable)
        {
            changes.push(Change::changed(a, b));
        }
        changes.extend(below.into_iter().filter(Change::is_addressable));

        Outcome {
            verdict: evaluation.verdict,
            changes,
        }
    }

    /// Aligns the children of a pair and collects the changes beneath it,
    /// in document order.
    fn diff_children(&mut self, a: &NodeRef, b: &NodeRef) -> Vec<Change> {
        let children_a = self.participating_children(a);
        let children_b = self.participating_children(b);
        let alignment = align(children_a.len(), children_b.len(), |i, j| {
            self.matchable(&children_a[i], &children_b[j])
        });

        let mut changes = Vec::new();
        for step in alignment.steps(children_a.len(), children_b.len()) {
            match step {
                Step::Gap { removed, added } => {
                    for i in removed {
                        changes.push(Change::removed(a, b, &children_a[i]));
                    }
                    for j in added {
                        changes.push(Change::added(a, b, &children_b[j]));
                    }
                }
                Step::Pair(i, j) => {
                    let (x, y) = (&children_a[i], &children_b[j]);
                    if x.borrow().is_element() && y.borrow().is_element() {
                        changes.extend(self.diff_pair(x, y).changes.iter().cloned());
                    }
                }
            }
        }
        changes
    }

    fn participating_children(&self, node: &NodeRef) -> Vec<NodeRef> {
        node.borrow()
            .children()
            .iter()
            .filter(|child| self.digests.participates(child))
            .cloned()
            .collect()
    }

    /// Elements pair up unless the heuristic rules them different nodes;
    /// everything else pairs up only when equal.
    fn matchable(&mut self, x: &NodeRef, y: &NodeRef) -> bool {
        if x.borrow().is_element() && y.borrow().is_element() {
            self.diff_pair(x, y).verdict.is_match()
        } else {
            self.digests.digest(x) == self.digests.digest(y)
        }
    }
}

/// Compares two documents given as markup.
pub fn compare(before: &str, after: &str, options: &CompareOptions) -> Result<Comparison> {
    let before = parse_str(before)?;
    let after = parse_str(after)?;
    Ok(compare_trees(&before, &after, options))
}

/// Compares two markup files.
pub fn compare_files<P, Q>(before: P, after: Q, options: &CompareOptions) -> Result<Comparison>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let before = parse_file(before)?;
    let after = parse_file(after)?;
    Ok(compare_trees(&before, &after, options))
}

/// Compares two parsed documents.
pub fn compare_trees(before: &NodeRef, after: &NodeRef, options: &CompareOptions) -> Comparison {
    Differ::new(*options).compare_trees(before, after)
}
