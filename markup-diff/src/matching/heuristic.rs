//! Node-similarity heuristic.
//!
//! Judges a candidate pair of nodes from five independent components. Each
//! component contributes `(same | differs) * multiplier` to a similarity
//! score and may flag the pair as different. Unflagged pairs are identical;
//! flagged pairs are the same node when the score is non-negative.
//!
//! The heuristic never recurses: the changes already found among the
//! children are handed in by the caller, which keeps it a pure function of
//! its inputs.

use tracing::trace;

use super::{Component, Differences, Verdict, Weights};
use crate::constants::{ATTRIBUTE_DIFF_RATIO, CONTENTS_DIFF_RATIO};
use crate::diff::{Change, ChangeType};
use crate::measure::{attribute_values_differ, TextDrift};
use crate::node::{normalize_whitespace, same_node, text_content, Attributes, NodeInner, NodeRef};

/// What one component observed.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Signal {
    /// The difference is large enough to count against the pair.
    significant: bool,
    /// Any difference at all was observed.
    differs: bool,
}

impl Signal {
    fn binary(differs: bool) -> Self {
        Signal {
            significant: differs,
            differs,
        }
    }
}

/// The part one component played in an evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    /// The component.
    pub component: Component,
    /// Whether the component judged the nodes significantly different.
    pub differs_significantly: bool,
    /// Whether the component flagged the pair as different.
    pub flagged: bool,
    /// Signed, weighted score added to the similarity.
    pub score: f64,
}

/// Full result of evaluating a node pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// The verdict.
    pub verdict: Verdict,
    /// Sum of all contributions.
    pub similarity: f64,
    /// Components that flagged a difference.
    pub differences: Differences,
    /// Contributions of the components that applied, in evaluation order.
    pub contributions: Vec<Contribution>,
}

impl Evaluation {
    /// Returns the contribution of a component, if it applied.
    pub fn contribution(&self, component: Component) -> Option<&Contribution> {
        self.contributions
            .iter()
            .find(|c| c.component == component)
    }
}

/// The node-similarity heuristic, bound to one set of weights.
#[derive(Debug, Clone, Copy, Default)]
pub struct Heuristic {
    weights: Weights,
}

impl Heuristic {
    /// Creates a heuristic using the given weights.
    pub fn new(weights: Weights) -> Self {
        Heuristic { weights }
    }

    /// Returns the weights in use.
    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Decides whether `a` and `b` are the same node.
    ///
    /// `child_changes` are the changes already found beneath the pair.
    pub fn evaluate(&self, a: &NodeRef, b: &NodeRef, child_changes: &[Change]) -> Verdict {
        self.assess(a, b, child_changes).verdict
    }

    /// Like [`Heuristic::evaluate`], returning the full breakdown.
    pub fn assess(&self, a: &NodeRef, b: &NodeRef, child_changes: &[Change]) -> Evaluation {
        let na = a.borrow();
        let nb = b.borrow();

        let signals = [
            (Component::Name, Some(compare_names(&na, &nb))),
            (Component::Id, compare_ids(&na, &nb)),
            (Component::Attributes, compare_attributes(&na, &nb)),
            (Component::Contents, compare_contents(a, b, child_changes)),
            (Component::TextContents, self.compare_text(a, b)),
        ];

        let mut differences = Differences::empty();
        let mut contributions = Vec::with_capacity(signals.len());
        for (component, signal) in signals {
            let Some(signal) = signal else { continue };
            let flagged = signal.differs && component.multiplier(&self.weights) > 0.0;
            if flagged {
                differences |= component.flag();
            }
            contributions.push(Contribution {
                component,
                differs_significantly: signal.significant,
                flagged,
                score: component.score(signal.significant, &self.weights),
            });
        }

        let similarity: f64 = contributions.iter().map(|c| c.score).sum();
        let verdict = if differences.is_empty() {
            Verdict::Identical
        } else if similarity >= 0.0 {
            Verdict::SameButDifferent
        } else {
            Verdict::NotTheSameNode
        };

        trace!(
            a = na.name().unwrap_or(na.content().kind_name()),
            b = nb.name().unwrap_or(nb.content().kind_name()),
            similarity,
            ?differences,
            ?verdict,
            "evaluated node pair"
        );

        Evaluation {
            verdict,
            similarity,
            differences,
            contributions,
        }
    }

    /// Normalized descendant text; skipped when either node is the root.
    fn compare_text(&self, a: &NodeRef, b: &NodeRef) -> Option<Signal> {
        if a.borrow().is_root() || b.borrow().is_root() {
            return None;
        }
        let text_a = normalize_whitespace(&text_content(a));
        let text_b = normalize_whitespace(&text_content(b));
        if text_a == text_b {
            return None;
        }

        let drift = TextDrift::between(&text_a, &text_b);
        Some(Signal {
            significant: drift.ratio() > self.weights.text_contents_threshold(),
            differs: drift.changed > 0,
        })
    }
}

fn attributes_of(node: &NodeInner) -> Option<&Attributes> {
    node.element().map(|e| e.attributes())
}

fn attribute<'a>(node: &'a NodeInner, name: &str) -> Option<&'a str> {
    attributes_of(node)
        .and_then(|attrs| attrs.get(name))
        .map(String::as_str)
}

/// Tag names; the root compares equal only to the root.
fn compare_names(a: &NodeInner, b: &NodeInner) -> Signal {
    Signal::binary(a.name() != b.name())
}

/// The id super-attribute, when either node declares one.
fn compare_ids(a: &NodeInner, b: &NodeInner) -> Option<Signal> {
    let declares_id = |n: &NodeInner| attributes_of(n).is_some_and(|attrs| attrs.contains_key("id"));
    if !declares_id(a) && !declares_id(b) {
        return None;
    }
    Some(Signal::binary(attribute_values_differ(
        attribute(a, "id"),
        attribute(b, "id"),
    )))
}

/// Every attribute other than id, judged by majority.
fn compare_attributes(a: &NodeInner, b: &NodeInner) -> Option<Signal> {
    let mut names: Vec<&str> = Vec::new();
    for attrs in [attributes_of(a), attributes_of(b)].into_iter().flatten() {
        for name in attrs.keys() {
            if name != "id" && !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
    }
    if names.is_empty() {
        return None;
    }

    let differing = names
        .iter()
        .filter(|name| attribute_values_differ(attribute(a, name), attribute(b, name)))
        .count();
    let ratio = differing as f64 / names.len() as f64;

    Some(Signal {
        significant: ratio > ATTRIBUTE_DIFF_RATIO,
        differs: differing > 0,
    })
}

/// Churn among the children.
fn compare_contents(a: &NodeRef, b: &NodeRef, child_changes: &[Change]) -> Option<Signal> {
    let possible = a.borrow().child_count().max(b.borrow().child_count());
    if possible == 0 {
        return None;
    }

    let (mut added, mut removed, mut changed) = (0usize, 0usize, 0usize);
    for change in child_changes {
        let under_a = change
            .before
            .parent
            .as_ref()
            .is_some_and(|p| same_node(p, a));
        let under_b = change
            .after
            .parent
            .as_ref()
            .is_some_and(|p| same_node(p, b));
        if !(under_a || under_b) {
            continue;
        }
        match change.change_type {
            ChangeType::Added => added += 1,
            ChangeType::Removed => removed += 1,
            ChangeType::Changed => changed += 1,
        }
    }

    // A replaced child shows up as one removal plus one addition
    let total = added.max(removed) + changed;
    Some(Signal {
        significant: total as f64 / possible as f64 > CONTENTS_DIFF_RATIO,
        differs: !child_changes.is_empty(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_str;

    /// Parses a fragment and returns its first top-level node.
    fn node(markup: &str) -> NodeRef {
        let root = parse_str(markup).unwrap();
        let first = root.borrow().children()[0].clone();
        first
    }

    fn child(node: &NodeRef, index: usize) -> NodeRef {
        node.borrow().children()[index].clone()
    }

    fn evaluate(a: &NodeRef, b: &NodeRef, changes: &[Change]) -> Verdict {
        Heuristic::default().evaluate(a, b, changes)
    }

    #[test]
    fn test_node_is_identical_to_itself() {
        for markup in [
            "<p>text</p>",
            r#"<div id="x" class="a b"><b>1</b> <i>2</i></div>"#,
            "<br>",
        ] {
            let a = node(markup);
            assert_eq!(evaluate(&a, &a, &[]), Verdict::Identical, "{}", markup);
        }
    }

    #[test]
    fn test_equal_copies_are_identical() {
        let a = node(r#"<p class="x">Hello   world</p>"#);
        let b = node(r#"<p class=" x ">Hello world</p>"#);
        assert_eq!(evaluate(&a, &b, &[]), Verdict::Identical);
    }

    #[test]
    fn test_id_dominance() {
        let a = node(r#"<section id="main" class="wide" title="t">Old words here</section>"#);
        let b = node(r#"<section id="main" class="narrow" title="t">New text entirely</section>"#);
        let eval = Heuristic::default().assess(&a, &b, &[]);
        assert_eq!(eval.verdict, Verdict::SameButDifferent);
        assert_eq!(eval.contribution(Component::Id).unwrap().score, 45.0);
    }

    #[test]
    fn test_id_outweighs_replaced_children() {
        let a = node(r#"<div id="content"><p>one</p></div>"#);
        let b = node(r#"<div id="content"><ul>two</ul></div>"#);
        let changes = [
            Change::removed(&a, &b, &child(&a, 0)),
            Change::added(&a, &b, &child(&b, 0)),
        ];
        // name +10, id +45, contents -11, text -5
        let eval = Heuristic::default().assess(&a, &b, &changes);
        assert_eq!(eval.similarity, 39.0);
        assert_eq!(eval.verdict, Verdict::SameButDifferent);
    }

    #[test]
    fn test_differing_ids() {
        let a = node(r#"<div id="one"></div>"#);
        let b = node(r#"<div id="two"></div>"#);
        // name +10, id -15
        let eval = Heuristic::default().assess(&a, &b, &[]);
        assert_eq!(eval.similarity, -5.0);
        assert_eq!(eval.verdict, Verdict::NotTheSameNode);
        assert!(eval.differences.contains(Differences::ID));
    }

    #[test]
    fn test_attribute_opt_out() {
        let a = node(r#"<p class="a" title="x">same</p>"#);
        let b = node(r#"<p class="b" title="y">same</p>"#);
        let weights = Weights::default().with_attributes(0.0).unwrap();
        assert_eq!(
            Heuristic::new(weights).evaluate(&a, &b, &[]),
            Verdict::Identical
        );
        assert_eq!(evaluate(&a, &b, &[]), Verdict::SameButDifferent);
    }

    #[test]
    fn test_attribute_majority_rule() {
        let base = node(r#"<a href="/x" title="t" rel="r">x</a>"#);
        let one_differs = node(r#"<a href="/y" title="t" rel="r">x</a>"#);
        let two_differ = node(r#"<a href="/y" title="u" rel="r">x</a>"#);

        let eval = Heuristic::default().assess(&base, &one_differs, &[]);
        let attrs = eval.contribution(Component::Attributes).unwrap();
        assert!(!attrs.differs_significantly);
        assert!(attrs.flagged);
        assert_eq!(attrs.score, 12.0);
        assert_eq!(eval.verdict, Verdict::SameButDifferent);

        let eval = Heuristic::default().assess(&base, &two_differ, &[]);
        let attrs = eval.contribution(Component::Attributes).unwrap();
        assert!(attrs.differs_significantly);
        assert_eq!(attrs.score, -12.0);
    }

    #[test]
    fn test_missing_attribute_counts_as_different() {
        let a = node(r#"<img src="a.png">"#);
        let b = node(r#"<img src="a.png" alt="">"#);
        let eval = Heuristic::default().assess(&a, &b, &[]);
        // 1 of 2 differ: flagged, not significant
        let attrs = eval.contribution(Component::Attributes).unwrap();
        assert!(attrs.flagged);
        assert!(!attrs.differs_significantly);
    }

    #[test]
    fn test_components_without_signal_are_skipped() {
        let a = node("<br>");
        let b = node("<br>");
        let eval = Heuristic::default().assess(&a, &b, &[]);
        let components: Vec<Component> = eval.contributions.iter().map(|c| c.component).collect();
        assert_eq!(components, vec![Component::Name]);
        assert_eq!(eval.similarity, 10.0);
    }

    #[test]
    fn test_different_tags() {
        let a = node("<b>1</b>");
        let b = node("<i>2</i>");
        let changes = [
            Change::removed(&a, &b, &child(&a, 0)),
            Change::added(&a, &b, &child(&b, 0)),
        ];
        assert_eq!(evaluate(&a, &b, &changes), Verdict::NotTheSameNode);
    }

    #[test]
    fn test_name_opt_out() {
        let a = node("<b>x</b>");
        let b = node("<strong>x</strong>");
        let weights = Weights::default().with_name(0.0).unwrap();
        assert_eq!(
            Heuristic::new(weights).evaluate(&a, &b, &[]),
            Verdict::Identical
        );
    }

    #[test]
    fn test_add_and_remove_do_not_double_count() {
        let a = node("<ul><li>1</li><li>2</li></ul>");
        let b = node("<ul><li>1</li><li>3</li></ul>");
        let changes = [
            Change::removed(&a, &b, &child(&a, 1)),
            Change::added(&a, &b, &child(&b, 1)),
        ];
        let eval = Heuristic::default().assess(&a, &b, &changes);
        let contents = eval.contribution(Component::Contents).unwrap();
        // 1 unit of churn over 2 children
        assert!(!contents.differs_significantly);
        assert!(contents.flagged);
        assert_eq!(eval.verdict, Verdict::SameButDifferent);
    }

    #[test]
    fn test_full_churn_is_significant() {
        let a = node("<ul><li>1</li></ul>");
        let b = node("<ul><li>2</li><li>3</li></ul>");
        let changes = [
            Change::removed(&a, &b, &child(&a, 0)),
            Change::added(&a, &b, &child(&b, 0)),
            Change::added(&a, &b, &child(&b, 1)),
        ];
        let eval = Heuristic::default().assess(&a, &b, &changes);
        assert!(
            eval.contribution(Component::Contents)
                .unwrap()
                .differs_significantly
        );
    }

    #[test]
    fn test_changes_elsewhere_only_flag() {
        let a = node("<div><p><b>x</b></p></div>");
        let b = node("<div><p><b>y</b></p></div>");
        let (pa, pb) = (child(&a, 0), child(&b, 0));
        // A change two levels down: not churn of `div`'s own children
        let changes = [Change::changed(&child(&pa, 0), &child(&pb, 0))];
        let eval = Heuristic::default().assess(&a, &b, &changes);
        let contents = eval.contribution(Component::Contents).unwrap();
        assert!(contents.flagged);
        assert!(!contents.differs_significantly);
        assert_eq!(contents.score, 11.0);
    }

    #[test]
    fn test_text_threshold() {
        let a = node("<p>Hello</p>");
        let small = node("<p>Hellp</p>");
        let eval = Heuristic::default().assess(&a, &small, &[]);
        let text = eval.contribution(Component::TextContents).unwrap();
        assert!(!text.differs_significantly);
        assert_eq!(text.score, 5.0);

        let strict = Heuristic::new(Weights::default().with_text_threshold(0.1).unwrap());
        let eval = strict.assess(&a, &small, &[]);
        assert_eq!(
            eval.contribution(Component::TextContents).unwrap().score,
            -5.0
        );
    }

    #[test]
    fn test_text_whitespace_is_normalized() {
        let a = node("<p>  Hello\n  world </p>");
        let b = node("<p>Hello world</p>");
        let eval = Heuristic::default().assess(&a, &b, &[]);
        assert!(eval.contribution(Component::TextContents).is_none());
    }

    #[test]
    fn test_roots_skip_text() {
        let a = parse_str("<p>one</p>").unwrap();
        let b = parse_str("<p>two</p>").unwrap();
        let eval = Heuristic::default().assess(&a, &b, &[]);
        assert!(eval.contribution(Component::TextContents).is_none());
        assert_eq!(eval.verdict, Verdict::Identical);
    }
}
