//! Node-similarity judgement.
//!
//! This module decides whether two candidate nodes are the same node that
//! changed, or two unrelated nodes. The judgement is a weighted sum over a
//! fixed set of components (see [`Component`]); [`Weights`] scales each one.

mod heuristic;
mod weights;

pub use heuristic::{Contribution, Evaluation, Heuristic};
pub use weights::Weights;

use bitflags::bitflags;

use crate::constants::{
    ATTRIBUTE_WEIGHTS, CONTENTS_WEIGHTS, ID_WEIGHTS, NAME_WEIGHTS, TEXT_CONTENTS_WEIGHTS,
};

/// Outcome of comparing a candidate node pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// No observable difference.
    #[default]
    Identical,
    /// The same logical node, with different contents.
    SameButDifferent,
    /// Two independent nodes: one removed, one added.
    NotTheSameNode,
}

impl Verdict {
    /// Returns true if the pair may be aligned as one node.
    pub fn is_match(self) -> bool {
        !matches!(self, Verdict::NotTheSameNode)
    }
}

bitflags! {
    /// Components that observed a difference between two nodes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Differences: u8 {
        /// Tag names differ.
        const NAME = 1;
        /// Id attributes differ.
        const ID = 1 << 1;
        /// At least one other attribute differs.
        const ATTRIBUTES = 1 << 2;
        /// At least one change happened below the nodes.
        const CONTENTS = 1 << 3;
        /// Descendant text differs.
        const TEXT_CONTENTS = 1 << 4;
        /// Differences carried by the nodes themselves rather than their subtrees.
        const LOCAL = Self::NAME.bits() | Self::ID.bits() | Self::ATTRIBUTES.bits();
    }
}

/// One component of the node-similarity heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// Tag name.
    Name,
    /// The `id` super-attribute.
    Id,
    /// Every other attribute, as an aggregate.
    Attributes,
    /// Structural churn among the children.
    Contents,
    /// Normalized descendant text.
    TextContents,
}

impl Component {
    /// All components, in evaluation order.
    pub const ALL: [Component; 5] = [
        Component::Name,
        Component::Id,
        Component::Attributes,
        Component::Contents,
        Component::TextContents,
    ];

    /// Base weights as `(same, differs)`.
    pub fn base_weights(self) -> (f64, f64) {
        match self {
            Component::Name => NAME_WEIGHTS,
            Component::Id => ID_WEIGHTS,
            Component::Attributes => ATTRIBUTE_WEIGHTS,
            Component::Contents => CONTENTS_WEIGHTS,
            Component::TextContents => TEXT_CONTENTS_WEIGHTS,
        }
    }

    /// The configured multiplier for this component.
    pub fn multiplier(self, weights: &Weights) -> f64 {
        match self {
            Component::Name => weights.name(),
            Component::Id => weights.id(),
            Component::Attributes => weights.attributes(),
            Component::Contents => weights.contents(),
            Component::TextContents => weights.text_contents(),
        }
    }

    /// The flag raised when this component observes a difference.
    pub fn flag(self) -> Differences {
        match self {
            Component::Name => Differences::NAME,
            Component::Id => Differences::ID,
            Component::Attributes => Differences::ATTRIBUTES,
            Component::Contents => Differences::CONTENTS,
            Component::TextContents => Differences::TEXT_CONTENTS,
        }
    }

    /// Signed, weighted score for a same / significantly-different outcome.
    pub fn score(self, differs_significantly: bool, weights: &Weights) -> f64 {
        let (same, differs) = self.base_weights();
        let base = if differs_significantly { differs } else { same };
        base * self.multiplier(weights)
    }
}
