//! Node locators.
//!
//! A locator is a CSS-like selector naming one node of a document, built
//! from one segment per ancestor level starting at the document root:
//!
//! ```text
//! :root > body > div#content > p.note:nth-of-type(2)
//! ```
//!
//! Each segment is `tag#id` when the element has an id, otherwise
//! `tag.class1.class2` or plain `tag`, followed by `:nth-of-type(k)` when
//! another element sibling would match the same segment. Feeding a
//! locator back through [`resolve`] yields the node it was made from.
//! Only elements and the root are addressable.

mod selector;

pub use selector::Selector;

use std::fmt;

use serde::Serialize;

use crate::constants::{ROOT_MARKER, SEGMENT_SEPARATOR};
use crate::error::Result;
use crate::node::{same_node, NodeInner, NodeRef};
use selector::{escape_ident, nth_of_type, Compound};

/// A round-trippable node address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    /// The locator of the document root.
    pub fn root() -> Self {
        Locator(ROOT_MARKER.to_string())
    }

    /// Returns the locator text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this is the document root's locator.
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_MARKER
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Locator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> String {
        locator.0
    }
}

impl PartialEq<str> for Locator {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Locator {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Returns the locator of `node`, or `None` if the node is not addressable.
///
/// Text, comments, CDATA and the other non-element constructs have no
/// locator.
pub fn locate(node: &NodeRef) -> Option<Locator> {
    {
        let inner = node.borrow();
        if inner.is_root() {
            return Some(Locator::root());
        }
        if !inner.content().is_addressable() {
            return None;
        }
    }

    let mut segments = vec![segment(node)?];
    for ancestor in NodeInner::ancestors_of_ref(node) {
        if ancestor.borrow().is_root() {
            segments.push(ROOT_MARKER.to_string());
        } else {
            segments.push(segment(&ancestor)?);
        }
    }
    segments.reverse();
    Some(Locator(segments.join(SEGMENT_SEPARATOR)))
}

/// Builds the segment naming `node` among its siblings.
fn segment(node: &NodeRef) -> Option<String> {
    let inner = node.borrow();
    let element = inner.element()?;
    let tag = element.name();

    if let Some(id) = element.id() {
        return Some(format!("{}#{}", escape_ident(tag), escape_ident(id)));
    }

    let classes = element.classes();
    let mut segment = escape_ident(tag);
    for class in &classes {
        segment.push('.');
        segment.push_str(&escape_ident(class));
    }

    // Disambiguate against every sibling the bare segment would also select
    let compound = Compound::element(tag, &classes);
    let ambiguous = inner.parent().is_some_and(|parent| {
        let parent = parent.borrow();
        let collides = parent
            .children()
            .iter()
            .any(|sibling| !same_node(sibling, node) && compound.matches(sibling));
        collides
    });
    drop(inner);

    if ambiguous {
        let position = nth_of_type(node)?;
        segment.push_str(&format!(":nth-of-type({})", position));
    }
    Some(segment)
}

/// Returns every node under `root` that `selector` matches, in document order.
pub fn select(root: &NodeRef, selector: &str) -> Result<Vec<NodeRef>> {
    Ok(Selector::parse(selector)?.select(root))
}

/// Returns the node `selector` names, or `None` unless exactly one node
/// matches.
pub fn resolve(root: &NodeRef, selector: &str) -> Result<Option<NodeRef>> {
    let mut found = select(root, selector)?;
    if found.len() == 1 {
        Ok(found.pop())
    } else {
        Ok(None)
    }
}
