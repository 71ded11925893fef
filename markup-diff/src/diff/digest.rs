//! Subtree digests.
//!
//! Two subtrees with equal digests compare as identical without running
//! the heuristic. The digest covers what a comparison looks at: tag names,
//! canonicalized attributes in name order, the children that take part in
//! alignment, and for elements the normalized descendant text the
//! heuristic reads.

use md5::{Digest, Md5};
use rustc_hash::FxHashMap;

use crate::measure::canonicalize_attribute;
use crate::node::{node_key, normalize_whitespace, text_content, NodeContent, NodeInner, NodeRef};

/// MD5 digest of a canonicalized subtree.
pub(crate) type SubtreeDigest = [u8; 16];

/// Computes and caches subtree digests by node.
#[derive(Debug, Default)]
pub(crate) struct DigestCache {
    ignore_comments: bool,
    digests: FxHashMap<usize, SubtreeDigest>,
}

impl DigestCache {
    pub fn new(ignore_comments: bool) -> Self {
        DigestCache {
            ignore_comments,
            digests: FxHashMap::default(),
        }
    }

    /// Forgets every cached digest.
    pub fn clear(&mut self) {
        self.digests.clear();
    }

    /// Returns true if `node` takes part in sibling alignment.
    pub fn participates(&self, node: &NodeRef) -> bool {
        participates(node, self.ignore_comments)
    }

    /// Returns the digest of the subtree rooted at `node`.
    pub fn digest(&mut self, node: &NodeRef) -> SubtreeDigest {
        let key = node_key(node);
        if let Some(digest) = self.digests.get(&key) {
            return *digest;
        }

        let mut hasher = Md5::new();
        {
            let inner = node.borrow();
            match inner.content() {
                NodeContent::Root => hasher.update(b"R"),
                NodeContent::Element(element) => {
                    hasher.update(b"E");
                    update_field(&mut hasher, element.name());

                    let mut names: Vec<&String> = element.attributes().keys().collect();
                    names.sort();
                    for name in names {
                        let value = canonicalize_attribute(element.attribute(name));
                        update_field(&mut hasher, name);
                        update_field(&mut hasher, value.as_deref().unwrap_or_default());
                    }
                    update_field(&mut hasher, &normalize_whitespace(&text_content(node)));
                }
                NodeContent::Text(text) => {
                    hasher.update(b"T");
                    update_field(&mut hasher, &separated_text(&inner, text.text()));
                }
                NodeContent::CData(text) => {
                    hasher.update(b"D");
                    update_field(&mut hasher, &text.normalized());
                }
                NodeContent::Comment(comment) => {
                    hasher.update(b"C");
                    update_field(&mut hasher, comment.text());
                }
                NodeContent::ProcessingInstruction(body) => {
                    hasher.update(b"P");
                    update_field(&mut hasher, body);
                }
                NodeContent::Doctype(body) => {
                    hasher.update(b"!");
                    update_field(&mut hasher, body);
                }
            }
        }

        let children: Vec<NodeRef> = node
            .borrow()
            .children()
            .iter()
            .filter(|child| self.participates(child))
            .cloned()
            .collect();
        hasher.update((children.len() as u64).to_le_bytes());
        for child in &children {
            hasher.update(self.digest(child));
        }

        let digest: SubtreeDigest = hasher.finalize().into();
        self.digests.insert(key, digest);
        digest
    }
}

/// Text of a text node with whitespace runs collapsed. Edge whitespace is
/// kept as one space where it separates the node from a sibling, and
/// dropped at the start or end of the parent.
fn separated_text(node: &NodeInner, text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                collapsed.push(' ');
            }
            in_space = true;
        } else {
            collapsed.push(c);
            in_space = false;
        }
    }

    let first = node.child_pos() <= 0;
    let last = match node.parent() {
        Some(parent) => {
            let count = parent.borrow().child_count();
            node.child_pos() + 1 >= count as i32
        }
        None => true,
    };
    let mut separated = collapsed.as_str();
    if first {
        separated = separated.trim_start();
    }
    if last {
        separated = separated.trim_end();
    }
    separated.to_string()
}

/// Length-prefixed so that adjacent fields cannot run together.
fn update_field(hasher: &mut Md5, field: &str) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

/// Returns true if `node` takes part in sibling alignment.
///
/// Elements, CDATA and text with non-whitespace content always do; comments
/// only when they are compared.
pub(crate) fn participates(node: &NodeRef, ignore_comments: bool) -> bool {
    match node.borrow().content() {
        NodeContent::Element(_) | NodeContent::CData(_) => true,
        NodeContent::Text(text) => !text.is_whitespace(),
        NodeContent::Comment(_) => !ignore_comments,
        NodeContent::Root | NodeContent::ProcessingInstruction(_) | NodeContent::Doctype(_) => {
            false
        }
    }
}
