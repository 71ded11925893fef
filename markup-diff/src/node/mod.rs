//! Node structures for document tree representation.
//!
//! A parsed document is a tree of reference-counted nodes. Each node owns its
//! children and holds a weak reference to its parent, so a node handed out in
//! a change report can still walk up to its document root.

mod content;

pub use content::{normalize_whitespace, Attributes, Comment, Element, NodeContent, Text};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A reference-counted pointer to a node.
pub type NodeRef = Rc<RefCell<NodeInner>>;

/// A weak pointer to a node.
pub type WeakNodeRef = Weak<RefCell<NodeInner>>;

/// The inner data of a node in the document tree.
///
/// Each node has:
/// - 0 or more children
/// - content (root, element, text, comment, ...)
/// - a parent (except for the root)
/// - a position among its siblings
#[derive(Debug)]
pub struct NodeInner {
    /// Child nodes.
    children: Vec<NodeRef>,
    /// Content of this node.
    content: NodeContent,
    /// Weak reference to parent node.
    parent: WeakNodeRef,
    /// Zero-based position among siblings (-1 for a detached node).
    child_pos: i32,
}

impl NodeInner {
    /// Creates a detached node with the given content.
    pub fn new(content: NodeContent) -> Self {
        NodeInner {
            children: Vec::new(),
            content,
            parent: Weak::new(),
            child_pos: -1,
        }
    }

    /// Returns the content of this node.
    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    /// Returns a mutable reference to the content.
    pub(crate) fn content_mut(&mut self) -> &mut NodeContent {
        &mut self.content
    }

    /// Returns the element content, if this is an element.
    pub fn element(&self) -> Option<&Element> {
        self.content.as_element()
    }

    /// Returns the tag name, if this is an element.
    pub fn name(&self) -> Option<&str> {
        self.element().map(Element::name)
    }

    /// Returns true if this is the synthetic document root.
    pub fn is_root(&self) -> bool {
        self.content.is_root()
    }

    /// Returns true if this is an element node.
    pub fn is_element(&self) -> bool {
        self.content.is_element()
    }

    /// Returns the number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns a reference to the child at the given index.
    pub fn child(&self, index: usize) -> Option<&NodeRef> {
        self.children.get(index)
    }

    /// Returns the children as a slice.
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// Returns the parent, if it is still alive.
    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.upgrade()
    }

    /// Returns the child position (0-based index among siblings, -1 when detached).
    pub fn child_pos(&self) -> i32 {
        self.child_pos
    }
}

/// Helper functions that work with NodeRef.
impl NodeInner {
    /// Adds a child node. Must be called on the NodeRef wrapper.
    pub fn add_child_to_ref(parent_ref: &NodeRef, child_ref: NodeRef) {
        {
            let mut child = child_ref.borrow_mut();
            child.parent = Rc::downgrade(parent_ref);
            child.child_pos = parent_ref.borrow().children.len() as i32;
        }
        parent_ref.borrow_mut().children.push(child_ref);
    }

    /// Returns the ancestors of a node, nearest first.
    pub fn ancestors_of_ref(node_ref: &NodeRef) -> Vec<NodeRef> {
        let mut ancestors = Vec::new();
        let mut current = node_ref.borrow().parent();
        while let Some(parent) = current {
            current = parent.borrow().parent();
            ancestors.push(parent);
        }
        ancestors
    }
}

/// Creates a new node reference.
pub fn new_node(content: NodeContent) -> NodeRef {
    Rc::new(RefCell::new(NodeInner::new(content)))
}

/// Creates a new document root.
pub fn new_root() -> NodeRef {
    new_node(NodeContent::Root)
}

/// Creates a new element node.
pub fn new_element(name: impl Into<String>, attributes: Attributes) -> NodeRef {
    new_node(NodeContent::Element(Element::new(name, attributes)))
}

/// Creates a new text node.
pub fn new_text(text: impl Into<String>) -> NodeRef {
    new_node(NodeContent::Text(Text::new(text)))
}

/// Returns true if both references point at the same node.
pub fn same_node(a: &NodeRef, b: &NodeRef) -> bool {
    Rc::ptr_eq(a, b)
}

/// Identity key of a node, for caches keyed by node.
///
/// Keys are unique among live nodes only; a cache must not outlive the
/// trees it was filled from.
pub fn node_key(node: &NodeRef) -> usize {
    Rc::as_ptr(node) as usize
}

/// Returns the concatenated character data of a node and all its descendants.
///
/// Text and CDATA contribute; comments, processing instructions and doctypes
/// do not.
pub fn text_content(node: &NodeRef) -> String {
    let mut out = String::new();
    for descendant in DfsTreeIterator::new(node.clone()) {
        if let Some(text) = descendant.borrow().content().as_text() {
            out.push_str(text.text());
        }
    }
    out
}

/// Iterator for traversing a tree in depth-first pre-order.
pub struct DfsTreeIterator {
    /// Stack of (node, next_child_index) pairs for iterating.
    stack: Vec<(NodeRef, usize)>,
}

impl DfsTreeIterator {
    /// Creates a new DFS iterator starting at the given root.
    pub fn new(root: NodeRef) -> Self {
        DfsTreeIterator {
            stack: vec![(root, 0)],
        }
    }
}

impl Iterator for DfsTreeIterator {
    type Item = NodeRef;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, child_idx)) = self.stack.pop() {
            let next_child = node.borrow().child(child_idx).cloned();

            if child_idx == 0 {
                // First visit: yield the node, then descend
                if let Some(child) = next_child {
                    self.stack.push((node.clone(), 1));
                    self.stack.push((child, 0));
                }
                return Some(node);
            } else if let Some(child) = next_child {
                self.stack.push((node, child_idx + 1));
                self.stack.push((child, 0));
            }
        }
        None
    }
}
