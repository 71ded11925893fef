//! Content types for tree nodes.
//!
//! This module provides `NodeContent`, the tagged union over every kind of
//! node a parsed document can contain.

use indexmap::IndexMap;

/// Ordered attribute mapping: name to raw value, in declaration order.
pub type Attributes = IndexMap<String, String>;

/// Represents the content of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeContent {
    /// The synthetic document root.
    Root,
    /// An element with a name and attributes.
    Element(Element),
    /// Character data.
    Text(Text),
    /// A comment.
    Comment(Comment),
    /// A CDATA section.
    CData(Text),
    /// A processing instruction, kept verbatim.
    ProcessingInstruction(String),
    /// A doctype declaration, kept verbatim.
    Doctype(String),
}

impl NodeContent {
    /// Returns true if this is the document root.
    pub fn is_root(&self) -> bool {
        matches!(self, NodeContent::Root)
    }

    /// Returns true if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self, NodeContent::Element(_))
    }

    /// Returns true if a locator can be produced for nodes with this content.
    pub fn is_addressable(&self) -> bool {
        matches!(self, NodeContent::Root | NodeContent::Element(_))
    }

    /// Returns a reference to the element, if this is an element node.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            NodeContent::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the character data of text and CDATA nodes.
    pub fn as_text(&self) -> Option<&Text> {
        match self {
            NodeContent::Text(t) | NodeContent::CData(t) => Some(t),
            _ => None,
        }
    }

    /// Short human readable kind name, used in logs and reports.
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeContent::Root => "root",
            NodeContent::Element(_) => "element",
            NodeContent::Text(_) => "text",
            NodeContent::Comment(_) => "comment",
            NodeContent::CData(_) => "cdata",
            NodeContent::ProcessingInstruction(_) => "processing-instruction",
            NodeContent::Doctype(_) => "doctype",
        }
    }
}

/// An element with a name and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name, lowercased by the parser.
    name: String,
    /// Attributes in declaration order.
    attributes: Attributes,
}

impl Element {
    /// Creates a new element with the given name and attributes.
    pub fn new(name: impl Into<String>, attributes: Attributes) -> Self {
        Element {
            name: name.into(),
            attributes,
        }
    }

    /// Returns the tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attributes.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns the raw value of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the `id` attribute, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.attribute("id").filter(|id| !id.is_empty())
    }

    /// Returns the classes of the `class` attribute in declared order.
    pub fn classes(&self) -> Vec<&str> {
        self.attribute("class")
            .map(|class| class.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Returns true if the element carries the given class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().contains(&class)
    }
}

/// Character data of a text or CDATA node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    text: String,
}

impl Text {
    /// Creates a new text node from a string.
    pub fn new(text: impl Into<String>) -> Self {
        Text { text: text.into() }
    }

    /// Returns the raw text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Appends character data, used when the tokenizer splits a run.
    pub(crate) fn push_str(&mut self, more: &str) {
        self.text.push_str(more);
    }

    /// Returns true if the text holds nothing but whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }

    /// Returns the text trimmed, with whitespace runs collapsed to one space.
    pub fn normalized(&self) -> String {
        normalize_whitespace(&self.text)
    }
}

/// A comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    text: String,
}

impl Comment {
    /// Creates a new comment.
    pub fn new(text: impl Into<String>) -> Self {
        Comment { text: text.into() }
    }

    /// Returns the comment body.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Trims `text` and collapses every internal whitespace run to a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
