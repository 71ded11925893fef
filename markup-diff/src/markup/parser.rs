//! Lenient markup parser that builds node trees.
//!
//! This parser uses quick-xml's streaming API but relaxes it towards HTML:
//! void elements never take children, end tags close up to the nearest open
//! element with the same name, stray end tags are dropped and attributes may
//! be unquoted or valueless.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::constants::is_void_element;
use crate::error::{Error, Result};
use crate::node::{
    new_node, new_root, Attributes, Comment, Element, NodeContent, NodeInner, NodeRef, Text,
};

/// Markup parser that builds node trees.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupParser;

impl MarkupParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        MarkupParser
    }

    /// Parses markup from a string.
    pub fn parse_str(&self, markup: &str) -> Result<NodeRef> {
        let mut reader = Reader::from_str(markup);
        Self::configure(&mut reader);
        self.parse_reader(&mut reader)
    }

    /// Parses markup from a file.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<NodeRef> {
        let file = File::open(path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));
        Self::configure(&mut reader);
        self.parse_reader(&mut reader)
    }

    fn configure<R>(reader: &mut Reader<R>) {
        let config = reader.config_mut();
        // Whitespace is significant for text contents; keep it all
        config.trim_text(false);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.allow_dangling_amp = true;
    }

    /// Parses markup from a quick-xml Reader.
    fn parse_reader<R: BufRead>(&self, reader: &mut Reader<R>) -> Result<NodeRef> {
        let root = new_root();
        let mut node_stack: Vec<NodeRef> = vec![root.clone()];
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                Error::Parse(format!("{} (at byte {})", e, reader.buffer_position()))
            })?;
            let parent = match node_stack.last() {
                Some(parent) => parent.clone(),
                None => root.clone(),
            };

            match event {
                Event::Start(ref e) => {
                    let element = self.parse_element(e, reader)?;
                    let void = is_void_element(element.name());
                    let node = new_node(NodeContent::Element(element));
                    NodeInner::add_child_to_ref(&parent, node.clone());
                    if !void {
                        node_stack.push(node);
                    }
                }
                Event::Empty(ref e) => {
                    let element = self.parse_element(e, reader)?;
                    let node = new_node(NodeContent::Element(element));
                    NodeInner::add_child_to_ref(&parent, node);
                }
                Event::End(ref e) => {
                    let name = decode(reader, e.name().as_ref())?.to_ascii_lowercase();
                    // Index 0 is the root, which no end tag can close
                    let open = node_stack
                        .iter()
                        .rposition(|n| n.borrow().name() == Some(name.as_str()));
                    if let Some(index) = open.filter(|&i| i > 0) {
                        node_stack.truncate(index);
                    }
                }
                Event::Text(ref e) => {
                    let text = decode(reader, e.as_ref())?;
                    append_text(&parent, &text);
                }
                Event::GeneralRef(ref e) => {
                    let resolved = match e.resolve_char_ref() {
                        Ok(Some(c)) => c.to_string(),
                        _ => {
                            let name = decode(reader, e.as_ref())?;
                            match resolve_predefined_entity(&name) {
                                Some(value) => value.to_string(),
                                // Unknown (HTML) entities are kept verbatim
                                None => format!("&{};", name),
                            }
                        }
                    };
                    append_text(&parent, &resolved);
                }
                Event::CData(ref e) => {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    NodeInner::add_child_to_ref(
                        &parent,
                        new_node(NodeContent::CData(Text::new(text))),
                    );
                }
                Event::Comment(ref e) => {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    NodeInner::add_child_to_ref(
                        &parent,
                        new_node(NodeContent::Comment(Comment::new(text))),
                    );
                }
                Event::PI(ref e) => {
                    let body = String::from_utf8_lossy(e.as_ref()).into_owned();
                    NodeInner::add_child_to_ref(
                        &parent,
                        new_node(NodeContent::ProcessingInstruction(body)),
                    );
                }
                Event::DocType(ref e) => {
                    let body = String::from_utf8_lossy(e.as_ref()).trim().to_string();
                    NodeInner::add_child_to_ref(&parent, new_node(NodeContent::Doctype(body)));
                }
                Event::Decl(_) => {
                    // The XML declaration carries nothing worth comparing
                }
                Event::Eof => break,
            }
        }

        Ok(root)
    }

    /// Parses an element's name and attributes.
    fn parse_element<R>(&self, e: &BytesStart, reader: &Reader<R>) -> Result<Element> {
        let name = decode(reader, e.name().as_ref())?.to_ascii_lowercase();

        let mut attributes = Attributes::new();
        for attr_result in e.html_attributes().with_checks(false) {
            let attr = attr_result.map_err(|e| Error::Parse(format!("attribute error: {}", e)))?;
            let key = decode(reader, attr.key.as_ref())?.to_ascii_lowercase();
            let value = match attr.unescape_value() {
                Ok(value) => value.into_owned(),
                // HTML entities quick-xml does not know about stay as written
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            // First occurrence wins, as in HTML
            attributes.entry(key).or_insert(value);
        }

        Ok(Element::new(name, attributes))
    }
}

fn decode<R>(reader: &Reader<R>, bytes: &[u8]) -> Result<String> {
    reader
        .decoder()
        .decode(bytes)
        .map(|text| text.into_owned())
        .map_err(|e| Error::Parse(e.to_string()))
}

/// Appends character data to `parent`, merging with a trailing text child.
fn append_text(parent: &NodeRef, text: &str) {
    if text.is_empty() {
        return;
    }
    let last = parent.borrow().children().last().cloned();
    if let Some(last) = last {
        if let NodeContent::Text(existing) = last.borrow_mut().content_mut() {
            existing.push_str(text);
            return;
        }
    }
    NodeInner::add_child_to_ref(parent, new_node(NodeContent::Text(Text::new(text))));
}

/// Parses markup from a file.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<NodeRef> {
    MarkupParser::new().parse_file(path)
}

/// Parses markup from a string.
pub fn parse_str(markup: &str) -> Result<NodeRef> {
    MarkupParser::new().parse_str(markup)
}
