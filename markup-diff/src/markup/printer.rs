//! Markup printer that outputs node trees.
//!
//! Output is compact HTML: attributes in declaration order, void elements
//! without end tags, text and attribute values entity-encoded.

use std::io::Write;

use crate::constants::is_void_element;
use crate::node::{NodeContent, NodeRef};

/// Markup printer that outputs node trees.
pub struct MarkupPrinter<W: Write> {
    writer: W,
}

impl<W: Write> MarkupPrinter<W> {
    /// Creates a new markup printer.
    pub fn new(writer: W) -> Self {
        MarkupPrinter { writer }
    }

    /// Prints a node and its subtree (its outer markup).
    ///
    /// Printing the document root prints its children.
    pub fn print(&mut self, node: &NodeRef) -> std::io::Result<()> {
        let borrowed = node.borrow();
        match borrowed.content() {
            NodeContent::Root => {
                for child in borrowed.children() {
                    self.print(child)?;
                }
            }
            NodeContent::Element(element) => {
                let name = element.name();
                write!(self.writer, "<{}", name)?;
                for (key, value) in element.attributes() {
                    if value.is_empty() {
                        write!(self.writer, " {}", key)?;
                    } else {
                        write!(self.writer, " {}=\"{}\"", key, to_entities(value, true))?;
                    }
                }
                write!(self.writer, ">")?;

                if borrowed.child_count() == 0 && is_void_element(name) {
                    return Ok(());
                }
                for child in borrowed.children() {
                    self.print(child)?;
                }
                write!(self.writer, "</{}>", name)?;
            }
            NodeContent::Text(text) => {
                write!(self.writer, "{}", to_entities(text.text(), false))?;
            }
            NodeContent::Comment(comment) => {
                write!(self.writer, "<!--{}-->", comment.text())?;
            }
            NodeContent::CData(text) => {
                write!(self.writer, "<![CDATA[{}]]>", text.text())?;
            }
            NodeContent::ProcessingInstruction(body) => {
                write!(self.writer, "<?{}?>", body)?;
            }
            NodeContent::Doctype(body) => {
                write!(self.writer, "<!DOCTYPE {}>", body)?;
            }
        }
        Ok(())
    }

    /// Consumes the printer, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Converts special characters to entities.
fn to_entities(s: &str, in_attribute: bool) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if in_attribute => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

/// Prints a node (and its subtree) to a string.
pub fn to_markup(node: &NodeRef) -> String {
    let mut printer = MarkupPrinter::new(Vec::new());
    // Writing into a Vec cannot fail
    let _ = printer.print(node);
    String::from_utf8_lossy(&printer.into_inner()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_str;

    #[test]
    fn test_print_simple() {
        let root = parse_str("<div><p>text</p></div>").unwrap();
        assert_eq!(to_markup(&root), "<div><p>text</p></div>");
    }

    #[test]
    fn test_print_keeps_attribute_order() {
        let root = parse_str(r#"<a href="/x" id="y" class="z">link</a>"#).unwrap();
        assert_eq!(
            to_markup(&root),
            r#"<a href="/x" id="y" class="z">link</a>"#
        );
    }

    #[test]
    fn test_print_void_and_valueless() {
        let root = parse_str("<p>a<br>b<input disabled></p>").unwrap();
        assert_eq!(to_markup(&root), "<p>a<br>b<input disabled></p>");
    }

    #[test]
    fn test_entity_encoding() {
        let root = parse_str(r#"<p title="&quot;q&quot; &amp; a">&lt;tag&gt; &amp; more</p>"#)
            .unwrap();
        assert_eq!(
            to_markup(&root),
            r#"<p title="&quot;q&quot; &amp; a">&lt;tag&gt; &amp; more</p>"#
        );
    }

    #[test]
    fn test_print_subtree_only() {
        let root = parse_str("<div><b>1</b><!--c--><i>2</i></div>").unwrap();
        let div = root.borrow().children()[0].clone();
        let comment = div.borrow().children()[1].clone();
        let i = div.borrow().children()[2].clone();
        assert_eq!(to_markup(&comment), "<!--c-->");
        assert_eq!(to_markup(&i), "<i>2</i>");
    }

    #[test]
    fn test_round_trip() {
        let markup = r#"<div id="s1"><p class="a b">First &amp; second.</p><![CDATA[x]]></div>"#;
        let tree1 = parse_str(markup).unwrap();
        let output1 = to_markup(&tree1);
        let tree2 = parse_str(&output1).unwrap();
        assert_eq!(output1, to_markup(&tree2));
        assert_eq!(output1, markup);
    }
}
