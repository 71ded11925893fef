//! Selector parsing and matching.
//!
//! Supports the subset of CSS selectors that locators are made of:
//! type selectors, `#id`, `.class`, `:root` and `:nth-of-type(n)`,
//! joined by the child (`>`) or descendant (whitespace) combinator.
//! Identifiers accept CSS backslash escapes, both `\c` and hex `\3a `.

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::node::{node_key, same_node, DfsTreeIterator, NodeRef};

/// How a compound selector relates to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    /// `a > b`
    Child,
    /// `a b`
    Descendant,
}

/// A compound selector: everything between two combinators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    nth_of_type: Option<usize>,
    root: bool,
}

impl Compound {
    /// A `tag.class1.class2` compound.
    pub(crate) fn element(tag: &str, classes: &[&str]) -> Self {
        Compound {
            tag: Some(tag.to_string()),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            ..Compound::default()
        }
    }

    fn is_empty(&self) -> bool {
        *self == Compound::default()
    }

    /// Returns true if `node` satisfies every part of this compound.
    pub(crate) fn matches(&self, node: &NodeRef) -> bool {
        let inner = node.borrow();
        if self.root {
            return inner.is_root()
                && self.tag.is_none()
                && self.id.is_none()
                && self.classes.is_empty()
                && self.nth_of_type.is_none();
        }
        let Some(element) = inner.element() else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if !tag.eq_ignore_ascii_case(element.name()) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attribute("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| element.has_class(class)) {
            return false;
        }
        drop(inner);
        self.nth_of_type
            .map_or(true, |n| nth_of_type(node) == Some(n))
    }
}

/// Returns the 1-based position of an element among its same-tag element
/// siblings.
pub(crate) fn nth_of_type(node: &NodeRef) -> Option<usize> {
    let inner = node.borrow();
    let name = inner.name()?;
    let Some(parent) = inner.parent() else {
        return Some(1);
    };
    let parent = parent.borrow();
    let mut position = 0;
    for sibling in parent.children() {
        if sibling.borrow().name() == Some(name) {
            position += 1;
        }
        if same_node(sibling, node) {
            return Some(position);
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    combinator: Combinator,
    compound: Compound,
}

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    steps: Vec<Step>,
}

impl Selector {
    /// Parses a selector.
    pub fn parse(selector: &str) -> Result<Self> {
        Parser::new(selector).parse()
    }

    /// Returns every node under `root` (root included) that matches, in
    /// document order.
    pub fn select(&self, root: &NodeRef) -> Vec<NodeRef> {
        let mut current: Vec<NodeRef> = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            let candidates: Vec<NodeRef> = if index == 0 {
                DfsTreeIterator::new(root.clone()).collect()
            } else {
                match step.combinator {
                    Combinator::Child => current
                        .iter()
                        .flat_map(|n| n.borrow().children().to_vec())
                        .collect(),
                    Combinator::Descendant => current
                        .iter()
                        .flat_map(|n| DfsTreeIterator::new(n.clone()).skip(1))
                        .collect(),
                }
            };

            let mut seen = FxHashSet::default();
            current = candidates
                .into_iter()
                .filter(|n| step.compound.matches(n) && seen.insert(node_key(n)))
                .collect();
            if current.is_empty() {
                return current;
            }
        }

        let found: FxHashSet<usize> = current.iter().map(node_key).collect();
        DfsTreeIterator::new(root.clone())
            .filter(|n| found.contains(&node_key(n)))
            .collect()
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Returns true if `c` may appear unescaped in an identifier.
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

/// Escapes an identifier so that the parser reads it back unchanged.
pub(crate) fn escape_ident(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    for (i, c) in ident.chars().enumerate() {
        if i == 0 && c.is_ascii_digit() {
            out.push_str(&format!("\\{:x} ", c as u32));
        } else if is_ident_char(c) {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self) -> Error {
        Error::InvalidSelector(self.source.to_string())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            _ => Err(self.error()),
        }
    }

    /// Skips whitespace, returning true if there was any.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse(mut self) -> Result<Selector> {
        let mut steps = Vec::new();
        loop {
            let spaced = self.skip_whitespace();
            if self.peek().is_none() {
                break;
            }

            let combinator = if steps.is_empty() {
                Combinator::Descendant
            } else if self.peek() == Some('>') {
                self.pos += 1;
                self.skip_whitespace();
                Combinator::Child
            } else if spaced {
                Combinator::Descendant
            } else {
                return Err(self.error());
            };

            let compound = self.parse_compound()?;
            if compound.is_empty() {
                return Err(self.error());
            }
            steps.push(Step {
                combinator,
                compound,
            });
        }

        if steps.is_empty() {
            return Err(self.error());
        }
        Ok(Selector {
            source: self.source.to_string(),
            steps,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        if self.peek().is_some_and(|c| is_ident_char(c) || c == '\\') {
            compound.tag = Some(self.parse_ident()?);
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.parse_ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.parse_ident()?);
                }
                Some(':') => {
                    self.pos += 1;
                    match self.parse_ident()?.as_str() {
                        "root" => compound.root = true,
                        "nth-of-type" => compound.nth_of_type = Some(self.parse_index()?),
                        _ => return Err(self.error()),
                    }
                }
                _ => break,
            }
        }
        Ok(compound)
    }

    /// Parses `(n)` with `n >= 1`.
    fn parse_index(&mut self) -> Result<usize> {
        self.expect('(')?;
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        self.skip_whitespace();
        self.expect(')')?;
        match digits.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(self.error()),
        }
    }

    fn parse_ident(&mut self) -> Result<String> {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                ident.push(self.parse_escape()?);
            } else if is_ident_char(c) {
                self.pos += 1;
                ident.push(c);
            } else {
                break;
            }
        }
        if ident.is_empty() {
            return Err(self.error());
        }
        Ok(ident)
    }

    /// Parses the rest of an escape after the backslash.
    fn parse_escape(&mut self) -> Result<char> {
        let start = self.pos;
        while self.pos - start < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return self.bump().ok_or_else(|| self.error());
        }

        let hex: String = self.chars[start..self.pos].iter().collect();
        // A single whitespace terminates a hex escape
        if self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_str;

    fn names(nodes: &[NodeRef]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| n.borrow().name().unwrap_or("#").to_string())
            .collect()
    }

    #[test]
    fn test_parse_compound_parts() {
        let selector = Selector::parse("div#main > a.red.big:nth-of-type(2)").unwrap();
        assert_eq!(selector.steps.len(), 2);
        assert_eq!(selector.steps[0].compound.id.as_deref(), Some("main"));
        let last = &selector.steps[1];
        assert_eq!(last.combinator, Combinator::Child);
        assert_eq!(last.compound.tag.as_deref(), Some("a"));
        assert_eq!(last.compound.classes, vec!["red", "big"]);
        assert_eq!(last.compound.nth_of_type, Some(2));
    }

    #[test]
    fn test_parse_errors() {
        for bad in [
            "",
            "   ",
            "> a",
            "a >",
            "a > > b",
            "a:hover",
            "a:nth-of-type(0)",
            "a:nth-of-type(x)",
            "a#",
            "a.",
            "a[href]",
            "a\\",
        ] {
            assert!(
                matches!(Selector::parse(bad), Err(Error::InvalidSelector(_))),
                "{:?} should not parse",
                bad
            );
        }
    }

    #[test]
    fn test_escape_round_trip() {
        for ident in ["plain", "a.b", "x:y", "1st", "with space", "ünï", "a\\b"] {
            let escaped = escape_ident(ident);
            let selector = Selector::parse(&format!("p.{}", escaped)).unwrap();
            assert_eq!(selector.steps[0].compound.classes, vec![ident.to_string()]);
        }
        assert_eq!(escape_ident("1st"), "\\31 st");
    }

    #[test]
    fn test_select_child_and_descendant() {
        let root = parse_str("<div><p><b>1</b></p><b>2</b></div><b>3</b>").unwrap();
        assert_eq!(
            Selector::parse(":root > div > b").unwrap().select(&root).len(),
            1
        );
        assert_eq!(Selector::parse("div b").unwrap().select(&root).len(), 2);
        assert_eq!(Selector::parse("b").unwrap().select(&root).len(), 3);
        assert_eq!(Selector::parse(":root > b").unwrap().select(&root).len(), 1);
    }

    #[test]
    fn test_select_in_document_order() {
        let root = parse_str("<div><a>1</a><p><a>2</a></p><a>3</a></div>").unwrap();
        let found = Selector::parse("div a").unwrap().select(&root);
        let texts: Vec<String> = found.iter().map(crate::node::text_content).collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_nth_of_type_counts_same_tag_elements_only() {
        let root = parse_str("<ul>text<li>1</li><!-- c --><p>x</p><li>2</li></ul>").unwrap();
        let found = Selector::parse("li:nth-of-type(2)").unwrap().select(&root);
        assert_eq!(names(&found), vec!["li"]);
        assert_eq!(crate::node::text_content(&found[0]), "2");
        assert_eq!(nth_of_type(&found[0]), Some(2));
    }

    #[test]
    fn test_root_matches_only_the_document_root() {
        let root = parse_str("<p>x</p>").unwrap();
        let found = Selector::parse(":root").unwrap().select(&root);
        assert_eq!(found.len(), 1);
        assert!(found[0].borrow().is_root());
        assert!(Selector::parse("p:root").unwrap().select(&root).is_empty());
    }

    #[test]
    fn test_tag_match_ignores_case() {
        let root = parse_str("<section>x</section>").unwrap();
        assert_eq!(Selector::parse("SECTION").unwrap().select(&root).len(), 1);
    }
}
