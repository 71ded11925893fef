//! Markup parsing and output.
//!
//! The parser turns HTML-like markup into a node tree under a synthetic root;
//! the printer writes nodes back out as markup.

mod parser;
mod printer;

pub use parser::{parse_file, parse_str, MarkupParser};
pub use printer::{to_markup, MarkupPrinter};
