//! Error types for markup-diff.

use thiserror::Error;

/// Result type alias for markup-diff operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building inputs for a comparison.
///
/// Comparing two trees never fails; only parsing documents, building
/// weights and parsing locators can.
#[derive(Error, Debug)]
pub enum Error {
    /// Markup parse error.
    #[error("markup parse error: {0}")]
    Parse(String),

    /// Error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A weight multiplier that is negative or not a finite number.
    #[error("invalid weight for `{key}`: {value} (expected a finite, non-negative number)")]
    InvalidWeight {
        /// Configuration key the value was given for.
        key: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A text contents threshold outside `[0, 1]`.
    #[error("invalid textContents_threshold: {0} (expected a fraction in [0, 1])")]
    InvalidThreshold(f64),

    /// Weight configuration that is not an object of numbers and booleans.
    #[error("invalid weight configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A locator that cannot be parsed as a selector.
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
}
