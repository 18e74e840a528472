//! Parser error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    /// Source could not be parsed into a usable tree.
    #[error("Unparseable source: {0}")]
    Unparseable(String),

    /// No grammar is available for the language.
    #[error("No parser for language '{0}'")]
    NoParser(String),
}
