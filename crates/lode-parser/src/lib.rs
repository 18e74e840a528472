//! # lode-parser
//!
//! Source parsing and extraction for Lode:
//! - Language detection from file extensions, including template formats
//! - ast-grep parse trees for the supported languages
//! - Per-language symbol and edge extractors
//! - Code chunking (header + per-symbol sliding windows)
//! - Plain-text and statement-aware SQL chunking
//! - SQL schema parsing (tables, routines, triggers)
//! - Template script extraction with a line map back to the original file

pub mod chunker;
pub mod error;
pub mod extractors;
pub mod language;
pub mod parser;
pub mod sql_chunker;
pub mod sql_schema;
pub mod template;
pub mod types;

pub use error::ParserError;
