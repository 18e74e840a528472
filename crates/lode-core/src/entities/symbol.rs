use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::SymbolKind;

/// Line and byte range of a symbol within its file. Lines are 1-indexed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Span {
    pub start_line: u32,
    pub end_line: u32,
    pub start_byte: u32,
    pub end_byte: u32,
}

/// An extracted symbol definition (function, class, method, …).
///
/// `fqn` is deduplicated per file by the indexer; cross-file collisions are
/// tolerated and resolved last-writer-wins by the repo-wide name lookup.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Symbol {
    pub id: String,
    pub repo_id: String,
    pub file_id: String,
    pub fqn: String,
    pub name: String,
    pub kind: SymbolKind,
    pub signature: String,
    pub span: Span,
    pub docstring: Option<String>,
    /// Hash of the symbol's byte range, used as chunk identity.
    pub content_hash: String,
}
