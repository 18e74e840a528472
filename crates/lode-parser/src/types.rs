//! Extraction output types: symbols, edges, and chunks before storage.

use serde::{Deserialize, Serialize};

use lode_core::enums::{EdgeKind, SymbolKind};

/// A symbol extracted from a parse tree. Lines are 1-indexed; byte offsets
/// address the original source buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedSymbol {
    /// Fully qualified name, e.g. `User.login`. Unique per file after dedup.
    pub fqn: String,
    pub name: String,
    pub kind: SymbolKind,
    pub signature: String,
    pub start_line: u32,
    pub end_line: u32,
    pub start_byte: u32,
    pub end_byte: u32,
    pub docstring: Option<String>,
    /// Hash of the symbol's byte range.
    pub content_hash: String,
}

/// An edge extracted from a parse tree. Endpoints are names, resolved to
/// symbol ids at storage time. `src` is `None` for file-level imports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedEdge {
    pub kind: EdgeKind,
    pub src: Option<String>,
    pub dst: String,
    pub confidence: f64,
    pub start_line: u32,
    pub end_line: u32,
}

/// A chunk of file content sized for embedding. `symbol_fqn` is `None` for
/// header chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChunk {
    pub symbol_fqn: Option<String>,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    pub content_hash: String,
}
