use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::EdgeKind;

/// Where in the source an edge was observed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EdgeEvidence {
    pub file_id: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// A directed relationship between two symbols.
///
/// `src_symbol_id` is `None` only for file-level IMPORTS. Edges whose
/// endpoints cannot be resolved are never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Edge {
    pub id: String,
    pub repo_id: String,
    pub kind: EdgeKind,
    pub src_symbol_id: Option<String>,
    pub dst_symbol_id: String,
    pub evidence: EdgeEvidence,
    /// Best-effort extraction confidence in `[0, 1]`.
    pub confidence: f64,
}
