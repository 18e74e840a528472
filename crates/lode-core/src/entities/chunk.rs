use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A retrieval unit: a byte range of a file sized to fit the embedding
/// backend's input limit. `symbol_id` is `None` for header chunks.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Chunk {
    pub id: String,
    pub repo_id: String,
    pub file_id: String,
    pub symbol_id: Option<String>,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    pub content_hash: String,
}
