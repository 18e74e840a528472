use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{EntityKind, TagSource};

/// A repository-scoped label used for filtering and retrieval boosting.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub repo_id: String,
    pub name: String,
    pub description: Option<String>,
}

/// Assignment of a tag to a file, symbol, chunk, or document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct EntityTag {
    pub id: String,
    pub repo_id: String,
    pub tag_id: String,
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub source: TagSource,
    pub confidence: f64,
}
