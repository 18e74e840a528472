use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{DocSource, DocType};

/// A documentation artifact (file, schema dump, generated summary, report).
/// Full text is stored and mirrored into the document FTS index.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub repo_id: String,
    pub path: String,
    pub doc_type: DocType,
    pub title: String,
    pub content: String,
    pub source: DocSource,
    pub content_hash: String,
    pub updated_at: DateTime<Utc>,
}
