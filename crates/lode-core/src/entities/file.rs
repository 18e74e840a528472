use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Language;

/// An indexed source file. Owns its derived symbols, chunks, and per-file
/// tag assignments. Re-indexed only when `content_hash` changes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FileRecord {
    pub id: String,
    pub repo_id: String,
    /// Path relative to the repository root. Unique per repo.
    pub path: String,
    pub language: Language,
    pub content_hash: String,
    /// File modification time as observed at index time.
    pub mtime: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
