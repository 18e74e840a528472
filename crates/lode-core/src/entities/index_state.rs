use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Aggregate index state for a repository, refreshed after each walk.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RepoIndexState {
    pub repo_id: String,
    pub last_indexed_at: DateTime<Utc>,
    pub file_count: i64,
    pub symbol_count: i64,
    pub chunk_count: i64,
}
