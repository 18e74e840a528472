use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An indexed source repository. Scopes every other entity.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Repository {
    pub id: String,
    /// Unique human-readable name (control-catalog key).
    pub name: String,
    /// Absolute path to the repository root on disk.
    pub root_path: String,
    /// Storage namespace holding this repository's tables.
    pub namespace: String,
    pub created_at: DateTime<Utc>,
}
