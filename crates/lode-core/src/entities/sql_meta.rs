use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Structured metadata for a parsed `CREATE TABLE` statement.
/// Column and constraint details are stored as JSON for flexible querying.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SqlTableMetadata {
    pub id: String,
    pub repo_id: String,
    pub file_id: String,
    pub schema_name: Option<String>,
    pub table_name: String,
    pub qualified_name: String,
    /// JSON array of parsed column definitions.
    pub columns: serde_json::Value,
    /// JSON array of parsed table constraints.
    pub constraints: serde_json::Value,
    pub start_line: u32,
    pub end_line: u32,
    pub content_hash: String,
}

/// Structured metadata for a parsed function, procedure, or trigger.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SqlRoutineMetadata {
    pub id: String,
    pub repo_id: String,
    pub file_id: String,
    pub schema_name: Option<String>,
    pub routine_name: String,
    pub qualified_name: String,
    /// `FUNCTION`, `PROCEDURE`, or `TRIGGER`.
    pub routine_type: String,
    /// JSON array of parsed parameters.
    pub parameters: serde_json::Value,
    pub return_type: Option<String>,
    pub language: Option<String>,
    pub volatility: Option<String>,
    pub trigger_table: Option<String>,
    /// JSON array of trigger events (`INSERT`, `UPDATE`, …).
    pub trigger_events: serde_json::Value,
    pub trigger_timing: Option<String>,
    pub start_line: u32,
    pub end_line: u32,
    pub content_hash: String,
}
