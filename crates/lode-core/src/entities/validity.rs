use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ValidityStatus;

/// Combined 0–100 validity score for a document, one row per document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DocValidityScore {
    pub document_id: String,
    pub score: i64,
    pub status: ValidityStatus,
    pub reference_score: f64,
    pub embedding_score: f64,
    pub freshness_score: f64,
    /// `verified_claims / checked_claims` when semantic validation ran.
    pub semantic_score: Option<f64>,
    pub llm_score: Option<f64>,
    pub references_checked: i64,
    pub references_valid: i64,
    pub related_code_chunks: i64,
    pub content_hash: String,
    pub validated_at: DateTime<Utc>,
}

/// A single problem found while validating a document's code references.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ValidityIssue {
    pub id: String,
    pub document_id: String,
    /// e.g. `"missing_symbol"`, `"missing_file"`, `"broken_import"`.
    pub issue_type: String,
    pub severity: String,
    pub reference_text: String,
    pub reference_line: Option<u32>,
    pub expected_kind: Option<String>,
    pub found_match: Option<String>,
    pub found_similarity: Option<f64>,
    pub suggestion: Option<String>,
}
