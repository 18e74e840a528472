use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ClaimStatus, DriftSeverity, FixType, ValueType, Verdict};

/// A verifiable behavioral statement extracted from documentation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BehavioralClaim {
    pub id: String,
    pub document_id: String,
    pub repo_id: String,
    /// Verbatim quote from the document.
    pub claim_text: String,
    /// Short description of what the claim is about (2–4 words).
    pub topic: String,
    pub subject: Option<String>,
    pub condition: Option<String>,
    /// The specific value claimed, normalized to a string.
    pub expected_value: Option<String>,
    pub value_type: Option<ValueType>,
    pub extraction_confidence: f64,
    pub status: ClaimStatus,
}

/// One code chunk cited as evidence for a verification.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct EvidenceRef {
    pub chunk_id: String,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub relevance: f64,
}

/// The outcome of checking one claim against code evidence.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ClaimVerification {
    pub id: String,
    pub claim_id: String,
    pub verdict: Verdict,
    pub confidence: f64,
    pub actual_value: Option<String>,
    pub actual_behavior: Option<String>,
    pub evidence: Vec<EvidenceRef>,
    pub reasoning: Option<String>,
    pub suggested_fix: Option<String>,
    pub fix_type: Option<FixType>,
    pub suggested_diff: Option<String>,
    pub verified_at: DateTime<Utc>,
}

/// A tracked divergence between documentation and code.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DocDriftIssue {
    pub id: String,
    pub verification_id: String,
    pub severity: DriftSeverity,
    /// Issue category, e.g. `"behavioral"`.
    pub category: String,
    pub can_auto_fix: bool,
    pub auto_fix_type: Option<FixType>,
    pub created_at: DateTime<Utc>,
}
