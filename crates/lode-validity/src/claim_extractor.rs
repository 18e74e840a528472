//! Behavioral claim extraction from documentation via the deep LLM.
//!
//! A behavioral claim is a statement with a specific, testable value. The
//! prompt enumerates eligible value types, forbids claims without numbers,
//! and requires JSON output. Parsing failures return an empty result with an
//! error string, never partial claims. Re-extraction deletes the document's
//! existing claims first.

use serde::Deserialize;

use lode_config::ValidityConfig;
use lode_core::entities::{BehavioralClaim, Document};
use lode_core::enums::ValueType;
use lode_db::LodeStore;
use lode_llm::{LlmClient, ModelSlot};

use crate::error::ValidityError;

/// Documents longer than this are truncated before prompting.
const MAX_PROMPT_CONTENT: usize = 20_000;

const CLAIM_EXTRACTION_PROMPT: &str = r#"Your task: Extract behavioral claims FROM THE DOCUMENT BELOW ONLY.

A behavioral claim is a statement with a specific, testable value (number, percentage, limit, threshold).

WHAT TO EXTRACT (claims with specific values):
- Limits: "Max 10 items", "Up to 5 attempts"
- Percentages: "25% boost", "50% discount"
- Thresholds: "Requires 500 points", "Minimum 8 characters"
- Durations: "Expires after 24 hours", "Cooldown of 5 minutes"
- Costs/Prices: "$1000 fee", "Costs 50 gold"

WHAT TO SKIP:
- Vague statements without numbers
- Instructions or recommendations
- References to other docs
- Code examples or sample data

=== DOCUMENT TO ANALYZE (extract claims ONLY from this content) ===
{content}
=== END DOCUMENT ===

Return a JSON array. Each claim must have:
- claim_text: Exact quote from the document above
- topic: Short description (2-4 words)
- subject: What entity the claim is about (optional)
- condition: When the claim applies (optional)
- expected_value: The specific number/value claimed
- value_type: percentage|number|duration|size|boolean
- confidence: 0.7-1.0

CRITICAL: Only extract claims that appear in the document above. Do NOT include any examples from these instructions.

Return [] if no claims found. Return ONLY valid JSON, no other text.
JSON:"#;

/// A claim as parsed from the LLM response, before persistence.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedClaim {
    #[serde(default)]
    pub claim_text: String,
    #[serde(default = "unknown_topic")]
    pub topic: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub expected_value: Option<String>,
    #[serde(default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub confidence: f64,
}

fn unknown_topic() -> String {
    "unknown".to_string()
}

/// Accept both `"10"` and `10` from the model.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }))
}

/// Outcome of one extraction pass.
#[derive(Debug)]
pub struct ExtractionResult {
    pub claims: Vec<BehavioralClaim>,
    pub success: bool,
    pub error: Option<String>,
}

/// Extract claims from a document and replace its stored claim set.
///
/// # Errors
///
/// Returns [`ValidityError::Database`] on storage failure. LLM and parsing
/// failures are reported inside the result, not as errors.
pub async fn extract_and_store_claims(
    store: &LodeStore,
    llm: &LlmClient,
    document: &Document,
    config: &ValidityConfig,
) -> Result<ExtractionResult, ValidityError> {
    let parsed = match extract_claims(llm, &document.content, config).await {
        Ok(claims) => claims,
        Err(message) => {
            return Ok(ExtractionResult {
                claims: Vec::new(),
                success: false,
                error: Some(message),
            });
        }
    };

    // Idempotency: re-extraction replaces the document's claims
    store.delete_claims_for_document(&document.id).await?;

    let mut stored = Vec::new();
    for claim in parsed {
        let value_type = claim
            .value_type
            .as_deref()
            .and_then(|s| parse_value_type(s));
        let row = store
            .insert_claim(
                &document.id,
                &document.repo_id,
                &claim.claim_text,
                &claim.topic,
                claim.subject.as_deref(),
                claim.condition.as_deref(),
                claim.expected_value.as_deref(),
                value_type,
                claim.confidence,
            )
            .await?;
        stored.push(row);
    }

    tracing::info!(
        document = %document.path,
        claims = stored.len(),
        "behavioral claims extracted"
    );
    Ok(ExtractionResult {
        claims: stored,
        success: true,
        error: None,
    })
}

/// Run the LLM and parse its claims. Errors are human-readable strings so the
/// caller can record them without aborting a batch.
async fn extract_claims(
    llm: &LlmClient,
    content: &str,
    config: &ValidityConfig,
) -> Result<Vec<ExtractedClaim>, String> {
    let truncated = if content.len() > MAX_PROMPT_CONTENT {
        let mut end = MAX_PROMPT_CONTENT;
        while end > 0 && !content.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}\n... (truncated)", &content[..end])
    } else {
        content.to_string()
    };
    let prompt = CLAIM_EXTRACTION_PROMPT.replace("{content}", &truncated);

    let response = llm
        .generate(&prompt, ModelSlot::Deep)
        .await
        .map_err(|e| format!("LLM call failed: {e}"))?;
    if response.trim().is_empty() {
        return Err("LLM returned empty response".to_string());
    }

    let value = lode_llm::parse_json_response(&response).ok_or_else(|| {
        format!(
            "Failed to parse LLM JSON response: {}",
            &response[..response.len().min(200)]
        )
    })?;

    Ok(claims_from_value(value, config))
}

/// Normalize the JSON shape (`[…]`, `{"claims": […]}`, or a single object)
/// and apply the count cap and confidence floor.
pub(crate) fn claims_from_value(
    value: serde_json::Value,
    config: &ValidityConfig,
) -> Vec<ExtractedClaim> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(ref map) if map.contains_key("claims") => {
            match map.get("claims") {
                Some(serde_json::Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            }
        }
        serde_json::Value::Object(map) if map.contains_key("claim_text") => {
            vec![serde_json::Value::Object(map)]
        }
        _ => Vec::new(),
    };

    items
        .into_iter()
        .take(config.max_claims as usize)
        .filter_map(|item| serde_json::from_value::<ExtractedClaim>(item).ok())
        .filter(|claim| {
            !claim.claim_text.is_empty() && claim.confidence >= config.min_extraction_confidence
        })
        .collect()
}

pub(crate) fn parse_value_type(s: &str) -> Option<ValueType> {
    match s.to_lowercase().as_str() {
        "percentage" => Some(ValueType::Percentage),
        "number" => Some(ValueType::Number),
        "duration" => Some(ValueType::Duration),
        "size" => Some(ValueType::Size),
        "boolean" => Some(ValueType::Boolean),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn config() -> ValidityConfig {
        ValidityConfig::default()
    }

    #[test]
    fn array_shape_parsed_with_floor() {
        let value = json!([
            {"claim_text": "at most 10 sessions", "topic": "session limit",
             "expected_value": 10, "value_type": "number", "confidence": 0.9},
            {"claim_text": "low confidence claim", "topic": "noise",
             "expected_value": "5", "value_type": "number", "confidence": 0.4},
        ]);
        let claims = claims_from_value(value, &config());
        assert_eq!(claims.len(), 1, "confidence floor drops the second claim");
        assert_eq!(claims[0].expected_value.as_deref(), Some("10"));
    }

    #[test]
    fn wrapped_object_shape() {
        let value = json!({"claims": [
            {"claim_text": "25% boost", "topic": "boost",
             "expected_value": "25%", "value_type": "percentage", "confidence": 0.8}
        ]});
        let claims = claims_from_value(value, &config());
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].value_type.as_deref(), Some("percentage"));
    }

    #[test]
    fn single_object_wrapped_in_array() {
        let value = json!({"claim_text": "max 3 retries", "topic": "retries", "confidence": 0.9});
        let claims = claims_from_value(value, &config());
        assert_eq!(claims.len(), 1);
    }

    #[test]
    fn empty_claim_text_dropped() {
        let value = json!([{"claim_text": "", "topic": "t", "confidence": 0.9}]);
        assert!(claims_from_value(value, &config()).is_empty());
    }

    #[test]
    fn max_claims_cap_applies() {
        let items: Vec<serde_json::Value> = (0..60)
            .map(|i| json!({"claim_text": format!("claim {i}"), "topic": "t", "confidence": 0.9}))
            .collect();
        let claims = claims_from_value(serde_json::Value::Array(items), &config());
        assert_eq!(claims.len(), 50);
    }

    #[test]
    fn value_types_parse() {
        assert_eq!(parse_value_type("percentage"), Some(ValueType::Percentage));
        assert_eq!(parse_value_type("DURATION"), Some(ValueType::Duration));
        assert_eq!(parse_value_type("mystery"), None);
    }
}
