//! Documentation validity configuration.

use serde::{Deserialize, Serialize};

const fn default_max_claims() -> u32 {
    50
}

const fn default_min_extraction_confidence() -> f64 {
    0.7
}

const fn default_min_relevance() -> f64 {
    0.3
}

const fn default_verify_top_k() -> u32 {
    15
}

const fn default_fetch_multiplier() -> u32 {
    3
}

const fn default_evidence_max_chars() -> u32 {
    12_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidityConfig {
    /// Claims extracted per document, at most.
    #[serde(default = "default_max_claims")]
    pub max_claims: u32,

    /// Claims below this extraction confidence are discarded.
    #[serde(default = "default_min_extraction_confidence")]
    pub min_extraction_confidence: f64,

    /// Evidence below this reranked relevance is dropped.
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f64,

    /// Evidence chunks passed to the verification LLM.
    #[serde(default = "default_verify_top_k")]
    pub verify_top_k: u32,

    /// Fetch `verify_top_k × fetch_multiplier` candidates, then rerank.
    #[serde(default = "default_fetch_multiplier")]
    pub fetch_multiplier: u32,

    /// Character budget for packed code context.
    #[serde(default = "default_evidence_max_chars")]
    pub evidence_max_chars: u32,
}

impl Default for ValidityConfig {
    fn default() -> Self {
        Self {
            max_claims: default_max_claims(),
            min_extraction_confidence: default_min_extraction_confidence(),
            min_relevance: default_min_relevance(),
            verify_top_k: default_verify_top_k(),
            fetch_multiplier: default_fetch_multiplier(),
            evidence_max_chars: default_evidence_max_chars(),
        }
    }
}
