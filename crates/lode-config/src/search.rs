//! Hybrid search configuration.

use serde::{Deserialize, Serialize};

const fn default_vector_top_k() -> u32 {
    60
}

const fn default_fts_top_k() -> u32 {
    60
}

const fn default_final_top_k() -> u32 {
    12
}

const fn default_vector_weight() -> f64 {
    0.55
}

const fn default_fts_weight() -> f64 {
    0.35
}

const fn default_tag_weight() -> f64 {
    0.10
}

const fn default_context_budget_tokens() -> u32 {
    12_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Candidates taken from the vector arm before fusion.
    #[serde(default = "default_vector_top_k")]
    pub vector_top_k: u32,

    /// Candidates taken from the FTS arm before fusion.
    #[serde(default = "default_fts_top_k")]
    pub fts_top_k: u32,

    /// Results returned after fusion.
    #[serde(default = "default_final_top_k")]
    pub final_top_k: u32,

    #[serde(default = "default_vector_weight")]
    pub vector_weight: f64,

    #[serde(default = "default_fts_weight")]
    pub fts_weight: f64,

    #[serde(default = "default_tag_weight")]
    pub tag_weight: f64,

    /// Approximate token budget for symbol context packing.
    #[serde(default = "default_context_budget_tokens")]
    pub context_budget_tokens: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            vector_top_k: default_vector_top_k(),
            fts_top_k: default_fts_top_k(),
            final_top_k: default_final_top_k(),
            vector_weight: default_vector_weight(),
            fts_weight: default_fts_weight(),
            tag_weight: default_tag_weight(),
            context_budget_tokens: default_context_budget_tokens(),
        }
    }
}
