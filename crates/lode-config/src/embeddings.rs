//! Embedding backend configuration.

use serde::{Deserialize, Serialize};

/// Which wire protocol the embedding endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    /// Native JSON endpoint, one text per request.
    Native,
    /// OpenAI-compatible `/v1/embeddings`, batched.
    OpenAi,
}

const fn default_provider() -> EmbeddingProvider {
    EmbeddingProvider::Native
}

fn default_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

const fn default_dimension() -> u32 {
    768
}

const fn default_batch_size() -> u32 {
    32
}

/// Safety margin under typical embedding-model input limits.
const fn default_max_chunk_length() -> u32 {
    4_000
}

const fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_provider")]
    pub provider: EmbeddingProvider,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sent as a bearer token when non-empty.
    #[serde(default)]
    pub api_key: String,

    /// Vector dimension the backend produces.
    #[serde(default = "default_dimension")]
    pub dimension: u32,

    /// Texts per batched request.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Content longer than this is truncated before embedding.
    #[serde(default = "default_max_chunk_length")]
    pub max_chunk_length: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            api_key: String::new(),
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            max_chunk_length: default_max_chunk_length(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = EmbeddingsConfig::default();
        assert_eq!(config.provider, EmbeddingProvider::Native);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.max_chunk_length, 4_000);
        assert_eq!(config.timeout_secs, 120);
        assert!(config.api_key.is_empty());
    }
}
