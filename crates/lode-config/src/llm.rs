//! LLM backend configuration: deep and small model slots.

use serde::{Deserialize, Serialize};

/// Which wire protocol the LLM endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// Native `/api/generate` endpoint.
    Native,
    /// OpenAI-compatible `/v1/completions`.
    OpenAiCompletions,
    /// OpenAI-compatible `/v1/chat/completions`.
    OpenAiChat,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

const fn default_temperature() -> f64 {
    0.3
}

/// One model slot (deep or small).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmSlotConfig {
    pub provider: LlmProvider,
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as a bearer token when non-empty.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

/// Dual-slot LLM configuration.
///
/// The deep slot handles complex extraction and verification; the small slot
/// handles summaries and classifications.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "LlmConfig::default_deep")]
    pub deep: LlmSlotConfig,
    #[serde(default = "LlmConfig::default_small")]
    pub small: LlmSlotConfig,
}

impl LlmConfig {
    fn default_deep() -> LlmSlotConfig {
        LlmSlotConfig {
            provider: LlmProvider::Native,
            model: "qwen3-coder:30b".to_string(),
            base_url: default_base_url(),
            api_key: String::new(),
            temperature: default_temperature(),
            max_tokens: 4_000,
            timeout_secs: 180,
        }
    }

    fn default_small() -> LlmSlotConfig {
        LlmSlotConfig {
            provider: LlmProvider::Native,
            model: "phi3.5:3.8b".to_string(),
            base_url: default_base_url(),
            api_key: String::new(),
            temperature: default_temperature(),
            max_tokens: 1_000,
            timeout_secs: 60,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            deep: Self::default_deep(),
            small: Self::default_small(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.deep.max_tokens, 4_000);
        assert_eq!(config.deep.timeout_secs, 180);
        assert_eq!(config.small.max_tokens, 1_000);
        assert_eq!(config.small.timeout_secs, 60);
        assert!((config.deep.temperature - 0.3).abs() < f64::EPSILON);
    }
}
