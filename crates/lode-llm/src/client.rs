//! The LLM client: slot selection, provider dispatch, JSON convenience.

use std::time::Duration;

use serde_json::json;

use lode_config::{LlmConfig, LlmProvider, LlmSlotConfig};

use crate::error::LlmError;
use crate::parse::parse_json_response;

/// Which model slot a call should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSlot {
    /// Complex extraction and verification.
    Deep,
    /// Summaries and classifications.
    Small,
}

/// Client over the configured deep and small model slots.
pub struct LlmClient {
    config: LlmConfig,
    http: reqwest::Client,
}

impl LlmClient {
    /// Build a client from configuration. Per-call timeouts come from the
    /// slot configuration, not the shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Backend`] if the HTTP client cannot be built.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { config, http })
    }

    fn slot(&self, slot: ModelSlot) -> &LlmSlotConfig {
        match slot {
            ModelSlot::Deep => &self.config.deep,
            ModelSlot::Small => &self.config.small,
        }
    }

    /// Generate text from a prompt.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Backend`] on transport failure or timeout,
    /// [`LlmError::MalformedResponse`] on an unexpected body.
    pub async fn generate(&self, prompt: &str, slot: ModelSlot) -> Result<String, LlmError> {
        let slot_config = self.slot(slot);
        tracing::debug!(
            model = %slot_config.model,
            provider = ?slot_config.provider,
            "calling LLM"
        );

        match slot_config.provider {
            LlmProvider::Native => self.generate_native(prompt, slot_config).await,
            LlmProvider::OpenAiCompletions => self.generate_completions(prompt, slot_config).await,
            LlmProvider::OpenAiChat => self.generate_chat(prompt, slot_config).await,
        }
    }

    /// Generate and parse a JSON payload (the prompt must request JSON).
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::MalformedResponse`] when no JSON can be recovered
    /// from the response text.
    pub async fn generate_json(
        &self,
        prompt: &str,
        slot: ModelSlot,
    ) -> Result<serde_json::Value, LlmError> {
        let text = self.generate(prompt, slot).await?;
        parse_json_response(&text).ok_or_else(|| {
            LlmError::MalformedResponse(format!(
                "no JSON in response: {}",
                &text[..text.len().min(200)]
            ))
        })
    }

    async fn generate_native(
        &self,
        prompt: &str,
        slot: &LlmSlotConfig,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", slot.base_url.trim_end_matches('/'));
        let mut request = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(slot.timeout_secs))
            .json(&json!({
                "model": slot.model,
                "prompt": prompt,
                "stream": false,
                "options": {
                    "temperature": slot.temperature,
                    "num_predict": slot.max_tokens,
                }
            }));
        if !slot.api_key.is_empty() {
            request = request.bearer_auth(&slot.api_key);
        }

        let response = request.send().await?.error_for_status()?;
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
        body.get("response")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| LlmError::MalformedResponse("missing 'response' field".to_string()))
    }

    async fn generate_completions(
        &self,
        prompt: &str,
        slot: &LlmSlotConfig,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1/completions", slot.base_url.trim_end_matches('/'));
        let mut request = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(slot.timeout_secs))
            .json(&json!({
                "model": slot.model,
                "prompt": prompt,
                "max_tokens": slot.max_tokens,
                "temperature": slot.temperature,
            }));
        if !slot.api_key.is_empty() {
            request = request.bearer_auth(&slot.api_key);
        }

        let response = request.send().await?.error_for_status()?;
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("text"))
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| LlmError::MalformedResponse("missing choices[0].text".to_string()))
    }

    async fn generate_chat(&self, prompt: &str, slot: &LlmSlotConfig) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1/chat/completions",
            slot.base_url.trim_end_matches('/')
        );
        let mut request = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(slot.timeout_secs))
            .json(&json!({
                "model": slot.model,
                "messages": [{"role": "user", "content": prompt}],
                "max_tokens": slot.max_tokens,
                "temperature": slot.temperature,
            }));
        if !slot.api_key.is_empty() {
            request = request.bearer_auth(&slot.api_key);
        }

        let response = request.send().await?.error_for_status()?;
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                LlmError::MalformedResponse("missing choices[0].message.content".to_string())
            })
    }
}
