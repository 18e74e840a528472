//! HTTP embedding client.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use lode_config::{EmbeddingProvider, EmbeddingsConfig};

use crate::error::EmbeddingError;

/// Client for a remote embedding backend.
///
/// The native protocol takes one text per request (`{model, input}` →
/// `{embedding: […]}` or `{data: [{embedding}]}`); the OpenAI-compatible
/// protocol batches (`{model, input: […]}` → `{data: [{embedding: […]}]}`
/// in input order). The API key, when configured, is sent as a bearer token.
pub struct EmbeddingClient {
    config: EmbeddingsConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct NativeResponse {
    embedding: Option<Vec<f32>>,
    data: Option<Vec<EmbeddingItem>>,
}

impl EmbeddingClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::Backend`] if the HTTP client cannot be built.
    pub fn new(config: EmbeddingsConfig) -> Result<Self, EmbeddingError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, http })
    }

    /// The configured vector dimension.
    #[must_use]
    pub const fn dimension(&self) -> u32 {
        self.config.dimension
    }

    /// Content longer than this is truncated before embedding.
    #[must_use]
    pub const fn max_chunk_length(&self) -> usize {
        self.config.max_chunk_length as usize
    }

    /// Embed one text.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::Backend`] on transport failure or
    /// [`EmbeddingError::MalformedResponse`] on an unexpected body.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::MalformedResponse("empty embedding list".to_string()))
    }

    /// Embed a batch of texts, preserving input order.
    ///
    /// The native protocol is called once per text; the OpenAI-compatible
    /// protocol sends sub-batches of `batch_size` texts.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::Backend`] on transport failure or
    /// [`EmbeddingError::MalformedResponse`] when the response count does not
    /// match the input count.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        match self.config.provider {
            EmbeddingProvider::Native => {
                let mut vectors = Vec::with_capacity(texts.len());
                for text in texts {
                    vectors.push(self.embed_native(text).await?);
                }
                Ok(vectors)
            }
            EmbeddingProvider::OpenAi => {
                let mut vectors = Vec::with_capacity(texts.len());
                for batch in texts.chunks(self.config.batch_size.max(1) as usize) {
                    vectors.extend(self.embed_openai_batch(batch).await?);
                }
                Ok(vectors)
            }
        }
    }

    async fn embed_native(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!(
            "{}/api/embeddings",
            self.config.base_url.trim_end_matches('/')
        );
        let mut request = self.http.post(&url).json(&json!({
            "model": self.config.model,
            "input": text,
        }));
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request.send().await?.error_for_status()?;
        let body: NativeResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;

        if let Some(embedding) = body.embedding {
            return Ok(embedding);
        }
        if let Some(mut data) = body.data
            && !data.is_empty()
        {
            return Ok(data.remove(0).embedding);
        }
        Err(EmbeddingError::MalformedResponse(
            "no embedding field in native response".to_string(),
        ))
    }

    async fn embed_openai_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!(
            "{}/v1/embeddings",
            self.config.base_url.trim_end_matches('/')
        );
        let mut request = self.http.post(&url).json(&json!({
            "model": self.config.model,
            "input": texts,
        }));
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request.send().await?.error_for_status()?;
        let body: BatchResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;

        if body.data.len() != texts.len() {
            return Err(EmbeddingError::MalformedResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }
        Ok(body.data.into_iter().map(|item| item.embedding).collect())
    }

    /// Truncate text to the configured embedding input limit.
    #[must_use]
    pub fn truncate<'t>(&self, text: &'t str) -> &'t str {
        let limit = self.max_chunk_length();
        if text.len() <= limit {
            return text;
        }
        let mut end = limit;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        tracing::warn!(
            original = text.len(),
            truncated = end,
            "truncating over-long embedding input"
        );
        &text[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_client() -> EmbeddingClient {
        EmbeddingClient::new(EmbeddingsConfig::default()).unwrap()
    }

    #[test]
    fn truncate_respects_limit_and_boundaries() {
        let client = test_client();
        let short = "small text";
        assert_eq!(client.truncate(short), short);

        let long = "é".repeat(5_000);
        let truncated = client.truncate(&long);
        assert!(truncated.len() <= client.max_chunk_length());
        // Never splits a code point
        assert!(truncated.chars().last().is_some());
    }

    #[test]
    fn native_response_shapes_parse() {
        let direct: NativeResponse =
            serde_json::from_str(r#"{"embedding": [0.1, 0.2]}"#).unwrap();
        assert_eq!(direct.embedding.unwrap(), vec![0.1, 0.2]);

        let wrapped: NativeResponse =
            serde_json::from_str(r#"{"data": [{"embedding": [0.3]}]}"#).unwrap();
        assert_eq!(wrapped.data.unwrap()[0].embedding, vec![0.3]);
    }

    #[test]
    fn batch_response_parses_in_order() {
        let body: BatchResponse = serde_json::from_str(
            r#"{"data": [{"embedding": [1.0]}, {"embedding": [2.0]}], "model": "m"}"#,
        )
        .unwrap();
        assert_eq!(body.data.len(), 2);
        assert_eq!(body.data[1].embedding, vec![2.0]);
    }

    #[tokio::test]
    async fn empty_batch_is_noop() {
        let client = test_client();
        let vectors = client.embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
