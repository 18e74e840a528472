//! LLM error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// The backend returned an error or was unreachable within the deadline.
    #[error("LLM backend unavailable: {0}")]
    Backend(String),

    /// The backend response did not have the expected shape.
    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        Self::Backend(e.to_string())
    }
}
