//! Embedding error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The backend returned an error or was unreachable within the deadline.
    #[error("Embedding backend unavailable: {0}")]
    Backend(String),

    /// The backend response did not have the expected shape.
    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),

    /// Storage failed while writing embeddings.
    #[error(transparent)]
    Database(#[from] lode_db::DatabaseError),
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(e: reqwest::Error) -> Self {
        Self::Backend(e.to_string())
    }
}
