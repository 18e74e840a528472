//! Validity error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidityError {
    /// Storage failed.
    #[error(transparent)]
    Database(#[from] lode_db::DatabaseError),

    /// Retrieval failed.
    #[error(transparent)]
    Search(#[from] lode_search::SearchError),

    /// LLM backend failed.
    #[error(transparent)]
    Llm(#[from] lode_llm::LlmError),

    /// The referenced document does not exist.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),
}
