//! Indexing error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// A path was outside the repository root or otherwise invalid.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// File could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Summary generation failed at the LLM backend.
    #[error("Summary generation failed: {0}")]
    Summary(String),

    /// Storage failed.
    #[error(transparent)]
    Database(#[from] lode_db::DatabaseError),
}
