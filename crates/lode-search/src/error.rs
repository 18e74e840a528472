//! Search error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// The query is empty or otherwise unusable.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The requested start entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage failed.
    #[error(transparent)]
    Database(#[from] lode_db::DatabaseError),
}
