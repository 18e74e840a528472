//! Database error types for lode-db.

use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A concurrent write conflicted and the single retry also failed.
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// Invalid state encountered (e.g., bad data in the database).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<lode_core::errors::CoreError> for DatabaseError {
    fn from(e: lode_core::errors::CoreError) -> Self {
        Self::Other(anyhow::anyhow!(e))
    }
}

/// Detect SQLite busy/locked errors worth a single retry.
///
/// The predicate is intentionally narrow to avoid retrying genuine SQL or
/// constraint errors.
#[must_use]
pub fn is_transient_conflict(e: &libsql::Error) -> bool {
    let msg = e.to_string();
    msg.contains("database is locked") || msg.contains("database table is locked")
}
