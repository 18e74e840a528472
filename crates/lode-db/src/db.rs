//! Low-level libSQL database handle.

use std::path::Path;

use crate::error::{DatabaseError, is_transient_conflict};

/// A single libSQL database (one namespace, or the control database).
///
/// Thin wrapper around `libsql::Connection` with error mapping and a
/// one-retry policy for transient lock conflicts.
pub struct LodeDb {
    conn: libsql::Connection,
}

impl LodeDb {
    /// Open (or create) a local database file.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::LibSql`] if the file cannot be opened.
    pub async fn open_local(path: &Path) -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(path).build().await?;
        let conn = db.connect()?;
        conn.execute("PRAGMA foreign_keys = ON", ()).await?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (tests).
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::LibSql`] if the database cannot be created.
    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:").build().await?;
        let conn = db.connect()?;
        conn.execute("PRAGMA foreign_keys = ON", ()).await?;
        Ok(Self { conn })
    }

    /// Access the underlying connection.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Execute a statement, retrying once on a transient lock conflict.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Conflict`] if the retry also fails on a
    /// transient error, or [`DatabaseError::LibSql`] for genuine SQL errors.
    pub async fn execute(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<u64, DatabaseError> {
        let params = params.into_params()?;
        match self.conn.execute(sql, params.clone()).await {
            Ok(n) => Ok(n),
            Err(e) if is_transient_conflict(&e) => {
                tracing::debug!(sql, "retrying after transient lock conflict");
                self.conn
                    .execute(sql, params)
                    .await
                    .map_err(|e| DatabaseError::Conflict(e.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run a query.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::LibSql`] if the query fails.
    pub async fn query(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<libsql::Rows, DatabaseError> {
        Ok(self.conn.query(sql, params).await?)
    }

    /// Execute a batch of statements (migrations).
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::LibSql`] if any statement fails.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), DatabaseError> {
        self.conn.execute_batch(sql).await?;
        Ok(())
    }

    /// Begin an explicit transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::LibSql`] if the transaction cannot start.
    pub async fn transaction(&self) -> Result<libsql::Transaction, DatabaseError> {
        Ok(self.conn.transaction().await?)
    }
}
