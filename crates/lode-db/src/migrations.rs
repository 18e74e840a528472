//! Database migration runner.
//!
//! Embeds the SQL migration files at compile time and executes them on
//! database open. All statements use `IF NOT EXISTS` for idempotent re-running.

use crate::LodeDb;
use crate::error::DatabaseError;

/// Control-database schema: repository name → namespace mapping.
const MIGRATION_CONTROL: &str = include_str!("../migrations/000_control.sql");

/// Per-namespace schema: code, document, tag, validity, and queue tables,
/// FTS5 virtual tables with sync triggers, and embedding tables.
const MIGRATION_001: &str = include_str!("../migrations/001_initial.sql");

impl LodeDb {
    /// Run the per-namespace migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Migration`] with the failing migration name.
    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        self.execute_batch(MIGRATION_001)
            .await
            .map_err(|e| DatabaseError::Migration(format!("001_initial: {e}")))?;
        Ok(())
    }

    /// Run the control-database migration.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Migration`] with the failing migration name.
    pub async fn run_control_migrations(&self) -> Result<(), DatabaseError> {
        self.execute_batch(MIGRATION_CONTROL)
            .await
            .map_err(|e| DatabaseError::Migration(format!("000_control: {e}")))?;
        Ok(())
    }
}
