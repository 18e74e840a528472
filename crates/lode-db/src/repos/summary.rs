//! Generated summaries for files, symbols, and modules.
//!
//! Summaries are regenerated only when the summarized content's hash changes;
//! `is_summary_current` gates the LLM call.

use chrono::Utc;

use crate::error::DatabaseError;
use crate::helpers::parse_datetime;
use crate::store::LodeStore;

/// Summary storage target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    File,
    Symbol,
    Module,
}

impl SummaryKind {
    const fn table(self) -> &'static str {
        match self {
            Self::File => "file_summary",
            Self::Symbol => "symbol_summary",
            Self::Module => "module_summary",
        }
    }

    const fn key_column(self) -> &'static str {
        match self {
            Self::File => "file_id",
            Self::Symbol => "symbol_id",
            Self::Module => "module_path",
        }
    }
}

/// A stored summary row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSummary {
    pub entity_key: String,
    pub repo_id: String,
    pub summary: String,
    pub content_hash: String,
    pub generated_at: chrono::DateTime<Utc>,
}

impl LodeStore {
    /// Whether a current summary (matching hash) exists.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn is_summary_current(
        &self,
        kind: SummaryKind,
        entity_key: &str,
        content_hash: &str,
    ) -> Result<bool, DatabaseError> {
        let sql = format!(
            "SELECT content_hash FROM {} WHERE {} = ?1",
            kind.table(),
            kind.key_column()
        );
        let mut rows = self.db().query(&sql, [entity_key]).await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<String>(0)? == content_hash),
            None => Ok(false),
        }
    }

    /// Upsert a summary.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the write fails.
    pub async fn upsert_summary(
        &self,
        kind: SummaryKind,
        entity_key: &str,
        repo_id: &str,
        summary: &str,
        content_hash: &str,
    ) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO {table} ({key}, repo_id, summary, content_hash, generated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT ({key}) DO UPDATE SET
                 summary = excluded.summary,
                 content_hash = excluded.content_hash,
                 generated_at = excluded.generated_at",
            table = kind.table(),
            key = kind.key_column()
        );
        self.db()
            .execute(
                &sql,
                libsql::params![
                    entity_key,
                    repo_id,
                    summary,
                    content_hash,
                    Utc::now().to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    /// Read a summary.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_summary(
        &self,
        kind: SummaryKind,
        entity_key: &str,
    ) -> Result<Option<StoredSummary>, DatabaseError> {
        let sql = format!(
            "SELECT {key}, repo_id, summary, content_hash, generated_at FROM {table} WHERE {key} = ?1",
            table = kind.table(),
            key = kind.key_column()
        );
        let mut rows = self.db().query(&sql, [entity_key]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(StoredSummary {
                entity_key: row.get::<String>(0)?,
                repo_id: row.get::<String>(1)?,
                summary: row.get::<String>(2)?,
                content_hash: row.get::<String>(3)?,
                generated_at: parse_datetime(&row.get::<String>(4)?)?,
            })),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_store;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn module_summary_hash_gating() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        assert!(
            !store
                .is_summary_current(SummaryKind::Module, "src/auth", "h1")
                .await
                .unwrap()
        );

        store
            .upsert_summary(SummaryKind::Module, "src/auth", &repo.id, "Auth module.", "h1")
            .await
            .unwrap();

        assert!(
            store
                .is_summary_current(SummaryKind::Module, "src/auth", "h1")
                .await
                .unwrap()
        );
        assert!(
            !store
                .is_summary_current(SummaryKind::Module, "src/auth", "h2")
                .await
                .unwrap()
        );

        let stored = store
            .get_summary(SummaryKind::Module, "src/auth")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.summary, "Auth module.");
    }
}
