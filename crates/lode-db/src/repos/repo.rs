//! Repository records and aggregate index state.

use chrono::Utc;

use lode_core::entities::{RepoIndexState, Repository};
use lode_core::ids::{PREFIX_REPO, generate_id};

use crate::error::DatabaseError;
use crate::helpers::parse_datetime;
use crate::store::LodeStore;

fn row_to_repo(row: &libsql::Row) -> Result<Repository, DatabaseError> {
    Ok(Repository {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        root_path: row.get::<String>(2)?,
        namespace: row.get::<String>(3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

impl LodeStore {
    /// Get the repository by name, creating it on first index.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the lookup or insert fails.
    pub async fn ensure_repo(
        &self,
        name: &str,
        root_path: &str,
    ) -> Result<Repository, DatabaseError> {
        if let Some(existing) = self.get_repo_by_name(name).await? {
            return Ok(existing);
        }

        let now = Utc::now();
        let id = generate_id(PREFIX_REPO)?;
        self.db()
            .execute(
                "INSERT INTO repo (id, name, root_path, namespace, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    id.as_str(),
                    name,
                    root_path,
                    self.namespace(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok(Repository {
            id,
            name: name.to_string(),
            root_path: root_path.to_string(),
            namespace: self.namespace().to_string(),
            created_at: now,
        })
    }

    /// Look up a repository by name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_repo_by_name(&self, name: &str) -> Result<Option<Repository>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT id, name, root_path, namespace, created_at FROM repo WHERE name = ?1",
                [name],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_repo(&row)?)),
            None => Ok(None),
        }
    }

    /// Count rows in a derived table for this repository.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub(crate) async fn count_for_repo(
        &self,
        table: &str,
        repo_id: &str,
    ) -> Result<i64, DatabaseError> {
        // table names come from a fixed internal set, never from input
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE repo_id = ?1");
        let mut rows = self.db().query(&sql, [repo_id]).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)?)
    }

    /// Count edges of a repository.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_edges(&self, repo_id: &str) -> Result<i64, DatabaseError> {
        self.count_for_repo("edge", repo_id).await
    }

    /// Refresh the aggregate index state after a walk.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if counting or the upsert fails.
    pub async fn refresh_index_state(
        &self,
        repo_id: &str,
    ) -> Result<RepoIndexState, DatabaseError> {
        let file_count = self.count_for_repo("file", repo_id).await?;
        let symbol_count = self.count_for_repo("symbol", repo_id).await?;
        let chunk_count = self.count_for_repo("chunk", repo_id).await?;
        let now = Utc::now();

        self.db()
            .execute(
                "INSERT INTO repo_index_state (repo_id, last_indexed_at, file_count, symbol_count, chunk_count)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (repo_id) DO UPDATE SET
                     last_indexed_at = excluded.last_indexed_at,
                     file_count = excluded.file_count,
                     symbol_count = excluded.symbol_count,
                     chunk_count = excluded.chunk_count",
                libsql::params![repo_id, now.to_rfc3339(), file_count, symbol_count, chunk_count],
            )
            .await?;

        Ok(RepoIndexState {
            repo_id: repo_id.to_string(),
            last_indexed_at: now,
            file_count,
            symbol_count,
            chunk_count,
        })
    }

    /// Read the aggregate index state.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_index_state(
        &self,
        repo_id: &str,
    ) -> Result<Option<RepoIndexState>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT repo_id, last_indexed_at, file_count, symbol_count, chunk_count
                 FROM repo_index_state WHERE repo_id = ?1",
                [repo_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(RepoIndexState {
                repo_id: row.get::<String>(0)?,
                last_indexed_at: parse_datetime(&row.get::<String>(1)?)?,
                file_count: row.get::<i64>(2)?,
                symbol_count: row.get::<i64>(3)?,
                chunk_count: row.get::<i64>(4)?,
            })),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_store;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn ensure_repo_is_idempotent() {
        let store = test_store().await;
        let a = store.ensure_repo("demo", "/tmp/demo").await.unwrap();
        let b = store.ensure_repo("demo", "/tmp/demo").await.unwrap();
        assert_eq!(a.id, b.id);
        assert!(a.id.starts_with("rep-"));
    }

    #[tokio::test]
    async fn index_state_roundtrip() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();
        let state = store.refresh_index_state(&repo.id).await.unwrap();
        assert_eq!(state.file_count, 0);

        let fetched = store.get_index_state(&repo.id).await.unwrap().unwrap();
        assert_eq!(fetched.repo_id, repo.id);
    }
}
