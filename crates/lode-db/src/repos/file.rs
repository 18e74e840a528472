//! File records and single-file deletion with derived-data cleanup.

use lode_core::entities::FileRecord;
use lode_core::enums::TagSource;

use crate::error::DatabaseError;
use crate::helpers::{parse_datetime, parse_enum};
use crate::store::LodeStore;

pub(crate) fn row_to_file(row: &libsql::Row) -> Result<FileRecord, DatabaseError> {
    Ok(FileRecord {
        id: row.get::<String>(0)?,
        repo_id: row.get::<String>(1)?,
        path: row.get::<String>(2)?,
        language: parse_enum(&row.get::<String>(3)?)?,
        content_hash: row.get::<String>(4)?,
        mtime: parse_datetime(&row.get::<String>(5)?)?,
        updated_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

const FILE_COLUMNS: &str = "id, repo_id, path, language, content_hash, mtime, updated_at";

impl LodeStore {
    /// Look up a file by repository-relative path.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_file_by_path(
        &self,
        repo_id: &str,
        path: &str,
    ) -> Result<Option<FileRecord>, DatabaseError> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM file WHERE repo_id = ?1 AND path = ?2");
        let mut rows = self.db().query(&sql, [repo_id, path]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_file(&row)?)),
            None => Ok(None),
        }
    }

    /// Look up a file by id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_file(&self, file_id: &str) -> Result<Option<FileRecord>, DatabaseError> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM file WHERE id = ?1");
        let mut rows = self.db().query(&sql, [file_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_file(&row)?)),
            None => Ok(None),
        }
    }

    /// The most recent `updated_at` across a set of file paths.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a lookup fails.
    pub async fn latest_file_update(
        &self,
        repo_id: &str,
        paths: &[String],
    ) -> Result<Option<chrono::DateTime<chrono::Utc>>, DatabaseError> {
        let mut newest = None;
        for path in paths {
            if let Some(file) = self.get_file_by_path(repo_id, path).await? {
                newest = Some(match newest {
                    Some(current) if current > file.updated_at => current,
                    _ => file.updated_at,
                });
            }
        }
        Ok(newest)
    }

    /// Delete a file and all derived data in one transaction.
    ///
    /// Rebuildable tags (`RULE`, `AUTO`, `SEMANTIC_MATCH`) on the file, its
    /// symbols, and its chunks are purged; `MANUAL` tags survive. Edges
    /// evidenced by this file and the file row itself (cascading to symbols,
    /// chunks, and embeddings) go last.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` and leaves storage unchanged on failure.
    pub async fn delete_file(&self, repo_id: &str, file_id: &str) -> Result<(), DatabaseError> {
        let tx = self.db().transaction().await?;

        tx.execute(
            "DELETE FROM entity_tag
             WHERE repo_id = ?1
               AND source != ?2
               AND (
                   (entity_kind = 'file' AND entity_id = ?3)
                   OR (entity_kind = 'symbol' AND entity_id IN (SELECT id FROM symbol WHERE file_id = ?3))
                   OR (entity_kind = 'chunk' AND entity_id IN (SELECT id FROM chunk WHERE file_id = ?3))
               )",
            libsql::params![repo_id, TagSource::Manual.as_str(), file_id],
        )
        .await?;
        tx.execute("DELETE FROM edge WHERE evidence_file_id = ?1", [file_id])
            .await?;
        tx.execute("DELETE FROM file WHERE id = ?1", [file_id])
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::repos::indexing::NewEdge;
    use crate::test_support::{empty_file_data, sample_chunk, sample_symbol, test_store};
    use lode_core::enums::{EdgeKind, EntityKind, SymbolKind, TagSource};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn delete_file_cascades_and_preserves_manual_tags() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        let mut data = empty_file_data("auth.py", "h1");
        data.symbols = vec![sample_symbol("User", "User", SymbolKind::Class)];
        data.chunks = vec![sample_chunk("class User: ...", Some("User"))];
        data.edges = vec![NewEdge {
            kind: EdgeKind::Imports,
            src: None,
            dst: "User".to_string(),
            confidence: 1.0,
            evidence_start_line: 1,
            evidence_end_line: 1,
        }];
        store.apply_file_index(&repo.id, &data).await.unwrap();

        let file = store
            .get_file_by_path(&repo.id, "auth.py")
            .await
            .unwrap()
            .unwrap();

        // One manual and one rule tag on the file
        store
            .tag_entity(
                &repo.id,
                "keep-me",
                EntityKind::File,
                &file.id,
                TagSource::Manual,
                1.0,
            )
            .await
            .unwrap();
        store
            .tag_entity(
                &repo.id,
                "auto-lang",
                EntityKind::File,
                &file.id,
                TagSource::Rule,
                1.0,
            )
            .await
            .unwrap();

        store.delete_file(&repo.id, &file.id).await.unwrap();

        assert!(
            store
                .get_file_by_path(&repo.id, "auth.py")
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(store.count_for_repo("symbol", &repo.id).await.unwrap(), 0);
        assert_eq!(store.count_for_repo("chunk", &repo.id).await.unwrap(), 0);
        assert_eq!(store.count_for_repo("edge", &repo.id).await.unwrap(), 0);

        let tags = store
            .tags_for_entity(EntityKind::File, &file.id)
            .await
            .unwrap();
        let names: Vec<&str> = tags.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["keep-me"], "manual tag must survive");
    }

    #[tokio::test]
    async fn latest_file_update_picks_newest() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();
        store
            .apply_file_index(&repo.id, &empty_file_data("a.py", "h1"))
            .await
            .unwrap();
        store
            .apply_file_index(&repo.id, &empty_file_data("b.py", "h2"))
            .await
            .unwrap();

        let newest = store
            .latest_file_update(&repo.id, &["a.py".to_string(), "b.py".to_string()])
            .await
            .unwrap();
        assert!(newest.is_some());

        let none = store
            .latest_file_update(&repo.id, &["missing.py".to_string()])
            .await
            .unwrap();
        assert!(none.is_none());
    }
}
