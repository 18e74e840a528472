//! Document storage, FTS, vector search, and the document embedding sweep.

use chrono::Utc;

use lode_core::entities::Document;
use lode_core::enums::{DocSource, DocType};
use lode_core::hashing::content_hash_str;
use lode_core::ids::{PREFIX_DOCUMENT, generate_id};

use crate::error::DatabaseError;
use crate::helpers::{format_vector, parse_datetime, parse_enum};
use crate::repos::chunk::fts_query;
use crate::store::LodeStore;

fn row_to_document(row: &libsql::Row) -> Result<Document, DatabaseError> {
    Ok(Document {
        id: row.get::<String>(0)?,
        repo_id: row.get::<String>(1)?,
        path: row.get::<String>(2)?,
        doc_type: parse_enum(&row.get::<String>(3)?)?,
        title: row.get::<String>(4)?,
        content: row.get::<String>(5)?,
        source: parse_enum(&row.get::<String>(6)?)?,
        content_hash: row.get::<String>(7)?,
        updated_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

const DOC_COLUMNS: &str =
    "d.id, d.repo_id, d.path, d.doc_type, d.title, d.content, d.source, d.content_hash, d.updated_at";

/// A document scored by one retrieval arm.
#[derive(Debug, Clone)]
pub struct DocumentHit {
    pub document: Document,
    pub score: f64,
}

impl LodeStore {
    /// Insert or update a document. Unchanged content (same hash) is skipped.
    /// Returns the stored document and whether anything was written.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the lookup or write fails.
    pub async fn upsert_document(
        &self,
        repo_id: &str,
        path: &str,
        doc_type: DocType,
        title: &str,
        content: &str,
        source: DocSource,
    ) -> Result<(Document, bool), DatabaseError> {
        let hash = content_hash_str(content);
        let now = Utc::now();

        if let Some(existing) = self.get_document_by_path(repo_id, path).await? {
            if existing.content_hash == hash {
                return Ok((existing, false));
            }
            self.db()
                .execute(
                    "UPDATE document SET doc_type = ?1, title = ?2, content = ?3, source = ?4,
                            content_hash = ?5, updated_at = ?6
                     WHERE id = ?7",
                    libsql::params![
                        doc_type.as_str(),
                        title,
                        content,
                        source.as_str(),
                        hash.as_str(),
                        now.to_rfc3339(),
                        existing.id.as_str()
                    ],
                )
                .await?;
            // Content changed: the stored embedding is stale
            self.db()
                .execute(
                    "DELETE FROM document_embedding WHERE document_id = ?1",
                    [existing.id.as_str()],
                )
                .await?;
            let updated = self
                .get_document_by_path(repo_id, path)
                .await?
                .ok_or(DatabaseError::NoResult)?;
            return Ok((updated, true));
        }

        let id = generate_id(PREFIX_DOCUMENT)?;
        self.db()
            .execute(
                "INSERT INTO document (id, repo_id, path, doc_type, title, content, source, content_hash, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                libsql::params![
                    id.as_str(),
                    repo_id,
                    path,
                    doc_type.as_str(),
                    title,
                    content,
                    source.as_str(),
                    hash.as_str(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok((
            Document {
                id,
                repo_id: repo_id.to_string(),
                path: path.to_string(),
                doc_type,
                title: title.to_string(),
                content: content.to_string(),
                source,
                content_hash: hash,
                updated_at: now,
            },
            true,
        ))
    }

    /// Look up a document by path.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_document_by_path(
        &self,
        repo_id: &str,
        path: &str,
    ) -> Result<Option<Document>, DatabaseError> {
        let sql =
            format!("SELECT {DOC_COLUMNS} FROM document d WHERE d.repo_id = ?1 AND d.path = ?2");
        let mut rows = self.db().query(&sql, [repo_id, path]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_document(&row)?)),
            None => Ok(None),
        }
    }

    /// Look up a document by id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_document(&self, document_id: &str) -> Result<Option<Document>, DatabaseError> {
        let sql = format!("SELECT {DOC_COLUMNS} FROM document d WHERE d.id = ?1");
        let mut rows = self.db().query(&sql, [document_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_document(&row)?)),
            None => Ok(None),
        }
    }

    /// All documents of a repository.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_documents(&self, repo_id: &str) -> Result<Vec<Document>, DatabaseError> {
        let sql =
            format!("SELECT {DOC_COLUMNS} FROM document d WHERE d.repo_id = ?1 ORDER BY d.path");
        let mut rows = self.db().query(&sql, [repo_id]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_document(&row)?);
        }
        Ok(out)
    }

    /// FTS5 search over document title + content.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn fts_search_documents(
        &self,
        repo_id: &str,
        query: &str,
        top_k: u32,
    ) -> Result<Vec<DocumentHit>, DatabaseError> {
        let match_expr = fts_query(query);
        if match_expr.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {DOC_COLUMNS}, -bm25(document_fts) AS fts_score
             FROM document_fts
             JOIN document d ON d.rowid = document_fts.rowid
             WHERE document_fts MATCH ?1 AND d.repo_id = ?2
             ORDER BY bm25(document_fts)
             LIMIT {top_k}"
        );
        let mut rows = self
            .db()
            .query(&sql, libsql::params![match_expr.as_str(), repo_id])
            .await?;
        let mut hits = Vec::new();
        while let Some(row) = rows.next().await? {
            hits.push(DocumentHit {
                document: row_to_document(&row)?,
                score: row.get::<f64>(9)?,
            });
        }
        Ok(hits)
    }

    /// Vector search over document embeddings (cosine similarity).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn vector_search_documents(
        &self,
        repo_id: &str,
        query_embedding: &[f32],
        top_k: u32,
    ) -> Result<Vec<DocumentHit>, DatabaseError> {
        let literal = format_vector(query_embedding);
        let sql = format!(
            "SELECT {DOC_COLUMNS},
                    (1.0 - vector_distance_cos(de.embedding, vector32(?1))) AS vec_score
             FROM document_embedding de
             JOIN document d ON d.id = de.document_id
             WHERE d.repo_id = ?2
             ORDER BY vector_distance_cos(de.embedding, vector32(?1))
             LIMIT {top_k}"
        );
        let mut rows = self
            .db()
            .query(&sql, libsql::params![literal.as_str(), repo_id])
            .await?;
        let mut hits = Vec::new();
        while let Some(row) = rows.next().await? {
            hits.push(DocumentHit {
                document: row_to_document(&row)?,
                score: row.get::<f64>(9)?,
            });
        }
        Ok(hits)
    }

    /// Documents without an embedding row (sweep input).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn documents_missing_embedding(
        &self,
        repo_id: &str,
        limit: u32,
    ) -> Result<Vec<Document>, DatabaseError> {
        let sql = format!(
            "SELECT {DOC_COLUMNS} FROM document d
             LEFT JOIN document_embedding de ON de.document_id = d.id
             WHERE d.repo_id = ?1 AND de.document_id IS NULL
             ORDER BY d.rowid
             LIMIT {limit}"
        );
        let mut rows = self.db().query(&sql, [repo_id]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_document(&row)?);
        }
        Ok(out)
    }

    /// Store one document embedding (upsert).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails.
    pub async fn upsert_document_embedding(
        &self,
        document_id: &str,
        embedding: &[f32],
    ) -> Result<(), DatabaseError> {
        let literal = format_vector(embedding);
        self.db()
            .execute(
                "INSERT INTO document_embedding (document_id, embedding) VALUES (?1, vector32(?2))
                 ON CONFLICT (document_id) DO UPDATE SET embedding = excluded.embedding",
                libsql::params![document_id, literal.as_str()],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_store;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn upsert_skips_unchanged_content() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        let (doc, written) = store
            .upsert_document(
                &repo.id,
                "docs/limits.md",
                DocType::DocFile,
                "Limits",
                "Each user can have at most 10 active sessions.",
                DocSource::Human,
            )
            .await
            .unwrap();
        assert!(written);

        let (same, written_again) = store
            .upsert_document(
                &repo.id,
                "docs/limits.md",
                DocType::DocFile,
                "Limits",
                "Each user can have at most 10 active sessions.",
                DocSource::Human,
            )
            .await
            .unwrap();
        assert!(!written_again);
        assert_eq!(same.id, doc.id);
    }

    #[tokio::test]
    async fn changed_content_invalidates_embedding() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        let (doc, _) = store
            .upsert_document(
                &repo.id,
                "docs/a.md",
                DocType::DocFile,
                "A",
                "version one",
                DocSource::Human,
            )
            .await
            .unwrap();
        store
            .upsert_document_embedding(&doc.id, &[0.1, 0.2, 0.3])
            .await
            .unwrap();

        store
            .upsert_document(
                &repo.id,
                "docs/a.md",
                DocType::DocFile,
                "A",
                "version two",
                DocSource::Human,
            )
            .await
            .unwrap();

        let missing = store.documents_missing_embedding(&repo.id, 10).await.unwrap();
        assert_eq!(missing.len(), 1, "stale embedding must be dropped");
    }

    #[tokio::test]
    async fn document_fts_matches_title_and_content() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        store
            .upsert_document(
                &repo.id,
                "docs/sessions.md",
                DocType::DocFile,
                "Session limits",
                "Each user can have at most 10 active sessions.",
                DocSource::Human,
            )
            .await
            .unwrap();
        store
            .upsert_document(
                &repo.id,
                "docs/other.md",
                DocType::DocFile,
                "Unrelated",
                "Nothing to see here.",
                DocSource::Human,
            )
            .await
            .unwrap();

        let hits = store
            .fts_search_documents(&repo.id, "sessions", 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.path, "docs/sessions.md");
    }
}
