//! Chunk retrieval: by id, FTS5 match, vector similarity, and the embedding
//! sweep queries.

use lode_core::entities::Chunk;

use crate::error::DatabaseError;
use crate::helpers::format_vector;
use crate::store::LodeStore;

fn row_to_chunk(row: &libsql::Row) -> Result<Chunk, DatabaseError> {
    Ok(Chunk {
        id: row.get::<String>(0)?,
        repo_id: row.get::<String>(1)?,
        file_id: row.get::<String>(2)?,
        symbol_id: row.get::<Option<String>>(3)?,
        start_line: u32::try_from(row.get::<i64>(4)?).unwrap_or(0),
        end_line: u32::try_from(row.get::<i64>(5)?).unwrap_or(0),
        content: row.get::<String>(6)?,
        content_hash: row.get::<String>(7)?,
    })
}

const CHUNK_COLUMNS: &str =
    "c.id, c.repo_id, c.file_id, c.symbol_id, c.start_line, c.end_line, c.content, c.content_hash";

/// A chunk scored by one retrieval arm, with its file path for display.
#[derive(Debug, Clone)]
pub struct ChunkHit {
    pub chunk: Chunk,
    pub file_path: String,
    pub score: f64,
}

/// Build an FTS5 query from free text: each alphanumeric token quoted, tokens
/// ANDed — websearch-style semantics without FTS5 syntax errors on raw input.
#[must_use]
pub fn fts_query(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|token| !token.is_empty())
        .map(|token| format!("\"{token}\""))
        .collect::<Vec<_>>()
        .join(" ")
}

impl LodeStore {
    /// Fetch a chunk by id (with its file path).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_chunk(
        &self,
        chunk_id: &str,
    ) -> Result<Option<(Chunk, String)>, DatabaseError> {
        let sql = format!(
            "SELECT {CHUNK_COLUMNS}, f.path FROM chunk c
             JOIN file f ON f.id = c.file_id WHERE c.id = ?1"
        );
        let mut rows = self.db().query(&sql, [chunk_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some((row_to_chunk(&row)?, row.get::<String>(8)?))),
            None => Ok(None),
        }
    }

    /// Chunks covering a symbol, ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn chunks_for_symbol(&self, symbol_id: &str) -> Result<Vec<Chunk>, DatabaseError> {
        let sql = format!(
            "SELECT {CHUNK_COLUMNS} FROM chunk c WHERE c.symbol_id = ?1 ORDER BY c.start_line"
        );
        let mut rows = self.db().query(&sql, [symbol_id]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_chunk(&row)?);
        }
        Ok(out)
    }

    /// Chunks of a file, ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn chunks_for_file(&self, file_id: &str) -> Result<Vec<Chunk>, DatabaseError> {
        let sql = format!(
            "SELECT {CHUNK_COLUMNS} FROM chunk c WHERE c.file_id = ?1 ORDER BY c.start_line"
        );
        let mut rows = self.db().query(&sql, [file_id]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_chunk(&row)?);
        }
        Ok(out)
    }

    /// FTS5 search over chunk content. Scores are `-bm25(...)` so higher is
    /// more relevant.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails. An empty or symbol-only
    /// query returns no results rather than an FTS syntax error.
    pub async fn fts_search_chunks(
        &self,
        repo_id: &str,
        query: &str,
        top_k: u32,
    ) -> Result<Vec<ChunkHit>, DatabaseError> {
        let match_expr = fts_query(query);
        if match_expr.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {CHUNK_COLUMNS}, f.path, -bm25(chunk_fts) AS fts_score
             FROM chunk_fts
             JOIN chunk c ON c.rowid = chunk_fts.rowid
             JOIN file f ON f.id = c.file_id
             WHERE chunk_fts MATCH ?1 AND c.repo_id = ?2
             ORDER BY bm25(chunk_fts)
             LIMIT {top_k}"
        );
        let mut rows = self
            .db()
            .query(&sql, libsql::params![match_expr.as_str(), repo_id])
            .await?;
        let mut hits = Vec::new();
        while let Some(row) = rows.next().await? {
            hits.push(ChunkHit {
                chunk: row_to_chunk(&row)?,
                file_path: row.get::<String>(8)?,
                score: row.get::<f64>(9)?,
            });
        }
        Ok(hits)
    }

    /// Vector search over chunk embeddings. Scores are cosine similarity
    /// (`1 − distance`), best first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn vector_search_chunks(
        &self,
        repo_id: &str,
        query_embedding: &[f32],
        top_k: u32,
    ) -> Result<Vec<ChunkHit>, DatabaseError> {
        let literal = format_vector(query_embedding);
        let sql = format!(
            "SELECT {CHUNK_COLUMNS}, f.path,
                    (1.0 - vector_distance_cos(ce.embedding, vector32(?1))) AS vec_score
             FROM chunk_embedding ce
             JOIN chunk c ON c.id = ce.chunk_id
             JOIN file f ON f.id = c.file_id
             WHERE c.repo_id = ?2
             ORDER BY vector_distance_cos(ce.embedding, vector32(?1))
             LIMIT {top_k}"
        );
        let mut rows = self
            .db()
            .query(&sql, libsql::params![literal.as_str(), repo_id])
            .await?;
        let mut hits = Vec::new();
        while let Some(row) = rows.next().await? {
            hits.push(ChunkHit {
                chunk: row_to_chunk(&row)?,
                file_path: row.get::<String>(8)?,
                score: row.get::<f64>(9)?,
            });
        }
        Ok(hits)
    }

    /// Chunks without an embedding row, oldest first (sweep input).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn chunks_missing_embedding(
        &self,
        repo_id: &str,
        limit: u32,
    ) -> Result<Vec<Chunk>, DatabaseError> {
        let sql = format!(
            "SELECT {CHUNK_COLUMNS} FROM chunk c
             LEFT JOIN chunk_embedding ce ON ce.chunk_id = c.id
             WHERE c.repo_id = ?1 AND ce.chunk_id IS NULL
             ORDER BY c.rowid
             LIMIT {limit}"
        );
        let mut rows = self.db().query(&sql, [repo_id]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_chunk(&row)?);
        }
        Ok(out)
    }

    /// Store one chunk embedding (upsert).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails.
    pub async fn upsert_chunk_embedding(
        &self,
        chunk_id: &str,
        embedding: &[f32],
    ) -> Result<(), DatabaseError> {
        let literal = format_vector(embedding);
        self.db()
            .execute(
                "INSERT INTO chunk_embedding (chunk_id, embedding) VALUES (?1, vector32(?2))
                 ON CONFLICT (chunk_id) DO UPDATE SET embedding = excluded.embedding",
                libsql::params![chunk_id, literal.as_str()],
            )
            .await?;
        Ok(())
    }

    /// Average similarity between a document's embedding and its `k` nearest
    /// chunk embeddings. `None` when the document has no embedding.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn avg_top_chunk_similarity(
        &self,
        repo_id: &str,
        document_id: &str,
        k: u32,
    ) -> Result<Option<(f64, i64)>, DatabaseError> {
        let mut has_embedding = self
            .db()
            .query(
                "SELECT 1 FROM document_embedding WHERE document_id = ?1",
                [document_id],
            )
            .await?;
        if has_embedding.next().await?.is_none() {
            return Ok(None);
        }

        let sql = format!(
            "SELECT AVG(sim), COUNT(*) FROM (
                 SELECT (1.0 - vector_distance_cos(
                     ce.embedding,
                     (SELECT embedding FROM document_embedding WHERE document_id = ?1)
                 )) AS sim
                 FROM chunk_embedding ce
                 JOIN chunk c ON c.id = ce.chunk_id
                 WHERE c.repo_id = ?2
                 ORDER BY sim DESC
                 LIMIT {k}
             )"
        );
        let mut rows = self
            .db()
            .query(&sql, libsql::params![document_id, repo_id])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let avg = row.get::<Option<f64>>(0)?;
        let count = row.get::<i64>(1)?;
        Ok(avg.map(|a| (a, count)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{empty_file_data, sample_chunk, test_store};
    use pretty_assertions::assert_eq;

    #[test]
    fn fts_query_quotes_tokens() {
        assert_eq!(fts_query("max sessions: 10"), "\"max\" \"sessions\" \"10\"");
        assert_eq!(fts_query("  "), "");
        assert_eq!(fts_query(">= 10"), "\"10\"");
    }

    /// Deterministic embedding for tests: unit-norm direction from a seed.
    fn synthetic_embedding(seed: u32) -> Vec<f32> {
        (0..8)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let x = ((seed * 31 + i) as f32) / 7.0;
                x.sin()
            })
            .collect()
    }

    #[tokio::test]
    async fn fts_search_finds_matching_chunk() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        let mut data = empty_file_data("auth.py", "h1");
        data.chunks = vec![
            sample_chunk("def login(self, password): check(password)", None),
            sample_chunk("def totally_unrelated(): pass", None),
        ];
        store.apply_file_index(&repo.id, &data).await.unwrap();

        let hits = store.fts_search_chunks(&repo.id, "login", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].chunk.content.contains("login"));
        assert!(hits[0].score > 0.0, "bm25 score should be positive");
        assert_eq!(hits[0].file_path, "auth.py");
    }

    #[tokio::test]
    async fn fts_porter_stemming_matches_variants() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        let mut data = empty_file_data("runner.py", "h1");
        data.chunks = vec![sample_chunk("spawning new worker threads", None)];
        store.apply_file_index(&repo.id, &data).await.unwrap();

        let hits = store.fts_search_chunks(&repo.id, "spawn", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn vector_search_ranks_by_cosine() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        let mut data = empty_file_data("a.py", "h1");
        data.chunks = vec![sample_chunk("alpha", None), sample_chunk("beta", None)];
        store.apply_file_index(&repo.id, &data).await.unwrap();

        let chunks = {
            let file = store.get_file_by_path(&repo.id, "a.py").await.unwrap().unwrap();
            store.chunks_for_file(&file.id).await.unwrap()
        };
        let query = synthetic_embedding(1);
        store
            .upsert_chunk_embedding(&chunks[0].id, &query)
            .await
            .unwrap();
        store
            .upsert_chunk_embedding(&chunks[1].id, &synthetic_embedding(40))
            .await
            .unwrap();

        let hits = store
            .vector_search_chunks(&repo.id, &query, 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.id, chunks[0].id, "self-match ranks first");
        assert!(hits[0].score > 0.99, "self-similarity ~1, got {}", hits[0].score);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn missing_embedding_sweep_shrinks() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        let mut data = empty_file_data("a.py", "h1");
        data.chunks = vec![sample_chunk("one", None), sample_chunk("two", None)];
        store.apply_file_index(&repo.id, &data).await.unwrap();

        let missing = store.chunks_missing_embedding(&repo.id, 10).await.unwrap();
        assert_eq!(missing.len(), 2);

        store
            .upsert_chunk_embedding(&missing[0].id, &synthetic_embedding(1))
            .await
            .unwrap();
        let missing = store.chunks_missing_embedding(&repo.id, 10).await.unwrap();
        assert_eq!(missing.len(), 1);
    }

    #[tokio::test]
    async fn embeddings_cascade_with_chunks() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        let mut data = empty_file_data("a.py", "h1");
        data.chunks = vec![sample_chunk("one", None)];
        store.apply_file_index(&repo.id, &data).await.unwrap();
        let file = store.get_file_by_path(&repo.id, "a.py").await.unwrap().unwrap();
        let chunks = store.chunks_for_file(&file.id).await.unwrap();
        store
            .upsert_chunk_embedding(&chunks[0].id, &synthetic_embedding(1))
            .await
            .unwrap();

        store.delete_file(&repo.id, &file.id).await.unwrap();

        let mut rows = store
            .db()
            .query("SELECT COUNT(*) FROM chunk_embedding", ())
            .await
            .unwrap();
        let count = rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap();
        assert_eq!(count, 0, "no orphan embeddings after file delete");
    }
}
