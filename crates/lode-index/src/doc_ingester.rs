//! Documentation ingestion.
//!
//! Scans documentation files, extracts them into sections, and stores them as
//! `document` rows. Small documents become one row; oversized ones are split
//! into chunk-level rows (`path#NNNN`, title = section breadcrumb) so each
//! row fits the embedding budget. Unchanged content (same hash) is skipped.
//! SQL files are stored whole as `SQL_SCHEMA` documents.
//!
//! Each new or updated document also enqueues a `validate_document` job for
//! the documentation pipeline.

use std::path::Path;

use lode_core::enums::{DocSource, DocType};
use lode_db::LodeStore;
use lode_kb::{ChunkingConfig, chunk_extracted, extract_document};

use crate::error::IndexError;
use crate::scanner::scan_docs;

/// Documents whose full text fits here are stored as a single row.
const SINGLE_DOC_MAX_CHARS: usize = 4_000;

/// Counts from one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocIngestStats {
    pub ingested: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Ingest all documentation files under `repo_root`.
///
/// Per-file extraction failures are logged and counted, never fatal.
///
/// # Errors
///
/// Returns [`IndexError::Database`] if storage fails.
pub async fn ingest_documents(
    store: &LodeStore,
    repo_id: &str,
    repo_root: &Path,
) -> Result<DocIngestStats, IndexError> {
    let mut stats = DocIngestStats::default();

    for path in scan_docs(repo_root) {
        let Ok(rel_path) = path.strip_prefix(repo_root) else {
            continue;
        };
        let rel_path = rel_path.to_string_lossy().into_owned();

        match ingest_one(store, repo_id, &path, &rel_path).await {
            Ok(IngestOutcome { written, skipped }) => {
                stats.ingested += written;
                stats.skipped += skipped;
            }
            Err(IndexError::Database(e)) => return Err(IndexError::Database(e)),
            Err(e) => {
                tracing::warn!(path = %rel_path, error = %e, "failed to ingest document");
                stats.failed += 1;
            }
        }
    }

    tracing::info!(
        ingested = stats.ingested,
        skipped = stats.skipped,
        failed = stats.failed,
        "documentation ingestion finished"
    );
    Ok(stats)
}

struct IngestOutcome {
    written: usize,
    skipped: usize,
}

async fn ingest_one(
    store: &LodeStore,
    repo_id: &str,
    abs_path: &Path,
    rel_path: &str,
) -> Result<IngestOutcome, IndexError> {
    // SQL dumps are stored whole as schema documents
    let ext = abs_path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if ext == "sql" {
        let content = std::fs::read_to_string(abs_path)?;
        let title = abs_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("schema")
            .to_string();
        return store_row(store, repo_id, rel_path, DocType::SqlSchema, &title, &content).await;
    }

    let document = extract_document(abs_path)
        .map_err(|e| IndexError::InvalidPath(format!("{rel_path}: {e}")))?;
    let full_text = document.full_text();

    if full_text.len() <= SINGLE_DOC_MAX_CHARS {
        return store_row(
            store,
            repo_id,
            rel_path,
            DocType::DocFile,
            &document.title,
            &full_text,
        )
        .await;
    }

    // Oversized: one row per chunk, breadcrumb in the title
    let chunks = chunk_extracted(&document, &ChunkingConfig::default());
    let mut written = 0usize;
    let mut skipped = 0usize;
    for chunk in &chunks {
        let chunk_path = format!("{rel_path}#{:04}", chunk.chunk_index);
        let title = if chunk.section_path.is_empty() {
            document.title.clone()
        } else {
            format!("{} — {}", document.title, chunk.section_path.join(" > "))
        };
        let outcome = store_row(
            store,
            repo_id,
            &chunk_path,
            DocType::DocFile,
            &title,
            &chunk.content,
        )
        .await?;
        written += outcome.written;
        skipped += outcome.skipped;
    }
    Ok(IngestOutcome { written, skipped })
}

async fn store_row(
    store: &LodeStore,
    repo_id: &str,
    path: &str,
    doc_type: DocType,
    title: &str,
    content: &str,
) -> Result<IngestOutcome, IndexError> {
    let (document, written) = store
        .upsert_document(repo_id, path, doc_type, title, content, DocSource::Human)
        .await?;
    if written {
        store
            .enqueue_job(
                repo_id,
                "validate_document",
                &serde_json::json!({"document_id": document.id}),
            )
            .await?;
        Ok(IngestOutcome {
            written: 1,
            skipped: 0,
        })
    } else {
        Ok(IngestOutcome {
            written: 0,
            skipped: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn small_doc_is_one_row_and_skips_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "docs/limits.md",
            "# Limits\n\nEach user can have at most 10 active sessions.\n",
        );
        let store = LodeStore::open_in_memory().await.unwrap();
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        let stats = ingest_documents(&store, &repo.id, dir.path()).await.unwrap();
        assert_eq!(stats.ingested, 1);

        let doc = store
            .get_document_by_path(&repo.id, "docs/limits.md")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.title, "Limits");
        assert!(doc.content.contains("at most 10 active sessions"));
        assert_eq!(doc.doc_type, DocType::DocFile);

        // Validation job queued for the new document
        let job = store.next_pending_job(&repo.id).await.unwrap().unwrap();
        assert_eq!(job.job_type, "validate_document");

        let rerun = ingest_documents(&store, &repo.id, dir.path()).await.unwrap();
        assert_eq!(rerun.ingested, 0);
        assert_eq!(rerun.skipped, 1);
    }

    #[tokio::test]
    async fn oversized_doc_splits_into_chunk_rows() {
        let dir = tempfile::tempdir().unwrap();
        let section = "This paragraph talks about deployment and configuration at length. "
            .repeat(40);
        let body = format!("# Manual\n\n## Install\n\n{section}\n\n## Operate\n\n{section}\n");
        write(dir.path(), "docs/manual.md", &body);

        let store = LodeStore::open_in_memory().await.unwrap();
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();
        ingest_documents(&store, &repo.id, dir.path()).await.unwrap();

        let documents = store.list_documents(&repo.id).await.unwrap();
        assert!(documents.len() >= 2, "split into chunk rows");
        assert!(documents.iter().all(|d| d.path.starts_with("docs/manual.md#")));
        assert!(documents.iter().any(|d| d.title.contains("Install")));
    }

    #[tokio::test]
    async fn sql_dump_stored_as_schema_document() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "db/schema.sql", "CREATE TABLE users (id uuid);\n");

        let store = LodeStore::open_in_memory().await.unwrap();
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();
        ingest_documents(&store, &repo.id, dir.path()).await.unwrap();

        let doc = store
            .get_document_by_path(&repo.id, "db/schema.sql")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.doc_type, DocType::SqlSchema);
    }
}
