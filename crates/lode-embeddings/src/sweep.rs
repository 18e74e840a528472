//! Embedding sweep: fill in missing chunk and document embeddings.
//!
//! The sweep reads entities without an embedding row, embeds them in batches,
//! and writes the vectors back. A batch that fails stays unembedded — the next
//! sweep retries it. Partial failures never abort the sweep.

use lode_db::LodeStore;

use crate::client::EmbeddingClient;
use crate::error::EmbeddingError;

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub embedded: usize,
    pub failed_batches: usize,
}

/// Embed all chunks missing an embedding.
///
/// # Errors
///
/// Returns [`EmbeddingError::Database`] only for storage failures; backend
/// failures are counted per batch and retried on the next sweep.
pub async fn embed_missing_chunks(
    store: &LodeStore,
    client: &EmbeddingClient,
    repo_id: &str,
    batch_size: u32,
) -> Result<SweepStats, EmbeddingError> {
    let mut stats = SweepStats::default();

    loop {
        let chunks = store.chunks_missing_embedding(repo_id, batch_size).await?;
        if chunks.is_empty() {
            break;
        }

        let texts: Vec<String> = chunks
            .iter()
            .map(|c| client.truncate(&c.content).to_string())
            .collect();

        match client.embed_batch(&texts).await {
            Ok(vectors) => {
                for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
                    store.upsert_chunk_embedding(&chunk.id, vector).await?;
                    stats.embedded += 1;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, batch = chunks.len(), "chunk embedding batch failed");
                stats.failed_batches += 1;
                // The batch stays unembedded; stop so the sweep terminates
                break;
            }
        }
    }

    tracing::info!(
        embedded = stats.embedded,
        failed_batches = stats.failed_batches,
        "chunk embedding sweep finished"
    );
    Ok(stats)
}

/// Embed all documents missing an embedding.
///
/// # Errors
///
/// Returns [`EmbeddingError::Database`] only for storage failures.
pub async fn embed_missing_documents(
    store: &LodeStore,
    client: &EmbeddingClient,
    repo_id: &str,
    batch_size: u32,
) -> Result<SweepStats, EmbeddingError> {
    let mut stats = SweepStats::default();

    loop {
        let documents = store.documents_missing_embedding(repo_id, batch_size).await?;
        if documents.is_empty() {
            break;
        }

        let texts: Vec<String> = documents
            .iter()
            .map(|d| {
                let combined = format!("{}: {}", d.title, d.content);
                client.truncate(&combined).to_string()
            })
            .collect();

        match client.embed_batch(&texts).await {
            Ok(vectors) => {
                for (document, vector) in documents.iter().zip(vectors.iter()) {
                    store.upsert_document_embedding(&document.id, vector).await?;
                    stats.embedded += 1;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, batch = documents.len(), "document embedding batch failed");
                stats.failed_batches += 1;
                break;
            }
        }
    }

    tracing::info!(
        embedded = stats.embedded,
        failed_batches = stats.failed_batches,
        "document embedding sweep finished"
    );
    Ok(stats)
}
