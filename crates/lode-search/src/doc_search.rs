//! Hybrid search over documentation rows — the same fusion as the code
//! variant, scored over document FTS and document embeddings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use lode_config::SearchConfig;
use lode_core::enums::DocType;
use lode_db::LodeStore;
use lode_db::repos::document::DocumentHit;
use lode_embeddings::EmbeddingClient;

use crate::error::SearchError;
use crate::hybrid::SearchWeights;

/// One ranked documentation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocSearchResult {
    pub document_id: String,
    pub path: String,
    pub title: String,
    pub doc_type: DocType,
    pub content: String,
    pub score: f64,
    pub vec_score: Option<f64>,
    pub fts_score: Option<f64>,
}

/// Hybrid documentation search. Embedding failure degrades to FTS-only.
///
/// # Errors
///
/// Returns [`SearchError::InvalidQuery`] for an empty query and
/// [`SearchError::Database`] if retrieval fails.
pub async fn doc_search(
    store: &LodeStore,
    embeddings: &EmbeddingClient,
    repo_id: &str,
    query: &str,
    weights: SearchWeights,
    config: &SearchConfig,
) -> Result<Vec<DocSearchResult>, SearchError> {
    let query_embedding = match embeddings.embed(embeddings.truncate(query)).await {
        Ok(vector) => Some(vector),
        Err(e) => {
            tracing::warn!(error = %e, "query embedding failed; vector arm disabled");
            None
        }
    };
    doc_search_with_embedding(
        store,
        repo_id,
        query,
        query_embedding.as_deref(),
        weights,
        config,
    )
    .await
}

/// Documentation search with a pre-computed query embedding.
///
/// # Errors
///
/// Returns [`SearchError::InvalidQuery`] for an empty query and
/// [`SearchError::Database`] if retrieval fails.
pub async fn doc_search_with_embedding(
    store: &LodeStore,
    repo_id: &str,
    query: &str,
    query_embedding: Option<&[f32]>,
    weights: SearchWeights,
    config: &SearchConfig,
) -> Result<Vec<DocSearchResult>, SearchError> {
    if query.trim().is_empty() {
        return Err(SearchError::InvalidQuery(
            "search query cannot be empty".to_string(),
        ));
    }

    let vector_hits = match query_embedding {
        Some(embedding) => {
            store
                .vector_search_documents(repo_id, embedding, config.vector_top_k)
                .await?
        }
        None => Vec::new(),
    };
    let fts_hits = store
        .fts_search_documents(repo_id, query, config.fts_top_k)
        .await?;

    let mut results = fuse_documents(&vector_hits, &fts_hits, weights);
    results.truncate(config.final_top_k as usize);
    Ok(results)
}

fn fuse_documents(
    vector_hits: &[DocumentHit],
    fts_hits: &[DocumentHit],
    weights: SearchWeights,
) -> Vec<DocSearchResult> {
    let max_vec = vector_hits
        .iter()
        .map(|h| h.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let max_fts = fts_hits
        .iter()
        .map(|h| h.score)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut merged: HashMap<String, DocSearchResult> = HashMap::new();

    for hit in vector_hits {
        let normalized = if max_vec > 0.0 { hit.score / max_vec } else { 0.0 };
        merged
            .entry(hit.document.id.clone())
            .or_insert_with(|| blank(hit))
            .vec_score = Some(normalized);
    }
    for hit in fts_hits {
        let normalized = if max_fts > 0.0 { hit.score / max_fts } else { 0.0 };
        merged
            .entry(hit.document.id.clone())
            .or_insert_with(|| blank(hit))
            .fts_score = Some(normalized);
    }

    let mut results: Vec<DocSearchResult> = merged
        .into_values()
        .map(|mut result| {
            result.score = weights.vector * result.vec_score.unwrap_or(0.0)
                + weights.fts * result.fts_score.unwrap_or(0.0);
            result
        })
        .collect();
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.document_id.cmp(&b.document_id))
    });
    results
}

fn blank(hit: &DocumentHit) -> DocSearchResult {
    DocSearchResult {
        document_id: hit.document.id.clone(),
        path: hit.document.path.clone(),
        title: hit.document.title.clone(),
        doc_type: hit.document.doc_type,
        content: hit.document.content.clone(),
        score: 0.0,
        vec_score: None,
        fts_score: None,
    }
}
