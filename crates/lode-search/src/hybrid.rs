//! Hybrid search over code chunks.
//!
//! Two retrieval arms run against the chunk set — vector similarity (cosine,
//! `1 − distance`) and FTS5 relevance — each max-normalized to `[0, 1]`, then
//! fused with a tag boost:
//!
//! ```text
//! score = w_v · vec_norm + w_f · fts_norm + w_t · tag_boost
//! ```
//!
//! Default weights are `(0.55, 0.35, 0.10)`; claim verification flips toward
//! FTS with `(0.40, 0.50, 0.10)` because enforcement patterns match exact
//! terms. Tag filters apply *after* fusion so neither arm is starved. Results
//! are deterministic for identical inputs; ties break by chunk id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use lode_config::SearchConfig;
use lode_db::LodeStore;
use lode_db::repos::chunk::ChunkHit;
use lode_embeddings::EmbeddingClient;

use crate::error::SearchError;

/// Fusion weights for the three signals.
#[derive(Debug, Clone, Copy)]
pub struct SearchWeights {
    pub vector: f64,
    pub fts: f64,
    pub tag: f64,
}

impl Default for SearchWeights {
    fn default() -> Self {
        Self {
            vector: 0.55,
            fts: 0.35,
            tag: 0.10,
        }
    }
}

impl SearchWeights {
    /// Claim-verification variant: FTS-heavy, because limit enforcement shows
    /// up as exact terms (`maximum`, `>= 10`) more than as semantics.
    #[must_use]
    pub const fn claim_verification() -> Self {
        Self {
            vector: 0.40,
            fts: 0.50,
            tag: 0.10,
        }
    }

    #[must_use]
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            vector: config.vector_weight,
            fts: config.fts_weight,
            tag: config.tag_weight,
        }
    }
}

/// Tag filters, applied after fusion.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Keep chunks carrying at least one of these tags.
    pub tags_any: Vec<String>,
    /// Keep chunks carrying all of these tags.
    pub tags_all: Vec<String>,
}

/// One ranked result with full explainability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridSearchResult {
    pub chunk_id: String,
    pub file_id: String,
    pub symbol_id: Option<String>,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    /// Fused score.
    pub score: f64,
    /// Rank within the vector arm (1-based), if present there.
    pub vec_rank: Option<u32>,
    pub vec_score: Option<f64>,
    /// Rank within the FTS arm (1-based), if present there.
    pub fts_rank: Option<u32>,
    pub fts_score: Option<f64>,
    pub matched_tags: Vec<String>,
    pub tag_boost: f64,
}

/// Run hybrid search: embed the query, retrieve both arms, fuse.
///
/// A failed embedding call degrades to FTS-only retrieval rather than
/// failing the search; a failed tag lookup degrades to zero boosts.
///
/// # Errors
///
/// Returns [`SearchError::InvalidQuery`] for an empty query and
/// [`SearchError::Database`] if chunk retrieval itself fails.
#[allow(clippy::too_many_arguments)]
pub async fn hybrid_search(
    store: &LodeStore,
    embeddings: &EmbeddingClient,
    repo_id: &str,
    query: &str,
    filters: &SearchFilters,
    weights: SearchWeights,
    config: &SearchConfig,
) -> Result<Vec<HybridSearchResult>, SearchError> {
    let query_embedding = match embeddings.embed(embeddings.truncate(query)).await {
        Ok(vector) => Some(vector),
        Err(e) => {
            tracing::warn!(error = %e, "query embedding failed; vector arm disabled");
            None
        }
    };
    hybrid_search_with_embedding(
        store,
        repo_id,
        query,
        query_embedding.as_deref(),
        filters,
        weights,
        config,
    )
    .await
}

/// Hybrid search with a pre-computed query embedding (`None` disables the
/// vector arm).
///
/// # Errors
///
/// Returns [`SearchError::InvalidQuery`] for an empty query and
/// [`SearchError::Database`] if chunk retrieval fails.
pub async fn hybrid_search_with_embedding(
    store: &LodeStore,
    repo_id: &str,
    query: &str,
    query_embedding: Option<&[f32]>,
    filters: &SearchFilters,
    weights: SearchWeights,
    config: &SearchConfig,
) -> Result<Vec<HybridSearchResult>, SearchError> {
    if query.trim().is_empty() {
        return Err(SearchError::InvalidQuery(
            "search query cannot be empty".to_string(),
        ));
    }

    let vector_hits = match query_embedding {
        Some(embedding) => {
            store
                .vector_search_chunks(repo_id, embedding, config.vector_top_k)
                .await?
        }
        None => Vec::new(),
    };
    let fts_hits = store
        .fts_search_chunks(repo_id, query, config.fts_top_k)
        .await?;

    // Tag side-lookup failure never aborts the search
    let chunk_ids: Vec<String> = vector_hits
        .iter()
        .chain(fts_hits.iter())
        .map(|hit| hit.chunk.id.clone())
        .collect();
    let chunk_tags = match store.tags_for_chunks(&chunk_ids).await {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(error = %e, "tag lookup failed; tag boosts disabled");
            HashMap::new()
        }
    };
    let relevant_tags = query_relevant_tags(store, repo_id, query).await;

    let mut results = fuse(&vector_hits, &fts_hits, &chunk_tags, &relevant_tags, weights);
    apply_tag_filters(&mut results, filters);
    results.truncate(config.final_top_k as usize);
    Ok(results)
}

/// Repository tags whose names appear in the query text.
async fn query_relevant_tags(store: &LodeStore, repo_id: &str, query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    match store.list_tags(repo_id).await {
        Ok(tags) => tags
            .into_iter()
            .filter(|(tag, _)| lowered.contains(&tag.name.to_lowercase()))
            .map(|(tag, _)| tag.name)
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "tag listing failed; tag boosts disabled");
            Vec::new()
        }
    }
}

/// Pure fusion of the two arms (exposed for the doc variant and tests).
pub(crate) fn fuse(
    vector_hits: &[ChunkHit],
    fts_hits: &[ChunkHit],
    chunk_tags: &HashMap<String, Vec<String>>,
    relevant_tags: &[String],
    weights: SearchWeights,
) -> Vec<HybridSearchResult> {
    let max_vec = vector_hits
        .iter()
        .map(|h| h.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let max_fts = fts_hits
        .iter()
        .map(|h| h.score)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut merged: HashMap<String, HybridSearchResult> = HashMap::new();

    for (rank, hit) in vector_hits.iter().enumerate() {
        let normalized = if max_vec > 0.0 { hit.score / max_vec } else { 0.0 };
        let entry = merged
            .entry(hit.chunk.id.clone())
            .or_insert_with(|| blank_result(hit));
        #[allow(clippy::cast_possible_truncation)]
        {
            entry.vec_rank = Some(rank as u32 + 1);
        }
        entry.vec_score = Some(normalized);
    }

    for (rank, hit) in fts_hits.iter().enumerate() {
        let normalized = if max_fts > 0.0 { hit.score / max_fts } else { 0.0 };
        let entry = merged
            .entry(hit.chunk.id.clone())
            .or_insert_with(|| blank_result(hit));
        #[allow(clippy::cast_possible_truncation)]
        {
            entry.fts_rank = Some(rank as u32 + 1);
        }
        entry.fts_score = Some(normalized);
    }

    let mut results: Vec<HybridSearchResult> = merged
        .into_values()
        .map(|mut result| {
            let tags = chunk_tags.get(&result.chunk_id).cloned().unwrap_or_default();
            result.matched_tags = relevant_tags
                .iter()
                .filter(|t| tags.contains(t))
                .cloned()
                .collect();
            result.tag_boost = if relevant_tags.is_empty() {
                0.0
            } else {
                #[allow(clippy::cast_precision_loss)]
                {
                    result.matched_tags.len() as f64 / relevant_tags.len() as f64
                }
            };
            result.score = weights.vector * result.vec_score.unwrap_or(0.0)
                + weights.fts * result.fts_score.unwrap_or(0.0)
                + weights.tag * result.tag_boost;
            result
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk_id.cmp(&b.chunk_id))
    });
    results
}

fn blank_result(hit: &ChunkHit) -> HybridSearchResult {
    HybridSearchResult {
        chunk_id: hit.chunk.id.clone(),
        file_id: hit.chunk.file_id.clone(),
        symbol_id: hit.chunk.symbol_id.clone(),
        file_path: hit.file_path.clone(),
        start_line: hit.chunk.start_line,
        end_line: hit.chunk.end_line,
        content: hit.chunk.content.clone(),
        score: 0.0,
        vec_rank: None,
        vec_score: None,
        fts_rank: None,
        fts_score: None,
        matched_tags: Vec::new(),
        tag_boost: 0.0,
    }
}

fn apply_tag_filters(results: &mut Vec<HybridSearchResult>, filters: &SearchFilters) {
    if !filters.tags_any.is_empty() {
        results.retain(|r| filters.tags_any.iter().any(|t| r.matched_tags.contains(t)));
    }
    if !filters.tags_all.is_empty() {
        results.retain(|r| filters.tags_all.iter().all(|t| r.matched_tags.contains(t)));
    }
}
