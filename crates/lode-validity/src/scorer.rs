//! Document validity scoring.
//!
//! Combines reference validity, embedding similarity, freshness, and the
//! optional semantic (claim) signal into one 0–100 score:
//!
//! - structural weights: reference 0.55, embedding 0.30, freshness 0.15
//! - with semantic validation: 0.35 / 0.25 / 0.15 / semantic 0.25
//! - an optional LLM score carves out 0.20 and the rest renormalizes
//!
//! `≥70` valid, `≥50` warning, else stale. The issue set stored with the
//! score replaces any previous set for the document.

use chrono::{DateTime, Utc};

use lode_core::entities::{DocValidityScore, Document};
use lode_core::enums::ValidityStatus;
use lode_db::LodeStore;

use crate::error::ValidityError;
use crate::reference_extractor::{DocFormat, extract_references};
use crate::validator::{ValidationSummary, validate_references};

/// Nearest chunk embeddings compared against the document embedding.
const EMBEDDING_NEIGHBORS: u32 = 20;

/// Optional semantic-validation inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticInputs {
    pub claims_checked: usize,
    pub claims_verified: usize,
}

/// `valid_refs / total_refs`; a document with no references is conceptually
/// valid.
#[must_use]
pub fn reference_score(checked: usize, valid: usize) -> f64 {
    if checked == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        valid as f64 / checked as f64
    }
}

/// Freshness by staleness steps: doc newer than code is 1.0; otherwise
/// ≤7d → 0.9, ≤30d → 0.7, ≤90d → 0.4, ≤180d → 0.2, else 0.1.
/// Neutral 0.5 when either side is unknown.
#[must_use]
pub fn freshness_score(
    doc_updated: Option<DateTime<Utc>>,
    code_updated: Option<DateTime<Utc>>,
) -> f64 {
    let (Some(doc), Some(code)) = (doc_updated, code_updated) else {
        return 0.5;
    };
    if doc >= code {
        return 1.0;
    }
    let days_stale = (code - doc).num_days();
    match days_stale {
        ..=7 => 0.9,
        8..=30 => 0.7,
        31..=90 => 0.4,
        91..=180 => 0.2,
        _ => 0.1,
    }
}

/// `verified / checked`; no claims means nothing contradicts the code.
#[must_use]
pub fn semantic_score(checked: usize, verified: usize) -> f64 {
    if checked == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        verified as f64 / checked as f64
    }
}

/// Scale the mean top-k cosine similarity: values above 0.5 are boosted
/// linearly (×1.5) then clamped — 0.6+ similarity is already strong for
/// doc-to-code comparison. Neutral 0.5 without an embedding.
#[must_use]
pub fn scale_embedding_similarity(raw: Option<f64>) -> f64 {
    match raw {
        Some(similarity) if similarity > 0.5 => (0.5 + (similarity - 0.5) * 1.5).min(1.0),
        Some(similarity) => similarity.max(0.0),
        None => 0.5,
    }
}

/// Combine component scores into the final 0–100 integer.
#[must_use]
pub fn combine_scores(
    reference: f64,
    embedding: f64,
    freshness: f64,
    semantic: Option<f64>,
    llm: Option<f64>,
) -> i64 {
    let mut weights: Vec<(f64, f64)> = if let Some(semantic) = semantic {
        vec![
            (0.35, reference),
            (0.25, embedding),
            (0.15, freshness),
            (0.25, semantic),
        ]
    } else {
        vec![(0.55, reference), (0.30, embedding), (0.15, freshness)]
    };

    if let Some(llm) = llm {
        let llm_weight = 0.20;
        let scale = (1.0 - llm_weight) / weights.iter().map(|(w, _)| w).sum::<f64>();
        for (weight, _) in &mut weights {
            *weight *= scale;
        }
        weights.push((llm_weight, llm));
    }

    let score: f64 = weights.iter().map(|(weight, value)| weight * value).sum();
    #[allow(clippy::cast_possible_truncation)]
    {
        (score * 100.0).round().clamp(0.0, 100.0) as i64
    }
}

/// Validate a document end-to-end and persist score + issues.
///
/// Runs reference extraction/validation, the embedding comparison, and the
/// freshness check; includes the semantic component when claim verification
/// already ran for this document.
///
/// # Errors
///
/// Returns [`ValidityError::Database`] on storage failure.
pub async fn validate_document(
    store: &LodeStore,
    document: &Document,
    semantic: Option<SemanticInputs>,
) -> Result<DocValidityScore, ValidityError> {
    let references = extract_references(&document.content, DocFormat::from_path(&document.path));
    let summary: ValidationSummary =
        validate_references(store, &document.repo_id, &document.id, &references).await?;

    let embedding_raw = store
        .avg_top_chunk_similarity(&document.repo_id, &document.id, EMBEDDING_NEIGHBORS)
        .await?;
    let related_code_chunks = embedding_raw.map_or(0, |(_, count)| count);
    let embedding = scale_embedding_similarity(embedding_raw.map(|(avg, _)| avg));

    let code_updated = store
        .latest_file_update(&document.repo_id, &summary.related_files)
        .await?;
    let freshness = freshness_score(Some(document.updated_at), code_updated);

    let reference = reference_score(summary.references_checked, summary.references_valid);
    let semantic_value = semantic.map(|s| semantic_score(s.claims_checked, s.claims_verified));

    let score = combine_scores(reference, embedding, freshness, semantic_value, None);
    let record = DocValidityScore {
        document_id: document.id.clone(),
        score,
        status: ValidityStatus::from_score(score),
        reference_score: reference,
        embedding_score: embedding,
        freshness_score: freshness,
        semantic_score: semantic_value,
        llm_score: None,
        references_checked: summary.references_checked as i64,
        references_valid: summary.references_valid as i64,
        related_code_chunks,
        content_hash: document.content_hash.clone(),
        validated_at: Utc::now(),
    };

    store.upsert_validity_score(&record).await?;
    store
        .replace_validity_issues(&document.id, &summary.issues)
        .await?;

    tracing::info!(
        document = %document.path,
        score = record.score,
        status = %record.status,
        "document validity scored"
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lode_core::enums::{DocSource, DocType, Language, SymbolKind};
    use lode_db::repos::indexing::{FileIndexData, NewChunk, NewSymbol};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn reference_score_edge_cases() {
        assert!((reference_score(0, 0) - 1.0).abs() < f64::EPSILON);
        assert!((reference_score(4, 3) - 0.75).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case(0, 1.0)]
    #[case(5, 0.9)]
    #[case(20, 0.7)]
    #[case(60, 0.4)]
    #[case(120, 0.2)]
    #[case(365, 0.1)]
    fn freshness_decay_steps(#[case] days_stale: i64, #[case] expected: f64) {
        let code = Utc::now();
        let doc = code - chrono::Duration::days(days_stale);
        let score = if days_stale == 0 {
            // doc >= code
            freshness_score(Some(code), Some(code))
        } else {
            freshness_score(Some(doc), Some(code))
        };
        assert!(
            (score - expected).abs() < f64::EPSILON,
            "{days_stale} days → {score}, expected {expected}"
        );
    }

    #[test]
    fn freshness_neutral_when_unknown() {
        assert!((freshness_score(None, Some(Utc::now())) - 0.5).abs() < f64::EPSILON);
        assert!((freshness_score(Some(Utc::now()), None) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn embedding_scaling_boosts_above_half() {
        assert!((scale_embedding_similarity(None) - 0.5).abs() < f64::EPSILON);
        assert!((scale_embedding_similarity(Some(0.3)) - 0.3).abs() < f64::EPSILON);
        // 0.7 → 0.5 + 0.2·1.5 = 0.8
        assert!((scale_embedding_similarity(Some(0.7)) - 0.8).abs() < 1e-9);
        assert!((scale_embedding_similarity(Some(0.95)) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn combine_structural_weights() {
        // 0.55·1 + 0.30·0.5 + 0.15·1 = 0.85
        assert_eq!(combine_scores(1.0, 0.5, 1.0, None, None), 85);
        assert_eq!(combine_scores(0.0, 0.0, 0.0, None, None), 0);
        assert_eq!(combine_scores(1.0, 1.0, 1.0, None, None), 100);
    }

    #[test]
    fn combine_with_semantic_weights() {
        // 0.35·1 + 0.25·1 + 0.15·1 + 0.25·0 = 0.75
        assert_eq!(combine_scores(1.0, 1.0, 1.0, Some(0.0), None), 75);
    }

    #[test]
    fn llm_carve_out_renormalizes() {
        // base weights scale by 0.8; llm contributes 0.20·1
        // 0.8·(0.55 + 0.30 + 0.15)·1 + 0.20 = 1.0
        assert_eq!(combine_scores(1.0, 1.0, 1.0, None, Some(1.0)), 100);
        // all components zero except llm
        assert_eq!(combine_scores(0.0, 0.0, 0.0, None, Some(1.0)), 20);
    }

    #[test]
    fn semantic_score_no_claims_is_clean() {
        assert!((semantic_score(0, 0) - 1.0).abs() < f64::EPSILON);
        assert!((semantic_score(4, 1) - 0.25).abs() < f64::EPSILON);
    }

    async fn seeded_store() -> (LodeStore, String) {
        let store = LodeStore::open_in_memory().await.unwrap();
        let repo = store.ensure_repo("demo", "/tmp").await.unwrap();
        let data = FileIndexData {
            path: "src/sessions.py".to_string(),
            language: Language::Python,
            content_hash: "h1".to_string(),
            mtime: Utc::now(),
            symbols: vec![NewSymbol {
                fqn: "SessionService".to_string(),
                name: "SessionService".to_string(),
                kind: SymbolKind::Class,
                signature: "class SessionService".to_string(),
                start_line: 1,
                end_line: 20,
                start_byte: 0,
                end_byte: 400,
                docstring: None,
                content_hash: "sh".to_string(),
            }],
            chunks: vec![NewChunk {
                symbol_fqn: Some("SessionService".to_string()),
                start_line: 1,
                end_line: 20,
                content: "class SessionService: ...".to_string(),
                content_hash: "ch".to_string(),
            }],
            edges: Vec::new(),
        };
        store.apply_file_index(&repo.id, &data).await.unwrap();
        (store, repo.id)
    }

    #[tokio::test]
    async fn validate_document_persists_score_and_issues() {
        let (store, repo_id) = seeded_store().await;
        let (document, _) = store
            .upsert_document(
                &repo_id,
                "docs/sessions.md",
                DocType::DocFile,
                "Sessions",
                "Managed by `SessionService` in src/sessions.py plus `GhostService`.",
                DocSource::Human,
            )
            .await
            .unwrap();

        let score = validate_document(&store, &document, None).await.unwrap();
        assert_eq!(score.references_checked, 3);
        assert_eq!(score.references_valid, 2);
        assert!(score.semantic_score.is_none());
        assert!(score.score > 0 && score.score <= 100);

        let stored = store
            .get_validity_score(&document.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.score, score.score);
        let issues = store
            .validity_issues_for_document(&document.id)
            .await
            .unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].reference_text, "GhostService");
    }

    #[tokio::test]
    async fn semantic_failures_drag_score_below_valid() {
        let (store, repo_id) = seeded_store().await;
        let (document, _) = store
            .upsert_document(
                &repo_id,
                "docs/limits.md",
                DocType::DocFile,
                "Limits",
                "Sessions are capped. See `SessionService` in src/sessions.py.",
                DocSource::Human,
            )
            .await
            .unwrap();

        let clean = validate_document(&store, &document, None).await.unwrap();
        assert!(clean.score >= 70, "healthy doc scores valid: {}", clean.score);

        let drifted = validate_document(
            &store,
            &document,
            Some(SemanticInputs {
                claims_checked: 1,
                claims_verified: 0,
            }),
        )
        .await
        .unwrap();
        assert!(
            (drifted.semantic_score.unwrap() - 0.0).abs() < f64::EPSILON,
            "semantic score is 0 when the only claim drifted"
        );
        assert!(drifted.score < 70, "drifted doc drops below valid: {}", drifted.score);
        assert_eq!(drifted.status, ValidityStatus::from_score(drifted.score));
    }
}
