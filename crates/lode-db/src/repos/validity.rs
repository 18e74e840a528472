//! Validity scores and their issue sets.

use lode_core::entities::{DocValidityScore, ValidityIssue};
use lode_core::enums::ValidityStatus;
use lode_core::ids::{PREFIX_VALIDITY_ISSUE, generate_id};

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum};
use crate::store::LodeStore;

impl LodeStore {
    /// Upsert the one-per-document validity score.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the write fails.
    pub async fn upsert_validity_score(
        &self,
        score: &DocValidityScore,
    ) -> Result<(), DatabaseError> {
        self.db()
            .execute(
                "INSERT INTO doc_validity_score
                     (document_id, score, status, reference_score, embedding_score, freshness_score,
                      semantic_score, llm_score, references_checked, references_valid,
                      related_code_chunks, content_hash, validated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                 ON CONFLICT (document_id) DO UPDATE SET
                     score = excluded.score,
                     status = excluded.status,
                     reference_score = excluded.reference_score,
                     embedding_score = excluded.embedding_score,
                     freshness_score = excluded.freshness_score,
                     semantic_score = excluded.semantic_score,
                     llm_score = excluded.llm_score,
                     references_checked = excluded.references_checked,
                     references_valid = excluded.references_valid,
                     related_code_chunks = excluded.related_code_chunks,
                     content_hash = excluded.content_hash,
                     validated_at = excluded.validated_at",
                libsql::params![
                    score.document_id.as_str(),
                    score.score,
                    score.status.as_str(),
                    score.reference_score,
                    score.embedding_score,
                    score.freshness_score,
                    score.semantic_score,
                    score.llm_score,
                    score.references_checked,
                    score.references_valid,
                    score.related_code_chunks,
                    score.content_hash.as_str(),
                    score.validated_at.to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    /// Read a document's validity score.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_validity_score(
        &self,
        document_id: &str,
    ) -> Result<Option<DocValidityScore>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT document_id, score, status, reference_score, embedding_score,
                        freshness_score, semantic_score, llm_score, references_checked,
                        references_valid, related_code_chunks, content_hash, validated_at
                 FROM doc_validity_score WHERE document_id = ?1",
                [document_id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let status: ValidityStatus = parse_enum(&row.get::<String>(2)?)?;
        Ok(Some(DocValidityScore {
            document_id: row.get::<String>(0)?,
            score: row.get::<i64>(1)?,
            status,
            reference_score: row.get::<f64>(3)?,
            embedding_score: row.get::<f64>(4)?,
            freshness_score: row.get::<f64>(5)?,
            semantic_score: row.get::<Option<f64>>(6)?,
            llm_score: row.get::<Option<f64>>(7)?,
            references_checked: row.get::<i64>(8)?,
            references_valid: row.get::<i64>(9)?,
            related_code_chunks: row.get::<i64>(10)?,
            content_hash: row.get::<String>(11)?,
            validated_at: parse_datetime(&row.get::<String>(12)?)?,
        }))
    }

    /// Replace the issue set stored for a document.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the transaction fails.
    pub async fn replace_validity_issues(
        &self,
        document_id: &str,
        issues: &[ValidityIssue],
    ) -> Result<(), DatabaseError> {
        let tx = self.db().transaction().await?;
        tx.execute(
            "DELETE FROM doc_validity_issue WHERE document_id = ?1",
            [document_id],
        )
        .await?;
        for issue in issues {
            let id = generate_id(PREFIX_VALIDITY_ISSUE)?;
            tx.execute(
                "INSERT INTO doc_validity_issue
                     (id, document_id, issue_type, severity, reference_text, reference_line,
                      expected_kind, found_match, found_similarity, suggestion)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                libsql::params![
                    id.as_str(),
                    document_id,
                    issue.issue_type.as_str(),
                    issue.severity.as_str(),
                    issue.reference_text.as_str(),
                    issue.reference_line.map(i64::from),
                    issue.expected_kind.as_deref(),
                    issue.found_match.as_deref(),
                    issue.found_similarity,
                    issue.suggestion.as_deref()
                ],
            )
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Issues recorded for a document.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn validity_issues_for_document(
        &self,
        document_id: &str,
    ) -> Result<Vec<ValidityIssue>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT id, document_id, issue_type, severity, reference_text, reference_line,
                        expected_kind, found_match, found_similarity, suggestion
                 FROM doc_validity_issue WHERE document_id = ?1 ORDER BY rowid",
                [document_id],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(ValidityIssue {
                id: row.get::<String>(0)?,
                document_id: row.get::<String>(1)?,
                issue_type: row.get::<String>(2)?,
                severity: row.get::<String>(3)?,
                reference_text: row.get::<String>(4)?,
                reference_line: row
                    .get::<Option<i64>>(5)?
                    .and_then(|l| u32::try_from(l).ok()),
                expected_kind: get_opt_string(&row, 6)?,
                found_match: get_opt_string(&row, 7)?,
                found_similarity: row.get::<Option<f64>>(8)?,
                suggestion: get_opt_string(&row, 9)?,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_store;
    use chrono::Utc;
    use lode_core::enums::{DocSource, DocType};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn score_upsert_replaces_and_issues_replace() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();
        let (doc, _) = store
            .upsert_document(
                &repo.id,
                "docs/a.md",
                DocType::DocFile,
                "A",
                "some content",
                DocSource::Human,
            )
            .await
            .unwrap();

        let mut score = DocValidityScore {
            document_id: doc.id.clone(),
            score: 82,
            status: ValidityStatus::from_score(82),
            reference_score: 1.0,
            embedding_score: 0.7,
            freshness_score: 0.9,
            semantic_score: None,
            llm_score: None,
            references_checked: 4,
            references_valid: 4,
            related_code_chunks: 12,
            content_hash: doc.content_hash.clone(),
            validated_at: Utc::now(),
        };
        store.upsert_validity_score(&score).await.unwrap();

        score.score = 45;
        score.status = ValidityStatus::from_score(45);
        store.upsert_validity_score(&score).await.unwrap();

        let stored = store.get_validity_score(&doc.id).await.unwrap().unwrap();
        assert_eq!(stored.score, 45);
        assert_eq!(stored.status, ValidityStatus::Stale);

        let issue = ValidityIssue {
            id: String::new(),
            document_id: doc.id.clone(),
            issue_type: "missing_symbol".to_string(),
            severity: "warning".to_string(),
            reference_text: "User.login".to_string(),
            reference_line: Some(3),
            expected_kind: Some("method".to_string()),
            found_match: Some("User.authenticate".to_string()),
            found_similarity: Some(0.62),
            suggestion: Some("Did you mean 'User.authenticate'?".to_string()),
        };
        store
            .replace_validity_issues(&doc.id, std::slice::from_ref(&issue))
            .await
            .unwrap();
        store
            .replace_validity_issues(&doc.id, std::slice::from_ref(&issue))
            .await
            .unwrap();

        let issues = store.validity_issues_for_document(&doc.id).await.unwrap();
        assert_eq!(issues.len(), 1, "issue set is replaced, not appended");
        assert_eq!(issues[0].reference_text, "User.login");
    }
}
