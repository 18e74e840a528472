//! Behavioral claims, verifications, and drift issues.

use chrono::Utc;

use lode_core::entities::{BehavioralClaim, ClaimVerification, DocDriftIssue, EvidenceRef};
use lode_core::enums::{ClaimStatus, DriftSeverity, FixType};
use lode_core::ids::{PREFIX_CLAIM, PREFIX_DRIFT_ISSUE, PREFIX_VERIFICATION, generate_id};

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_json};
use crate::store::LodeStore;

fn row_to_claim(row: &libsql::Row) -> Result<BehavioralClaim, DatabaseError> {
    let value_type = match get_opt_string(row, 8)? {
        Some(s) => Some(parse_enum(&s)?),
        None => None,
    };
    Ok(BehavioralClaim {
        id: row.get::<String>(0)?,
        document_id: row.get::<String>(1)?,
        repo_id: row.get::<String>(2)?,
        claim_text: row.get::<String>(3)?,
        topic: row.get::<String>(4)?,
        subject: get_opt_string(row, 5)?,
        condition: get_opt_string(row, 6)?,
        expected_value: get_opt_string(row, 7)?,
        value_type,
        extraction_confidence: row.get::<f64>(9)?,
        status: parse_enum(&row.get::<String>(10)?)?,
    })
}

const CLAIM_COLUMNS: &str = "id, document_id, repo_id, claim_text, topic, subject, \
     claim_condition, expected_value, value_type, extraction_confidence, status";

impl LodeStore {
    /// Delete all claims for a document (re-extraction idempotency).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the delete fails.
    pub async fn delete_claims_for_document(
        &self,
        document_id: &str,
    ) -> Result<u64, DatabaseError> {
        self.db()
            .execute(
                "DELETE FROM behavioral_claim WHERE document_id = ?1",
                [document_id],
            )
            .await
    }

    /// Insert one extracted claim with status `new`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_claim(
        &self,
        document_id: &str,
        repo_id: &str,
        claim_text: &str,
        topic: &str,
        subject: Option<&str>,
        condition: Option<&str>,
        expected_value: Option<&str>,
        value_type: Option<lode_core::enums::ValueType>,
        extraction_confidence: f64,
    ) -> Result<BehavioralClaim, DatabaseError> {
        let id = generate_id(PREFIX_CLAIM)?;
        self.db()
            .execute(
                "INSERT INTO behavioral_claim
                     (id, document_id, repo_id, claim_text, topic, subject, claim_condition,
                      expected_value, value_type, extraction_confidence, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 'new')",
                libsql::params![
                    id.as_str(),
                    document_id,
                    repo_id,
                    claim_text,
                    topic,
                    subject,
                    condition,
                    expected_value,
                    value_type.map(lode_core::enums::ValueType::as_str),
                    extraction_confidence
                ],
            )
            .await?;
        Ok(BehavioralClaim {
            id,
            document_id: document_id.to_string(),
            repo_id: repo_id.to_string(),
            claim_text: claim_text.to_string(),
            topic: topic.to_string(),
            subject: subject.map(String::from),
            condition: condition.map(String::from),
            expected_value: expected_value.map(String::from),
            value_type,
            extraction_confidence,
            status: ClaimStatus::New,
        })
    }

    /// Claims for a document, insertion order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn claims_for_document(
        &self,
        document_id: &str,
    ) -> Result<Vec<BehavioralClaim>, DatabaseError> {
        let sql = format!(
            "SELECT {CLAIM_COLUMNS} FROM behavioral_claim WHERE document_id = ?1 ORDER BY rowid"
        );
        let mut rows = self.db().query(&sql, [document_id]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_claim(&row)?);
        }
        Ok(out)
    }

    /// Move a claim to a new lifecycle status.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn update_claim_status(
        &self,
        claim_id: &str,
        status: ClaimStatus,
    ) -> Result<(), DatabaseError> {
        self.db()
            .execute(
                "UPDATE behavioral_claim SET status = ?1 WHERE id = ?2",
                libsql::params![status.as_str(), claim_id],
            )
            .await?;
        Ok(())
    }

    /// Store a verification result.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if serialization or the insert fails.
    pub async fn insert_verification(
        &self,
        verification: &ClaimVerification,
    ) -> Result<(), DatabaseError> {
        let evidence_json = serde_json::to_string(&verification.evidence)
            .map_err(|e| DatabaseError::Other(e.into()))?;
        self.db()
            .execute(
                "INSERT INTO claim_verification
                     (id, claim_id, verdict, confidence, actual_value, actual_behavior,
                      evidence, reasoning, suggested_fix, fix_type, suggested_diff, verified_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                libsql::params![
                    verification.id.as_str(),
                    verification.claim_id.as_str(),
                    verification.verdict.as_str(),
                    verification.confidence,
                    verification.actual_value.as_deref(),
                    verification.actual_behavior.as_deref(),
                    evidence_json.as_str(),
                    verification.reasoning.as_deref(),
                    verification.suggested_fix.as_deref(),
                    verification.fix_type.map(FixType::as_str),
                    verification.suggested_diff.as_deref(),
                    verification.verified_at.to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    /// Latest verification for a claim, if any.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn latest_verification(
        &self,
        claim_id: &str,
    ) -> Result<Option<ClaimVerification>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT id, claim_id, verdict, confidence, actual_value, actual_behavior,
                        evidence, reasoning, suggested_fix, fix_type, suggested_diff, verified_at
                 FROM claim_verification WHERE claim_id = ?1
                 ORDER BY rowid DESC LIMIT 1",
                [claim_id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let evidence: Vec<EvidenceRef> =
            serde_json::from_value(parse_json(&row.get::<String>(6)?)?)
                .map_err(|e| DatabaseError::Other(e.into()))?;
        let fix_type = match get_opt_string(&row, 9)? {
            Some(s) => Some(parse_enum(&s)?),
            None => None,
        };
        Ok(Some(ClaimVerification {
            id: row.get::<String>(0)?,
            claim_id: row.get::<String>(1)?,
            verdict: parse_enum(&row.get::<String>(2)?)?,
            confidence: row.get::<f64>(3)?,
            actual_value: get_opt_string(&row, 4)?,
            actual_behavior: get_opt_string(&row, 5)?,
            evidence,
            reasoning: get_opt_string(&row, 7)?,
            suggested_fix: get_opt_string(&row, 8)?,
            fix_type,
            suggested_diff: get_opt_string(&row, 10)?,
            verified_at: parse_datetime(&row.get::<String>(11)?)?,
        }))
    }

    /// Record a drift issue for a mismatch verification.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails.
    pub async fn insert_drift_issue(
        &self,
        verification_id: &str,
        severity: DriftSeverity,
        category: &str,
        can_auto_fix: bool,
        auto_fix_type: Option<FixType>,
    ) -> Result<DocDriftIssue, DatabaseError> {
        let id = generate_id(PREFIX_DRIFT_ISSUE)?;
        let now = Utc::now();
        self.db()
            .execute(
                "INSERT INTO doc_drift_issue
                     (id, verification_id, severity, category, can_auto_fix, auto_fix_type, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    id.as_str(),
                    verification_id,
                    severity.as_str(),
                    category,
                    i64::from(can_auto_fix),
                    auto_fix_type.map(FixType::as_str),
                    now.to_rfc3339()
                ],
            )
            .await?;
        Ok(DocDriftIssue {
            id,
            verification_id: verification_id.to_string(),
            severity,
            category: category.to_string(),
            can_auto_fix,
            auto_fix_type,
            created_at: now,
        })
    }

    /// Drift issues created for a document's claims, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn drift_issues_for_document(
        &self,
        document_id: &str,
    ) -> Result<Vec<DocDriftIssue>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT di.id, di.verification_id, di.severity, di.category,
                        di.can_auto_fix, di.auto_fix_type, di.created_at
                 FROM doc_drift_issue di
                 JOIN claim_verification cv ON cv.id = di.verification_id
                 JOIN behavioral_claim bc ON bc.id = cv.claim_id
                 WHERE bc.document_id = ?1
                 ORDER BY di.rowid DESC",
                [document_id],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let auto_fix_type = match get_opt_string(&row, 5)? {
                Some(s) => Some(parse_enum(&s)?),
                None => None,
            };
            out.push(DocDriftIssue {
                id: row.get::<String>(0)?,
                verification_id: row.get::<String>(1)?,
                severity: parse_enum(&row.get::<String>(2)?)?,
                category: row.get::<String>(3)?,
                can_auto_fix: row.get::<i64>(4)? != 0,
                auto_fix_type,
                created_at: parse_datetime(&row.get::<String>(6)?)?,
            });
        }
        Ok(out)
    }
}
