//! Knowledge-base job queue: embedding and validation work deferred to sweeps.

use chrono::Utc;

use lode_core::ids::{PREFIX_JOB, generate_id};

use crate::error::DatabaseError;
use crate::helpers::parse_json;
use crate::store::LodeStore;

/// A queued job row.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub id: String,
    pub repo_id: String,
    pub job_type: String,
    pub payload: serde_json::Value,
    pub attempts: i64,
}

impl LodeStore {
    /// Enqueue a job.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails.
    pub async fn enqueue_job(
        &self,
        repo_id: &str,
        job_type: &str,
        payload: &serde_json::Value,
    ) -> Result<String, DatabaseError> {
        let id = generate_id(PREFIX_JOB)?;
        self.db()
            .execute(
                "INSERT INTO kb_job_queue (id, repo_id, job_type, payload, status, attempts, created_at)
                 VALUES (?1, ?2, ?3, ?4, 'pending', 0, ?5)",
                libsql::params![
                    id.as_str(),
                    repo_id,
                    job_type,
                    payload.to_string(),
                    Utc::now().to_rfc3339()
                ],
            )
            .await?;
        Ok(id)
    }

    /// Claim the oldest pending job, marking it `running`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query or update fails.
    pub async fn next_pending_job(
        &self,
        repo_id: &str,
    ) -> Result<Option<QueuedJob>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT id, repo_id, job_type, payload, attempts FROM kb_job_queue
                 WHERE repo_id = ?1 AND status = 'pending'
                 ORDER BY created_at LIMIT 1",
                [repo_id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let job = QueuedJob {
            id: row.get::<String>(0)?,
            repo_id: row.get::<String>(1)?,
            job_type: row.get::<String>(2)?,
            payload: parse_json(&row.get::<String>(3)?)?,
            attempts: row.get::<i64>(4)?,
        };
        self.db()
            .execute(
                "UPDATE kb_job_queue SET status = 'running', attempts = attempts + 1 WHERE id = ?1",
                [job.id.as_str()],
            )
            .await?;
        Ok(Some(job))
    }

    /// Mark a job done or put it back for retry.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn finish_job(&self, job_id: &str, success: bool) -> Result<(), DatabaseError> {
        let status = if success { "done" } else { "pending" };
        self.db()
            .execute(
                "UPDATE kb_job_queue SET status = ?1 WHERE id = ?2",
                libsql::params![status, job_id],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_store;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn queue_lifecycle() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        store
            .enqueue_job(&repo.id, "embed_document", &json!({"document_id": "doc-1"}))
            .await
            .unwrap();

        let job = store.next_pending_job(&repo.id).await.unwrap().unwrap();
        assert_eq!(job.job_type, "embed_document");
        assert_eq!(job.payload["document_id"], "doc-1");

        // Claimed job is not pending any more
        assert!(store.next_pending_job(&repo.id).await.unwrap().is_none());

        // Failed jobs return to the queue
        store.finish_job(&job.id, false).await.unwrap();
        let retried = store.next_pending_job(&repo.id).await.unwrap().unwrap();
        assert_eq!(retried.id, job.id);
        assert_eq!(retried.attempts, 1);

        store.finish_job(&job.id, true).await.unwrap();
        assert!(store.next_pending_job(&repo.id).await.unwrap().is_none());
    }
}
