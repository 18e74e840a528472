//! Summary generation via the small LLM slot.
//!
//! File, symbol, and module summaries are regenerated only when the
//! summarized content's hash changes; a current summary short-circuits the
//! LLM call. Summaries can additionally be stored as `GENERATED_SUMMARY`
//! documents so documentation search covers them.

use lode_core::enums::{DocSource, DocType};
use lode_db::repos::summary::{StoredSummary, SummaryKind};
use lode_db::{DatabaseError, LodeStore};
use lode_llm::{LlmClient, LlmError, ModelSlot};

use crate::error::IndexError;

const FILE_SUMMARY_PROMPT: &str = "Summarize this source file in 2-3 sentences. \
Focus on its responsibility and the main entry points. Plain prose, no lists.\n\n\
File: {path}\n\n{content}";

const SYMBOL_SUMMARY_PROMPT: &str = "Summarize what this {kind} does in 1-2 sentences. \
Plain prose.\n\n{signature}\n\n{content}";

const MODULE_SUMMARY_PROMPT: &str = "Summarize this module in 2-3 sentences based on its \
file summaries. Focus on the module's overall responsibility.\n\n\
Module: {path}\n\n{summaries}";

/// Summary outcome: freshly generated or reused from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Generated(String),
    Current(String),
}

impl SummaryOutcome {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) | Self::Current(text) => text,
        }
    }
}

/// Summarize a file, reusing the stored summary when the hash is unchanged.
///
/// # Errors
///
/// Returns [`IndexError::Database`] on storage failure and
/// [`IndexError::Summary`] when the LLM call fails.
pub async fn summarize_file(
    store: &LodeStore,
    llm: &LlmClient,
    repo_id: &str,
    file_id: &str,
) -> Result<SummaryOutcome, IndexError> {
    let file = store
        .get_file(file_id)
        .await?
        .ok_or(DatabaseError::NoResult)?;

    if let Some(current) =
        current_summary(store, SummaryKind::File, file_id, &file.content_hash).await?
    {
        return Ok(SummaryOutcome::Current(current.summary));
    }

    let chunks = store.chunks_for_file(file_id).await?;
    let content: String = chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = FILE_SUMMARY_PROMPT
        .replace("{path}", &file.path)
        .replace("{content}", &truncate(&content, 8_000));

    let summary = generate(llm, &prompt).await?;
    store
        .upsert_summary(
            SummaryKind::File,
            file_id,
            repo_id,
            &summary,
            &file.content_hash,
        )
        .await?;
    Ok(SummaryOutcome::Generated(summary))
}

/// Summarize a symbol, reusing the stored summary when the hash is unchanged.
///
/// # Errors
///
/// Returns [`IndexError::Database`] on storage or LLM failure.
pub async fn summarize_symbol(
    store: &LodeStore,
    llm: &LlmClient,
    repo_id: &str,
    symbol_id: &str,
) -> Result<SummaryOutcome, IndexError> {
    let symbol = store
        .get_symbol(symbol_id)
        .await?
        .ok_or(DatabaseError::NoResult)?;

    if let Some(current) =
        current_summary(store, SummaryKind::Symbol, symbol_id, &symbol.content_hash).await?
    {
        return Ok(SummaryOutcome::Current(current.summary));
    }

    let chunks = store.chunks_for_symbol(symbol_id).await?;
    let content: String = chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = SYMBOL_SUMMARY_PROMPT
        .replace("{kind}", symbol.kind.as_str())
        .replace("{signature}", &symbol.signature)
        .replace("{content}", &truncate(&content, 6_000));

    let summary = generate(llm, &prompt).await?;
    store
        .upsert_summary(
            SummaryKind::Symbol,
            symbol_id,
            repo_id,
            &summary,
            &symbol.content_hash,
        )
        .await?;
    Ok(SummaryOutcome::Generated(summary))
}

/// Summarize a module (directory) from its file summaries. The module hash is
/// the hash of the concatenated file hashes, so any file change regenerates.
///
/// # Errors
///
/// Returns [`IndexError::Database`] on storage or LLM failure.
pub async fn summarize_module(
    store: &LodeStore,
    llm: &LlmClient,
    repo_id: &str,
    module_path: &str,
) -> Result<SummaryOutcome, IndexError> {
    let like = format!("{module_path}%");
    let mut rows = store
        .db()
        .query(
            "SELECT id, path, content_hash FROM file
             WHERE repo_id = ?1 AND path LIKE ?2 ORDER BY path",
            [repo_id, like.as_str()],
        )
        .await?;
    let mut files = Vec::new();
    while let Some(row) = rows.next().await.map_err(DatabaseError::from)? {
        let id: String = row.get(0).map_err(DatabaseError::from)?;
        let path: String = row.get(1).map_err(DatabaseError::from)?;
        let hash: String = row.get(2).map_err(DatabaseError::from)?;
        files.push((id, path, hash));
    }
    if files.is_empty() {
        return Err(IndexError::InvalidPath(format!(
            "no files under module '{module_path}'"
        )));
    }

    let combined_hash = lode_core::hashing::content_hash_str(
        &files
            .iter()
            .map(|(_, _, hash)| hash.as_str())
            .collect::<Vec<_>>()
            .join(","),
    );
    if let Some(current) =
        current_summary(store, SummaryKind::Module, module_path, &combined_hash).await?
    {
        return Ok(SummaryOutcome::Current(current.summary));
    }

    let mut parts = Vec::new();
    for (file_id, path, _) in &files {
        if let Some(stored) = store.get_summary(SummaryKind::File, file_id).await? {
            parts.push(format!("{path}: {}", stored.summary));
        } else {
            parts.push(path.clone());
        }
    }
    let prompt = MODULE_SUMMARY_PROMPT
        .replace("{path}", module_path)
        .replace("{summaries}", &truncate(&parts.join("\n"), 8_000));

    let summary = generate(llm, &prompt).await?;
    store
        .upsert_summary(
            SummaryKind::Module,
            module_path,
            repo_id,
            &summary,
            &combined_hash,
        )
        .await?;
    Ok(SummaryOutcome::Generated(summary))
}

/// Store a summary as a `GENERATED_SUMMARY` document so doc search covers it.
///
/// # Errors
///
/// Returns [`IndexError::Database`] on storage failure.
pub async fn store_summary_as_document(
    store: &LodeStore,
    repo_id: &str,
    entity_path: &str,
    summary: &str,
) -> Result<(), IndexError> {
    store
        .upsert_document(
            repo_id,
            &format!("summaries/{entity_path}"),
            DocType::GeneratedSummary,
            &format!("Summary of {entity_path}"),
            summary,
            DocSource::Generated,
        )
        .await?;
    Ok(())
}

async fn current_summary(
    store: &LodeStore,
    kind: SummaryKind,
    entity_key: &str,
    content_hash: &str,
) -> Result<Option<StoredSummary>, IndexError> {
    if store
        .is_summary_current(kind, entity_key, content_hash)
        .await?
    {
        Ok(store.get_summary(kind, entity_key).await?)
    } else {
        Ok(None)
    }
}

async fn generate(llm: &LlmClient, prompt: &str) -> Result<String, IndexError> {
    llm.generate(prompt, ModelSlot::Small)
        .await
        .map(|text| text.trim().to_string())
        .map_err(|e: LlmError| IndexError::Summary(e.to_string()))
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use lode_config::LlmConfig;
    use pretty_assertions::assert_eq;

    /// A client pointed at an unroutable address: any actual call fails, so a
    /// successful outcome proves the hash gate short-circuited.
    fn unreachable_llm() -> LlmClient {
        let mut config = LlmConfig::default();
        config.small.base_url = "http://127.0.0.1:1".to_string();
        config.small.timeout_secs = 1;
        LlmClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn current_file_summary_skips_the_llm() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("auth.py"), "def login(pwd):\n    return pwd\n").unwrap();

        let store = LodeStore::open_in_memory().await.unwrap();
        let indexer = crate::indexer::Indexer::new(lode_config::IndexerConfig::default());
        indexer
            .index_repository(&store, "demo", dir.path())
            .await
            .unwrap();
        let repo = store.get_repo_by_name("demo").await.unwrap().unwrap();
        let file = store
            .get_file_by_path(&repo.id, "auth.py")
            .await
            .unwrap()
            .unwrap();

        store
            .upsert_summary(
                SummaryKind::File,
                &file.id,
                &repo.id,
                "Login helper.",
                &file.content_hash,
            )
            .await
            .unwrap();

        let outcome = summarize_file(&store, &unreachable_llm(), &repo.id, &file.id)
            .await
            .unwrap();
        assert_eq!(outcome, SummaryOutcome::Current("Login helper.".to_string()));
    }

    #[tokio::test]
    async fn stale_summary_requires_regeneration() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("auth.py"), "def login(pwd):\n    return pwd\n").unwrap();

        let store = LodeStore::open_in_memory().await.unwrap();
        let indexer = crate::indexer::Indexer::new(lode_config::IndexerConfig::default());
        indexer
            .index_repository(&store, "demo", dir.path())
            .await
            .unwrap();
        let repo = store.get_repo_by_name("demo").await.unwrap().unwrap();
        let file = store
            .get_file_by_path(&repo.id, "auth.py")
            .await
            .unwrap()
            .unwrap();

        // Stored under an outdated hash: regeneration hits the (dead) backend
        store
            .upsert_summary(SummaryKind::File, &file.id, &repo.id, "Old.", "stale-hash")
            .await
            .unwrap();

        let result = summarize_file(&store, &unreachable_llm(), &repo.id, &file.id).await;
        assert!(result.is_err(), "stale hash must reach the LLM");
    }

    #[tokio::test]
    async fn summary_document_is_searchable() {
        let store = LodeStore::open_in_memory().await.unwrap();
        let repo = store.ensure_repo("demo", "/tmp").await.unwrap();

        store_summary_as_document(&store, &repo.id, "src/auth", "Handles credential checks.")
            .await
            .unwrap();

        let hits = store
            .fts_search_documents(&repo.id, "credential", 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.doc_type, DocType::GeneratedSummary);
    }
}
