//! Shared context handed to every tool call.

use std::sync::Arc;

use lode_config::LodeConfig;
use lode_db::{LodeStore, SchemaManager};
use lode_embeddings::EmbeddingClient;

use crate::error::ToolError;

/// Everything a tool needs: configuration, the namespace manager, and the
/// embedding client. Tools resolve their repository per call — no session
/// state is kept between calls.
pub struct ToolContext {
    pub config: LodeConfig,
    pub schema_manager: Arc<SchemaManager>,
    pub embeddings: Arc<EmbeddingClient>,
    /// Repository used when a call does not name one.
    pub default_repo: Option<String>,
}

impl ToolContext {
    /// Resolve the repository name from the input payload or the default.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidInput`] when neither is available.
    pub fn repo_name(&self, input: &serde_json::Value) -> Result<String, ToolError> {
        input
            .get("repo")
            .and_then(|r| r.as_str())
            .map(String::from)
            .or_else(|| self.default_repo.clone())
            .ok_or_else(|| {
                ToolError::InvalidInput("no 'repo' given and no default repository".to_string())
            })
    }

    /// Open the namespace store for a repository named in the input.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidInput`] for an unknown repository.
    pub async fn open_store(&self, input: &serde_json::Value) -> Result<LodeStore, ToolError> {
        let repo = self.repo_name(input)?;
        self.schema_manager
            .open_namespace(&repo)
            .await
            .map_err(|_| ToolError::InvalidInput(format!("repository '{repo}' is not indexed")))
    }
}
