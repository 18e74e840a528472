//! The tool registry: name → boxed async JSON function.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::context::ToolContext;
use crate::error::ToolError;

type ToolFuture = Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send>>;
type ToolFn = Arc<dyn Fn(Arc<ToolContext>, Value) -> ToolFuture + Send + Sync>;

/// Registry of JSON tools. Every tool takes a JSON-serializable input and
/// returns a JSON-serializable result; internal errors become `{error, why}`
/// payloads at the call boundary.
pub struct ToolRegistry {
    context: Arc<ToolContext>,
    tools: HashMap<&'static str, ToolFn>,
}

impl ToolRegistry {
    /// Registry with the built-in retrieval tools registered.
    #[must_use]
    pub fn new(context: ToolContext) -> Self {
        let mut registry = Self {
            context: Arc::new(context),
            tools: HashMap::new(),
        };
        crate::tools::register_builtin(&mut registry);
        registry
    }

    /// Register a tool under a name. Later registrations replace earlier ones.
    pub fn register<F, Fut>(&mut self, name: &'static str, tool: F)
    where
        F: Fn(Arc<ToolContext>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        self.tools
            .insert(name, Arc::new(move |ctx, input| Box::pin(tool(ctx, input))));
    }

    /// Registered tool names, sorted.
    #[must_use]
    pub fn tool_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.tools.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Invoke a tool. Tool-level failures come back as `{error, why}` rather
    /// than an `Err`; only an unknown tool name errors.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] for an unregistered name.
    pub async fn call(&self, name: &str, input: Value) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tracing::debug!(tool = name, "tool call");
        match tool(Arc::clone(&self.context), input).await {
            Ok(result) => Ok(result),
            Err(ToolError::UnknownTool(inner)) => Err(ToolError::UnknownTool(inner)),
            Err(e) => Ok(error_payload(&e)),
        }
    }
}

/// The uniform failure payload: a short human-readable rationale.
#[must_use]
pub fn error_payload(error: &ToolError) -> Value {
    serde_json::json!({
        "error": error.to_string(),
        "why": match error {
            ToolError::UnknownTool(_) => "The tool name is not registered",
            ToolError::InvalidInput(_) => "The input payload was rejected",
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn test_registry() -> (ToolRegistry, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let schema_manager = lode_db::SchemaManager::open(dir.path()).await.unwrap();
        let config = lode_config::LodeConfig::default();
        let embeddings =
            lode_embeddings::EmbeddingClient::new(config.embeddings.clone()).unwrap();
        let registry = ToolRegistry::new(ToolContext {
            config,
            schema_manager: Arc::new(schema_manager),
            embeddings: Arc::new(embeddings),
            default_repo: None,
        });
        (registry, dir)
    }

    #[tokio::test]
    async fn ping_answers() {
        let (registry, _dir) = test_registry().await;
        let result = registry.call("ping", serde_json::json!({})).await.unwrap();
        assert_eq!(result, serde_json::json!({"ok": "true"}));
    }

    #[tokio::test]
    async fn unknown_tool_errors() {
        let (registry, _dir) = test_registry().await;
        let result = registry.call("no_such_tool", serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::UnknownTool(_))));
    }

    #[tokio::test]
    async fn tool_failure_becomes_error_payload() {
        let (registry, _dir) = test_registry().await;
        // hybrid_search without a repo and without a default
        let result = registry
            .call("hybrid_search", serde_json::json!({"query": "login"}))
            .await
            .unwrap();
        assert!(result.get("error").is_some());
        assert!(result.get("why").is_some());
    }

    #[tokio::test]
    async fn builtin_tools_are_registered() {
        let (registry, _dir) = test_registry().await;
        let names = registry.tool_names();
        for expected in [
            "ping",
            "hybrid_search",
            "doc_search",
            "symbol_lookup",
            "symbol_context",
            "callers",
            "callees",
            "index_status",
            "list_tags",
            "tag_entity",
            "tag_rules_sync",
        ] {
            assert!(names.contains(&expected), "missing tool {expected}");
        }
    }
}
