//! Built-in retrieval tools.

use std::sync::Arc;

use serde_json::{Value, json};

use lode_core::enums::{EntityKind, TagSource};
use lode_search::hybrid::{SearchFilters, SearchWeights};
use lode_search::{Direction, doc_search, hybrid_search, symbol_context, traverse};

use crate::context::ToolContext;
use crate::error::ToolError;
use crate::registry::ToolRegistry;

fn str_field(input: &Value, field: &str) -> Result<String, ToolError> {
    input
        .get(field)
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| ToolError::InvalidInput(format!("missing '{field}'")))
}

fn str_list(input: &Value, field: &str) -> Vec<String> {
    input
        .get(field)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn u32_field(input: &Value, field: &str, default: u32) -> u32 {
    input
        .get(field)
        .and_then(serde_json::Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(default)
}

/// Resolve a symbol by `symbol_id` or `fqn` from the input.
async fn resolve_symbol(
    store: &lode_db::LodeStore,
    repo_id: &str,
    input: &Value,
) -> Result<lode_core::entities::Symbol, ToolError> {
    if let Some(id) = input.get("symbol_id").and_then(|v| v.as_str()) {
        return store
            .get_symbol(id)
            .await
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?
            .ok_or_else(|| ToolError::InvalidInput(format!("symbol '{id}' not found")));
    }
    if let Some(fqn) = input.get("fqn").and_then(|v| v.as_str()) {
        return store
            .get_symbol_by_fqn(repo_id, fqn)
            .await
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?
            .ok_or_else(|| ToolError::InvalidInput(format!("symbol '{fqn}' not found")));
    }
    Err(ToolError::InvalidInput(
        "must provide either 'fqn' or 'symbol_id'".to_string(),
    ))
}

async fn repo_for(
    store: &lode_db::LodeStore,
    context: &ToolContext,
    input: &Value,
) -> Result<lode_core::entities::Repository, ToolError> {
    let name = context.repo_name(input)?;
    store
        .get_repo_by_name(&name)
        .await
        .map_err(|e| ToolError::InvalidInput(e.to_string()))?
        .ok_or_else(|| ToolError::InvalidInput(format!("repository '{name}' is not indexed")))
}

/// Register every built-in tool.
#[allow(clippy::too_many_lines)]
pub fn register_builtin(registry: &mut ToolRegistry) {
    registry.register("ping", |_context, _input| async move {
        Ok(json!({"ok": "true"}))
    });

    registry.register("hybrid_search", |context, input| async move {
        let store = context.open_store(&input).await?;
        let repo = repo_for(&store, &context, &input).await?;
        let query = str_field(&input, "query")?;
        let filters = SearchFilters {
            tags_any: str_list(&input, "tags_any"),
            tags_all: str_list(&input, "tags_all"),
        };
        let mut search_config = context.config.search.clone();
        search_config.final_top_k =
            u32_field(&input, "final_top_k", search_config.final_top_k);

        let results = hybrid_search(
            &store,
            &context.embeddings,
            &repo.id,
            &query,
            &filters,
            SearchWeights::from_config(&context.config.search),
            &search_config,
        )
        .await
        .map_err(|e| ToolError::InvalidInput(e.to_string()))?;

        Ok(json!({
            "query": query,
            "total_results": results.len(),
            "results": results,
        }))
    });

    registry.register("doc_search", |context, input| async move {
        let store = context.open_store(&input).await?;
        let repo = repo_for(&store, &context, &input).await?;
        let query = str_field(&input, "query")?;
        let mut search_config = context.config.search.clone();
        search_config.final_top_k =
            u32_field(&input, "final_top_k", search_config.final_top_k);

        let results = doc_search::doc_search(
            &store,
            &context.embeddings,
            &repo.id,
            &query,
            SearchWeights::from_config(&context.config.search),
            &search_config,
        )
        .await
        .map_err(|e| ToolError::InvalidInput(e.to_string()))?;

        Ok(json!({
            "query": query,
            "total_results": results.len(),
            "results": results,
        }))
    });

    registry.register("symbol_lookup", |context, input| async move {
        let store = context.open_store(&input).await?;
        let repo = repo_for(&store, &context, &input).await?;

        // all_matches exposes cross-file FQN collisions instead of the
        // last-writer-wins default
        if input.get("all_matches").and_then(serde_json::Value::as_bool) == Some(true) {
            let fqn = str_field(&input, "fqn")?;
            let symbols = store
                .get_symbols_by_fqn(&repo.id, &fqn)
                .await
                .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
            if symbols.is_empty() {
                return Err(ToolError::InvalidInput(format!("symbol '{fqn}' not found")));
            }
            return Ok(json!({"matches": symbols}));
        }

        let symbol = resolve_symbol(&store, &repo.id, &input).await?;
        let file_path = store
            .get_file(&symbol.file_id)
            .await
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?
            .map(|f| f.path);
        Ok(json!({"symbol": symbol, "file_path": file_path}))
    });

    registry.register("symbol_context", |context, input| async move {
        let store = context.open_store(&input).await?;
        let repo = repo_for(&store, &context, &input).await?;
        let symbol = resolve_symbol(&store, &repo.id, &input).await?;
        let max_depth = u32_field(&input, "max_depth", 2);
        let budget = u32_field(
            &input,
            "budget_tokens",
            context.config.search.context_budget_tokens,
        );

        let packed = symbol_context(&store, &symbol.id, max_depth, budget)
            .await
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        Ok(serde_json::to_value(packed).unwrap_or_default())
    });

    registry.register("callers", |context, input| async move {
        traversal_tool(&context, &input, Direction::Callers).await
    });

    registry.register("callees", |context, input| async move {
        traversal_tool(&context, &input, Direction::Callees).await
    });

    registry.register("index_status", |context, input| async move {
        let store = context.open_store(&input).await?;
        let repo = repo_for(&store, &context, &input).await?;
        let state = store
            .get_index_state(&repo.id)
            .await
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        let edges = store
            .count_edges(&repo.id)
            .await
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        Ok(json!({
            "repo": repo.name,
            "namespace": repo.namespace,
            "state": state,
            "edge_count": edges,
        }))
    });

    registry.register("list_tags", |context, input| async move {
        let store = context.open_store(&input).await?;
        let repo = repo_for(&store, &context, &input).await?;
        let tags = store
            .list_tags(&repo.id)
            .await
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        let items: Vec<Value> = tags
            .into_iter()
            .map(|(tag, count)| json!({"name": tag.name, "assignments": count}))
            .collect();
        Ok(json!({"tags": items}))
    });

    registry.register("tag_entity", |context, input| async move {
        let store = context.open_store(&input).await?;
        let repo = repo_for(&store, &context, &input).await?;
        let tag = str_field(&input, "tag")?;
        let entity_id = str_field(&input, "entity_id")?;
        let entity_kind = match str_field(&input, "entity_kind")?.as_str() {
            "file" => EntityKind::File,
            "symbol" => EntityKind::Symbol,
            "chunk" => EntityKind::Chunk,
            "document" => EntityKind::Document,
            other => {
                return Err(ToolError::InvalidInput(format!(
                    "unknown entity_kind '{other}'"
                )));
            }
        };
        store
            .tag_entity(&repo.id, &tag, entity_kind, &entity_id, TagSource::Manual, 1.0)
            .await
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        Ok(json!({"tagged": true, "tag": tag, "entity_id": entity_id}))
    });

    registry.register("tag_rules_sync", |context, input| async move {
        let store = context.open_store(&input).await?;
        let repo = repo_for(&store, &context, &input).await?;
        let synced = lode_index::tagging::sync_tag_rules(&store, &repo.id)
            .await
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        Ok(json!({"files_synced": synced}))
    });
}

async fn traversal_tool(
    context: &Arc<ToolContext>,
    input: &Value,
    direction: Direction,
) -> Result<Value, ToolError> {
    let store = context.open_store(input).await?;
    let repo = repo_for(&store, context, input).await?;
    let symbol = resolve_symbol(&store, &repo.id, input).await?;
    let max_depth = u32_field(input, "max_depth", 2);

    let nodes = traverse(&store, &symbol.id, direction, max_depth)
        .await
        .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
    Ok(json!({
        "start": symbol.fqn,
        "total": nodes.len(),
        "results": nodes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn input_helpers() {
        let input = json!({"query": "login", "tags_any": ["auth", 3], "final_top_k": 5});
        assert_eq!(str_field(&input, "query").unwrap(), "login");
        assert!(str_field(&input, "missing").is_err());
        assert_eq!(str_list(&input, "tags_any"), vec!["auth"]);
        assert_eq!(u32_field(&input, "final_top_k", 12), 5);
        assert_eq!(u32_field(&input, "absent", 12), 12);
    }
}
