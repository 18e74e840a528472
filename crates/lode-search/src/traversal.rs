//! Bounded BFS over CALLS edges.
//!
//! The call graph is cyclic in general; an explicit visited set keyed by
//! symbol id breaks cycles, and each symbol yields once at its minimum depth.
//! Results are flat lists sorted by `(depth, fqn)`.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use lode_core::entities::Symbol;
use lode_core::enums::EdgeKind;
use lode_db::LodeStore;

use crate::error::SearchError;

/// Which way to follow CALLS edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Symbols that (transitively) call the start symbol.
    Callers,
    /// Symbols the start symbol (transitively) calls.
    Callees,
}

/// One reachable symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalNode {
    pub symbol: Symbol,
    /// Hops from the start symbol (1 = immediate neighbor).
    pub depth: u32,
    pub edge_kind: EdgeKind,
    /// Confidence of the edge that first reached this symbol.
    pub confidence: f64,
}

/// All symbols reachable by CALLS edges in `direction`, up to `max_depth`
/// hops. The start symbol itself is not included.
///
/// # Errors
///
/// Returns [`SearchError::NotFound`] for an unknown start symbol and
/// [`SearchError::Database`] if edge queries fail.
pub async fn traverse(
    store: &LodeStore,
    start_symbol_id: &str,
    direction: Direction,
    max_depth: u32,
) -> Result<Vec<TraversalNode>, SearchError> {
    if store.get_symbol(start_symbol_id).await?.is_none() {
        return Err(SearchError::NotFound(format!(
            "symbol {start_symbol_id}"
        )));
    }

    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start_symbol_id.to_string());
    let mut queue: VecDeque<(String, u32)> = VecDeque::new();
    queue.push_back((start_symbol_id.to_string(), 0));
    let mut nodes = Vec::new();

    while let Some((symbol_id, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }

        let edges = match direction {
            Direction::Callers => store.edges_to(&symbol_id, EdgeKind::Calls).await?,
            Direction::Callees => store.edges_from(&symbol_id, EdgeKind::Calls).await?,
        };

        for edge in edges {
            let next_id = match direction {
                Direction::Callers => match &edge.src_symbol_id {
                    Some(id) => id.clone(),
                    None => continue,
                },
                Direction::Callees => edge.dst_symbol_id.clone(),
            };
            if !visited.insert(next_id.clone()) {
                continue;
            }
            let Some(symbol) = store.get_symbol(&next_id).await? else {
                continue;
            };
            nodes.push(TraversalNode {
                symbol,
                depth: depth + 1,
                edge_kind: edge.kind,
                confidence: edge.confidence,
            });
            queue.push_back((next_id, depth + 1));
        }
    }

    nodes.sort_by(|a, b| {
        a.depth
            .cmp(&b.depth)
            .then_with(|| a.symbol.fqn.cmp(&b.symbol.fqn))
    });
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lode_core::enums::{Language, SymbolKind};
    use lode_db::repos::indexing::{FileIndexData, NewEdge, NewSymbol};
    use pretty_assertions::assert_eq;

    fn symbol(fqn: &str) -> NewSymbol {
        NewSymbol {
            fqn: fqn.to_string(),
            name: fqn.to_string(),
            kind: SymbolKind::Function,
            signature: format!("{fqn}()"),
            start_line: 1,
            end_line: 2,
            start_byte: 0,
            end_byte: 10,
            docstring: None,
            content_hash: lode_core::hashing::content_hash_str(fqn),
        }
    }

    fn call(src: &str, dst: &str) -> NewEdge {
        NewEdge {
            kind: lode_core::enums::EdgeKind::Calls,
            src: Some(src.to_string()),
            dst: dst.to_string(),
            confidence: 0.5,
            evidence_start_line: 1,
            evidence_end_line: 1,
        }
    }

    /// a → b → c, plus d → b, plus a cycle c → a.
    async fn call_graph(store: &LodeStore) -> String {
        let repo = store.ensure_repo("demo", "/tmp").await.unwrap();
        let data = FileIndexData {
            path: "calls.py".to_string(),
            language: Language::Python,
            content_hash: "h1".to_string(),
            mtime: chrono::Utc::now(),
            symbols: vec![symbol("a"), symbol("b"), symbol("c"), symbol("d")],
            chunks: Vec::new(),
            edges: vec![
                call("a", "b"),
                call("b", "c"),
                call("d", "b"),
                call("c", "a"),
            ],
        };
        store.apply_file_index(&repo.id, &data).await.unwrap();
        repo.id
    }

    #[tokio::test]
    async fn callees_bfs_with_depths() {
        let store = LodeStore::open_in_memory().await.unwrap();
        let repo_id = call_graph(&store).await;
        let a = store.get_symbol_by_fqn(&repo_id, "a").await.unwrap().unwrap();

        let nodes = traverse(&store, &a.id, Direction::Callees, 3).await.unwrap();
        let reached: Vec<(&str, u32)> = nodes
            .iter()
            .map(|n| (n.symbol.fqn.as_str(), n.depth))
            .collect();
        // a → b (1) → c (2); the cycle back to a is cut by the visited set
        assert_eq!(reached, vec![("b", 1), ("c", 2)]);
    }

    #[tokio::test]
    async fn callers_direction() {
        let store = LodeStore::open_in_memory().await.unwrap();
        let repo_id = call_graph(&store).await;
        let b = store.get_symbol_by_fqn(&repo_id, "b").await.unwrap().unwrap();

        let nodes = traverse(&store, &b.id, Direction::Callers, 1).await.unwrap();
        let reached: Vec<&str> = nodes.iter().map(|n| n.symbol.fqn.as_str()).collect();
        assert_eq!(reached, vec!["a", "d"], "sorted by fqn within one depth");
    }

    #[tokio::test]
    async fn max_depth_bounds_traversal() {
        let store = LodeStore::open_in_memory().await.unwrap();
        let repo_id = call_graph(&store).await;
        let a = store.get_symbol_by_fqn(&repo_id, "a").await.unwrap().unwrap();

        let nodes = traverse(&store, &a.id, Direction::Callees, 1).await.unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].symbol.fqn, "b");
    }

    #[tokio::test]
    async fn cycle_yields_each_symbol_once_at_min_depth() {
        let store = LodeStore::open_in_memory().await.unwrap();
        let repo_id = call_graph(&store).await;
        let c = store.get_symbol_by_fqn(&repo_id, "c").await.unwrap().unwrap();

        // c → a → b → (c cycle cut)
        let nodes = traverse(&store, &c.id, Direction::Callees, 10).await.unwrap();
        let fqns: Vec<&str> = nodes.iter().map(|n| n.symbol.fqn.as_str()).collect();
        assert_eq!(fqns, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn unknown_start_symbol_errors() {
        let store = LodeStore::open_in_memory().await.unwrap();
        store.ensure_repo("demo", "/tmp").await.unwrap();
        let result = traverse(&store, "sym-missing", Direction::Callees, 2).await;
        assert!(matches!(result, Err(SearchError::NotFound(_))));
    }

    #[tokio::test]
    async fn symbol_without_calls_returns_empty() {
        let store = LodeStore::open_in_memory().await.unwrap();
        let repo_id = call_graph(&store).await;
        let d = store.get_symbol_by_fqn(&repo_id, "d").await.unwrap().unwrap();
        let nodes = traverse(&store, &d.id, Direction::Callers, 2).await.unwrap();
        assert!(nodes.is_empty());
    }
}
