//! Symbol context packing.
//!
//! Combines a symbol's definition, both directions of call-graph traversal,
//! and evidence chunks into a budgeted context package. Packing order:
//! definition of the target, immediate callers (confidence descending),
//! immediate callees, then the widening frontier depth by depth. Packing
//! stops when the next span would exceed the token budget.

use serde::{Deserialize, Serialize};

use lode_core::entities::Symbol;
use lode_db::LodeStore;

use crate::error::SearchError;
use crate::traversal::{Direction, TraversalNode, traverse};

/// One packed source span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSpan {
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    /// `definition`, `caller`, or `callee`.
    pub label: String,
    pub symbol_fqn: String,
    pub chars: usize,
}

/// The packed context for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolContext {
    pub symbol: Symbol,
    pub file_path: String,
    pub spans: Vec<ContextSpan>,
    pub total_chars: usize,
    pub total_tokens_approx: usize,
    pub callers_count: usize,
    pub callees_count: usize,
    pub depth_reached: u32,
}

/// Approximate tokens as chars / 4.
const CHARS_PER_TOKEN: usize = 4;

/// Build a budgeted context package for a symbol.
///
/// # Errors
///
/// Returns [`SearchError::NotFound`] for an unknown symbol and
/// [`SearchError::Database`] if lookups fail.
pub async fn symbol_context(
    store: &LodeStore,
    symbol_id: &str,
    max_depth: u32,
    budget_tokens: u32,
) -> Result<SymbolContext, SearchError> {
    let symbol = store
        .get_symbol(symbol_id)
        .await?
        .ok_or_else(|| SearchError::NotFound(format!("symbol {symbol_id}")))?;
    let file_path = store
        .get_file(&symbol.file_id)
        .await?
        .map(|f| f.path)
        .unwrap_or_default();

    let callers = traverse(store, symbol_id, Direction::Callers, max_depth).await?;
    let callees = traverse(store, symbol_id, Direction::Callees, max_depth).await?;

    let budget_chars = budget_tokens as usize * CHARS_PER_TOKEN;
    let mut packer = Packer {
        store,
        spans: Vec::new(),
        used_chars: 0,
        budget_chars,
        depth_reached: 0,
    };

    // 1. The definition itself
    packer.pack_symbol(&symbol, &file_path, "definition").await?;

    // 2. Immediate callers by confidence, then immediate callees,
    //    then the widening frontier.
    let mut depth = 1u32;
    while depth <= max_depth {
        let caller_wave = by_depth_confidence(&callers, depth);
        let callee_wave = by_depth_confidence(&callees, depth);
        if caller_wave.is_empty() && callee_wave.is_empty() {
            break;
        }
        for node in caller_wave {
            packer.pack_node(node, "caller", depth).await?;
        }
        for node in callee_wave {
            packer.pack_node(node, "callee", depth).await?;
        }
        depth += 1;
    }

    let total_chars = packer.used_chars;
    Ok(SymbolContext {
        symbol,
        file_path,
        spans: packer.spans,
        total_chars,
        total_tokens_approx: total_chars / CHARS_PER_TOKEN,
        callers_count: callers.len(),
        callees_count: callees.len(),
        depth_reached: packer.depth_reached,
    })
}

fn by_depth_confidence(nodes: &[TraversalNode], depth: u32) -> Vec<&TraversalNode> {
    let mut wave: Vec<&TraversalNode> = nodes.iter().filter(|n| n.depth == depth).collect();
    wave.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.symbol.fqn.cmp(&b.symbol.fqn))
    });
    wave
}

struct Packer<'s> {
    store: &'s LodeStore,
    spans: Vec<ContextSpan>,
    used_chars: usize,
    budget_chars: usize,
    depth_reached: u32,
}

impl Packer<'_> {
    async fn pack_node(
        &mut self,
        node: &TraversalNode,
        label: &str,
        depth: u32,
    ) -> Result<(), SearchError> {
        let file_path = self
            .store
            .get_file(&node.symbol.file_id)
            .await?
            .map(|f| f.path)
            .unwrap_or_default();
        if self.pack_symbol(&node.symbol, &file_path, label).await? {
            self.depth_reached = self.depth_reached.max(depth);
        }
        Ok(())
    }

    /// Pack a symbol's chunks; returns whether anything fit.
    async fn pack_symbol(
        &mut self,
        symbol: &Symbol,
        file_path: &str,
        label: &str,
    ) -> Result<bool, SearchError> {
        let chunks = self.store.chunks_for_symbol(&symbol.id).await?;
        let mut packed = false;
        for chunk in chunks {
            let chars = chunk.content.len();
            if self.used_chars + chars > self.budget_chars {
                // Budget reached: stop taking spans, keep bookkeeping honest
                return Ok(packed);
            }
            self.used_chars += chars;
            self.spans.push(ContextSpan {
                file_path: file_path.to_string(),
                start_line: chunk.start_line,
                end_line: chunk.end_line,
                content: chunk.content,
                label: label.to_string(),
                symbol_fqn: symbol.fqn.clone(),
                chars,
            });
            packed = true;
        }
        Ok(packed)
    }
}
