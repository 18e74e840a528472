//! Shared extraction helpers used by all language extractors.

use ast_grep_core::Node;

use lode_core::enums::SymbolKind;
use lode_core::hashing::content_hash;

use crate::types::ParsedSymbol;

/// First child with the given node kind.
pub fn find_child<'t, D: ast_grep_core::Doc>(
    node: &Node<'t, D>,
    kind: &str,
) -> Option<Node<'t, D>> {
    node.children().find(|c| c.kind().as_ref() == kind)
}

/// 1-indexed line span of a node.
pub fn line_span<D: ast_grep_core::Doc>(node: &Node<D>) -> (u32, u32) {
    #[allow(clippy::cast_possible_truncation)]
    let start = node.start_pos().line() as u32 + 1;
    #[allow(clippy::cast_possible_truncation)]
    let end = node.end_pos().line() as u32 + 1;
    (start, end)
}

/// Build a [`ParsedSymbol`] from a node, hashing its byte range in `source`.
pub fn symbol_from_node<D: ast_grep_core::Doc>(
    node: &Node<D>,
    source: &str,
    fqn: String,
    name: String,
    kind: SymbolKind,
    signature: String,
    docstring: Option<String>,
) -> ParsedSymbol {
    let (start_line, end_line) = line_span(node);
    let range = node.range();
    let bytes = source.as_bytes();
    let content = bytes.get(range.clone()).unwrap_or_default();
    #[allow(clippy::cast_possible_truncation)]
    ParsedSymbol {
        fqn,
        name,
        kind,
        signature,
        start_line,
        end_line,
        start_byte: range.start as u32,
        end_byte: range.end as u32,
        docstring,
        content_hash: content_hash(content),
    }
}

/// Strip matching quote pairs from an import path literal.
#[must_use]
pub fn strip_quotes(text: &str) -> String {
    text.trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}
