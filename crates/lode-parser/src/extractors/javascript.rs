//! JavaScript extractor — functions, classes, methods, imports, inheritance.

use ast_grep_core::Node;
use ast_grep_core::matcher::KindMatcher;
use ast_grep_language::SupportLang;

use lode_core::enums::{EdgeKind, SymbolKind};

use super::helpers::{find_child, line_span, strip_quotes, symbol_from_node};
use crate::types::{ParsedEdge, ParsedSymbol};

/// Extract functions, classes, and class methods. Works for both the
/// JavaScript and TSX grammars (shared node kinds).
#[must_use]
pub fn extract_symbols<D: ast_grep_core::Doc<Lang = SupportLang>>(
    root: &ast_grep_core::AstGrep<D>,
    source: &str,
) -> Vec<ParsedSymbol> {
    let lang = *root.root().lang();
    let mut symbols = Vec::new();

    for node in root
        .root()
        .find_all(KindMatcher::new("function_declaration", lang))
    {
        if let Some(symbol) = function_symbol(&node, source) {
            symbols.push(symbol);
        }
    }

    for node in root
        .root()
        .find_all(KindMatcher::new("class_declaration", lang))
    {
        extract_class(&node, source, &mut symbols);
    }

    symbols
}

fn function_symbol<D: ast_grep_core::Doc<Lang = SupportLang>>(
    node: &Node<D>,
    source: &str,
) -> Option<ParsedSymbol> {
    let name = node.field("name").map(|n| n.text().to_string())?;
    let params = node
        .field("parameters")
        .map_or_else(|| "()".to_string(), |p| p.text().to_string());
    Some(symbol_from_node(
        node,
        source,
        name.clone(),
        name.clone(),
        SymbolKind::Function,
        format!("function {name}{params}"),
        None,
    ))
}

fn extract_class<D: ast_grep_core::Doc<Lang = SupportLang>>(
    node: &Node<D>,
    source: &str,
    symbols: &mut Vec<ParsedSymbol>,
) {
    let Some(name) = node.field("name").map(|n| n.text().to_string()) else {
        return;
    };

    symbols.push(symbol_from_node(
        node,
        source,
        name.clone(),
        name.clone(),
        SymbolKind::Class,
        format!("class {name}"),
        None,
    ));

    let Some(body) = find_child(node, "class_body") else {
        return;
    };
    for child in body.children() {
        if child.kind().as_ref() != "method_definition" {
            continue;
        }
        let Some(method_name) = find_child(&child, "property_identifier").map(|n| n.text().to_string())
        else {
            continue;
        };
        let params = find_child(&child, "formal_parameters")
            .map_or_else(|| "()".to_string(), |p| p.text().to_string());
        symbols.push(symbol_from_node(
            &child,
            source,
            format!("{name}.{method_name}"),
            method_name.clone(),
            SymbolKind::Method,
            format!("{method_name}{params}"),
            None,
        ));
    }
}

/// Extract ES module imports (1.0) and class inheritance (0.8).
#[must_use]
pub fn extract_edges<D: ast_grep_core::Doc<Lang = SupportLang>>(
    root: &ast_grep_core::AstGrep<D>,
    _source: &str,
) -> Vec<ParsedEdge> {
    let lang = *root.root().lang();
    let mut edges = Vec::new();

    for node in root
        .root()
        .find_all(KindMatcher::new("import_statement", lang))
    {
        let (start_line, end_line) = line_span(&node);
        if let Some(source_node) = node.field("source") {
            edges.push(ParsedEdge {
                kind: EdgeKind::Imports,
                src: None,
                dst: strip_quotes(&source_node.text()),
                confidence: 1.0,
                start_line,
                end_line,
            });
        }
    }

    extract_inheritance(root, &mut edges);
    edges
}

pub(super) fn extract_inheritance<D: ast_grep_core::Doc<Lang = SupportLang>>(
    root: &ast_grep_core::AstGrep<D>,
    edges: &mut Vec<ParsedEdge>,
) {
    let lang = *root.root().lang();
    for node in root
        .root()
        .find_all(KindMatcher::new("class_declaration", lang))
    {
        let Some(class_name) = node.field("name").map(|n| n.text().to_string()) else {
            continue;
        };
        let Some(heritage) = find_child(&node, "class_heritage") else {
            continue;
        };
        let (start_line, end_line) = line_span(&node);

        // JavaScript: heritage holds the expression directly.
        // TypeScript: heritage wraps extends_clause / implements_clause.
        for child in heritage.children() {
            match child.kind().as_ref() {
                "identifier" => edges.push(ParsedEdge {
                    kind: EdgeKind::Inherits,
                    src: Some(class_name.clone()),
                    dst: child.text().to_string(),
                    confidence: 0.8,
                    start_line,
                    end_line,
                }),
                "extends_clause" => {
                    for base in child.children() {
                        if matches!(base.kind().as_ref(), "identifier" | "type_identifier") {
                            edges.push(ParsedEdge {
                                kind: EdgeKind::Inherits,
                                src: Some(class_name.clone()),
                                dst: base.text().to_string(),
                                confidence: 0.8,
                                start_line,
                                end_line,
                            });
                        }
                    }
                }
                _ => {}
            }
        }
    }
}
