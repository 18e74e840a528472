//! Python extractor — module-level functions, classes, methods, docstrings,
//! imports, inheritance, and best-effort intraprocedural calls.

use ast_grep_core::Node;
use ast_grep_core::matcher::KindMatcher;
use ast_grep_language::SupportLang;

use lode_core::enums::{EdgeKind, SymbolKind};

use super::helpers::{line_span, symbol_from_node};
use crate::types::{ParsedEdge, ParsedSymbol};

/// Extract module-level functions and classes with their methods.
#[must_use]
pub fn extract_symbols<D: ast_grep_core::Doc<Lang = SupportLang>>(
    root: &ast_grep_core::AstGrep<D>,
    source: &str,
) -> Vec<ParsedSymbol> {
    let mut symbols = Vec::new();

    for node in root.root().children() {
        match node.kind().as_ref() {
            "function_definition" => {
                if let Some(symbol) = function_symbol(&node, source, None) {
                    symbols.push(symbol);
                }
            }
            "class_definition" => extract_class(&node, source, &mut symbols),
            "decorated_definition" => {
                // Unwrap the decoration and process the inner definition
                if let Some(inner) = node.children().find(|c| {
                    let k = c.kind();
                    k.as_ref() == "function_definition" || k.as_ref() == "class_definition"
                }) {
                    if inner.kind().as_ref() == "class_definition" {
                        extract_class(&inner, source, &mut symbols);
                    } else if let Some(symbol) = function_symbol(&inner, source, None) {
                        symbols.push(symbol);
                    }
                }
            }
            _ => {}
        }
    }

    symbols
}

fn extract_class<D: ast_grep_core::Doc<Lang = SupportLang>>(
    node: &Node<D>,
    source: &str,
    symbols: &mut Vec<ParsedSymbol>,
) {
    let Some(name) = node.field("name").map(|n| n.text().to_string()) else {
        return;
    };

    let bases = node
        .field("superclasses")
        .map(|s| s.text().to_string())
        .unwrap_or_default();
    let docstring = extract_docstring(node);

    symbols.push(symbol_from_node(
        node,
        source,
        name.clone(),
        name.clone(),
        SymbolKind::Class,
        format!("class {name}{bases}"),
        docstring,
    ));

    // Methods: direct and decorated function definitions in the class body
    let Some(body) = node.field("body") else {
        return;
    };
    for child in body.children() {
        let method_node = match child.kind().as_ref() {
            "function_definition" => Some(child),
            "decorated_definition" => child
                .children()
                .find(|c| c.kind().as_ref() == "function_definition"),
            _ => None,
        };
        if let Some(method) = method_node
            && let Some(symbol) = function_symbol(&method, source, Some(&name))
        {
            symbols.push(symbol);
        }
    }
}

fn function_symbol<D: ast_grep_core::Doc<Lang = SupportLang>>(
    node: &Node<D>,
    source: &str,
    class_name: Option<&str>,
) -> Option<ParsedSymbol> {
    let name = node.field("name").map(|n| n.text().to_string())?;
    let params = node
        .field("parameters")
        .map_or_else(|| "()".to_string(), |p| p.text().to_string());

    let (fqn, kind) = match class_name {
        Some(class) => (format!("{class}.{name}"), SymbolKind::Method),
        None => (name.clone(), SymbolKind::Function),
    };
    let docstring = extract_docstring(node);

    Some(symbol_from_node(
        node,
        source,
        fqn,
        name.clone(),
        kind,
        format!("{name}{params}"),
        docstring,
    ))
}

/// Docstring: the first statement of the body when it is a string literal.
fn extract_docstring<D: ast_grep_core::Doc<Lang = SupportLang>>(node: &Node<D>) -> Option<String> {
    let body = node.field("body")?;
    let first = body.children().next()?;
    if first.kind().as_ref() != "expression_statement" {
        return None;
    }
    let string = first.children().find(|c| c.kind().as_ref() == "string")?;
    let text = string.text().to_string();
    let cleaned = text
        .trim_start_matches("\"\"\"")
        .trim_end_matches("\"\"\"")
        .trim_start_matches("'''")
        .trim_end_matches("'''")
        .trim_matches('"')
        .trim_matches('\'')
        .trim()
        .to_string();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Extract imports (1.0), inheritance (0.7–0.8), and simple calls (0.5).
#[must_use]
pub fn extract_edges<D: ast_grep_core::Doc<Lang = SupportLang>>(
    root: &ast_grep_core::AstGrep<D>,
    _source: &str,
) -> Vec<ParsedEdge> {
    let mut edges = Vec::new();
    extract_imports(root, &mut edges);
    extract_inheritance(root, &mut edges);
    extract_calls(root, &mut edges);
    edges
}

fn extract_imports<D: ast_grep_core::Doc<Lang = SupportLang>>(
    root: &ast_grep_core::AstGrep<D>,
    edges: &mut Vec<ParsedEdge>,
) {
    for node in root
        .root()
        .find_all(KindMatcher::new("import_statement", SupportLang::Python))
    {
        let (start_line, end_line) = line_span(&node);
        for child in node.children() {
            if child.kind().as_ref() == "dotted_name" {
                edges.push(ParsedEdge {
                    kind: EdgeKind::Imports,
                    src: None,
                    dst: child.text().to_string(),
                    confidence: 1.0,
                    start_line,
                    end_line,
                });
            }
        }
    }

    for node in root.root().find_all(KindMatcher::new(
        "import_from_statement",
        SupportLang::Python,
    )) {
        let (start_line, end_line) = line_span(&node);
        let module = node
            .field("module_name")
            .map(|m| m.text().to_string())
            .unwrap_or_default();
        for child in node.children() {
            let k = child.kind();
            let imported = match k.as_ref() {
                "dotted_name" if child.text() != module => child.text().to_string(),
                "aliased_import" => match child.field("name") {
                    Some(name) => name.text().to_string(),
                    None => continue,
                },
                _ => continue,
            };
            let dst = if module.is_empty() {
                imported
            } else {
                format!("{module}.{imported}")
            };
            edges.push(ParsedEdge {
                kind: EdgeKind::Imports,
                src: None,
                dst,
                confidence: 1.0,
                start_line,
                end_line,
            });
        }
    }
}

fn extract_inheritance<D: ast_grep_core::Doc<Lang = SupportLang>>(
    root: &ast_grep_core::AstGrep<D>,
    edges: &mut Vec<ParsedEdge>,
) {
    for node in root
        .root()
        .find_all(KindMatcher::new("class_definition", SupportLang::Python))
    {
        let Some(class_name) = node.field("name").map(|n| n.text().to_string()) else {
            continue;
        };
        let Some(bases) = node.field("superclasses") else {
            continue;
        };
        let (start_line, end_line) = line_span(&node);

        for child in bases.children() {
            // `attribute` bases (module.Base) resolve less reliably
            let confidence = match child.kind().as_ref() {
                "identifier" => 0.8,
                "attribute" => 0.7,
                _ => continue,
            };
            edges.push(ParsedEdge {
                kind: EdgeKind::Inherits,
                src: Some(class_name.clone()),
                dst: child.text().to_string(),
                confidence,
                start_line,
                end_line,
            });
        }
    }
}

/// Intraprocedural simple-identifier calls only. Method calls and qualified
/// callees are skipped; confidence stays low accordingly.
fn extract_calls<D: ast_grep_core::Doc<Lang = SupportLang>>(
    root: &ast_grep_core::AstGrep<D>,
    edges: &mut Vec<ParsedEdge>,
) {
    for function in root
        .root()
        .find_all(KindMatcher::new("function_definition", SupportLang::Python))
    {
        let Some(caller) = function.field("name").map(|n| n.text().to_string()) else {
            continue;
        };
        let Some(body) = function.field("body") else {
            continue;
        };

        for call in body.find_all(KindMatcher::new("call", SupportLang::Python)) {
            let Some(callee) = call.field("function") else {
                continue;
            };
            if callee.kind().as_ref() != "identifier" {
                continue;
            }
            let (start_line, end_line) = line_span(&call);
            edges.push(ParsedEdge {
                kind: EdgeKind::Calls,
                src: Some(caller.clone()),
                dst: callee.text().to_string(),
                confidence: 0.5,
                start_line,
                end_line,
            });
        }
    }
}
