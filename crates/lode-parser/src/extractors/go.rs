//! Go extractor — functions, methods (receiver in signature), and imports.

use ast_grep_core::Node;
use ast_grep_core::matcher::KindMatcher;
use ast_grep_language::SupportLang;

use lode_core::enums::{EdgeKind, SymbolKind};

use super::helpers::{find_child, line_span, strip_quotes, symbol_from_node};
use crate::types::{ParsedEdge, ParsedSymbol};

#[must_use]
pub fn extract_symbols<D: ast_grep_core::Doc<Lang = SupportLang>>(
    root: &ast_grep_core::AstGrep<D>,
    source: &str,
) -> Vec<ParsedSymbol> {
    let mut symbols = Vec::new();

    for node in root
        .root()
        .find_all(KindMatcher::new("function_declaration", SupportLang::Go))
    {
        let Some(name) = node.field("name").map(|n| n.text().to_string()) else {
            continue;
        };
        let params = node
            .field("parameters")
            .map_or_else(|| "()".to_string(), |p| p.text().to_string());
        symbols.push(symbol_from_node(
            &node,
            source,
            name.clone(),
            name.clone(),
            SymbolKind::Function,
            format!("func {name}{params}"),
            None,
        ));
    }

    for node in root
        .root()
        .find_all(KindMatcher::new("method_declaration", SupportLang::Go))
    {
        let Some(name) = node.field("name").map(|n| n.text().to_string()) else {
            continue;
        };
        let receiver_node = node.field("receiver");
        let receiver_text = receiver_node
            .as_ref()
            .map(|r| r.text().to_string())
            .unwrap_or_default();
        // Many Go types implement a method of the same name (Close, String),
        // so the FQN carries the receiver type: `Store.Get`.
        let fqn = receiver_node
            .as_ref()
            .and_then(receiver_type)
            .map_or_else(|| name.clone(), |receiver| format!("{receiver}.{name}"));
        let params = node
            .field("parameters")
            .map_or_else(|| "()".to_string(), |p| p.text().to_string());
        symbols.push(symbol_from_node(
            &node,
            source,
            fqn,
            name.clone(),
            SymbolKind::Method,
            format!("func {receiver_text} {name}{params}"),
            None,
        ));
    }

    symbols
}

/// Receiver type name from `(s *Store)` / `(s Store)` / `(s *Store[T])`.
fn receiver_type<D: ast_grep_core::Doc<Lang = SupportLang>>(
    receiver: &Node<D>,
) -> Option<String> {
    let declaration = find_child(receiver, "parameter_declaration")?;
    let type_text = declaration.field("type")?.text().to_string();
    let name = type_text.trim_start_matches('*');
    let name = name.split('[').next().unwrap_or(name).trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Imports only; Go interface satisfaction is implicit and not extractable
/// from a single file.
#[must_use]
pub fn extract_edges<D: ast_grep_core::Doc<Lang = SupportLang>>(
    root: &ast_grep_core::AstGrep<D>,
    _source: &str,
) -> Vec<ParsedEdge> {
    let mut edges = Vec::new();

    for node in root
        .root()
        .find_all(KindMatcher::new("import_declaration", SupportLang::Go))
    {
        let (start_line, end_line) = line_span(&node);

        // Single import: import "fmt"
        if let Some(spec) = find_child(&node, "import_spec")
            && let Some(path) = find_child(&spec, "interpreted_string_literal")
        {
            edges.push(ParsedEdge {
                kind: EdgeKind::Imports,
                src: None,
                dst: strip_quotes(&path.text()),
                confidence: 1.0,
                start_line,
                end_line,
            });
        }

        // Import list: import ( "fmt"; "io" )
        if let Some(list) = find_child(&node, "import_spec_list") {
            for child in list.children() {
                if child.kind().as_ref() == "import_spec"
                    && let Some(path) = find_child(&child, "interpreted_string_literal")
                {
                    edges.push(ParsedEdge {
                        kind: EdgeKind::Imports,
                        src: None,
                        dst: strip_quotes(&path.text()),
                        confidence: 1.0,
                        start_line,
                        end_line,
                    });
                }
            }
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast_grep_language::LanguageExt;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"package store

import (
	"fmt"
	"io"
)

import "errors"

type Store struct {
	items map[string]string
}

func New() *Store {
	return &Store{items: map[string]string{}}
}

func (s *Store) Get(key string) (string, error) {
	v, ok := s.items[key]
	if !ok {
		return "", errors.New("missing")
	}
	return v, nil
}
"#;

    #[test]
    fn functions_and_methods() {
        let root = SupportLang::Go.ast_grep(SAMPLE);
        let symbols = extract_symbols(&root, SAMPLE);

        let new = symbols.iter().find(|s| s.fqn == "New").unwrap();
        assert_eq!(new.kind, SymbolKind::Function);

        let get = symbols.iter().find(|s| s.fqn == "Store.Get").unwrap();
        assert_eq!(get.kind, SymbolKind::Method);
        assert_eq!(get.name, "Get");
        assert!(
            get.signature.contains("(s *Store)"),
            "receiver in signature: {}",
            get.signature
        );
    }

    #[test]
    fn same_method_name_on_two_types_keeps_distinct_fqns() {
        let source = "package io\n\ntype File struct{}\n\nfunc (f *File) Close() error {\n\treturn nil\n}\n\ntype Conn struct{}\n\nfunc (c Conn) Close() error {\n\treturn nil\n}\n";
        let root = SupportLang::Go.ast_grep(source);
        let symbols = extract_symbols(&root, source);

        let fqns: Vec<&str> = symbols.iter().map(|s| s.fqn.as_str()).collect();
        assert!(fqns.contains(&"File.Close"), "fqns: {fqns:?}");
        assert!(fqns.contains(&"Conn.Close"), "fqns: {fqns:?}");
    }

    #[test]
    fn generic_receiver_strips_type_parameters() {
        let source = "package cache\n\ntype Cache[K comparable, V any] struct{}\n\nfunc (c *Cache[K, V]) Get(key K) (V, bool) {\n\tvar zero V\n\treturn zero, false\n}\n";
        let root = SupportLang::Go.ast_grep(source);
        let symbols = extract_symbols(&root, source);

        let get = symbols.iter().find(|s| s.name == "Get").unwrap();
        assert_eq!(get.fqn, "Cache.Get");
    }

    #[test]
    fn grouped_and_single_imports() {
        let root = SupportLang::Go.ast_grep(SAMPLE);
        let edges = extract_edges(&root, SAMPLE);
        let paths: Vec<&str> = edges.iter().map(|e| e.dst.as_str()).collect();
        assert_eq!(paths, vec!["fmt", "io", "errors"]);
        assert!(edges.iter().all(|e| e.kind == EdgeKind::Imports));
        assert!(edges.iter().all(|e| e.src.is_none()));
    }
}
