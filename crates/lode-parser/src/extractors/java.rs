//! Java extractor — classes, methods, interfaces, imports, inheritance,
//! and interface implementation.

use ast_grep_core::Node;
use ast_grep_core::matcher::KindMatcher;
use ast_grep_language::SupportLang;

use lode_core::enums::{EdgeKind, SymbolKind};

use super::helpers::{find_child, line_span, symbol_from_node};
use crate::types::{ParsedEdge, ParsedSymbol};

#[must_use]
pub fn extract_symbols<D: ast_grep_core::Doc<Lang = SupportLang>>(
    root: &ast_grep_core::AstGrep<D>,
    source: &str,
) -> Vec<ParsedSymbol> {
    let mut symbols = Vec::new();

    for node in root
        .root()
        .find_all(KindMatcher::new("class_declaration", SupportLang::Java))
    {
        extract_class(&node, source, &mut symbols);
    }

    for node in root
        .root()
        .find_all(KindMatcher::new("interface_declaration", SupportLang::Java))
    {
        let Some(name) = node.field("name").map(|n| n.text().to_string()) else {
            continue;
        };
        symbols.push(symbol_from_node(
            &node,
            source,
            name.clone(),
            name.clone(),
            SymbolKind::Interface,
            format!("interface {name}"),
            None,
        ));
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

    symbols.push(symbol_from_node(
        node,
        source,
        name.clone(),
        name.clone(),
        SymbolKind::Class,
        format!("class {name}"),
        None,
    ));

    let Some(body) = node.field("body") else {
        return;
    };
    for child in body.children() {
        if child.kind().as_ref() != "method_declaration" {
            continue;
        }
        let Some(method_name) = child.field("name").map(|n| n.text().to_string()) else {
            continue;
        };
        let params = child
            .field("parameters")
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

#[must_use]
pub fn extract_edges<D: ast_grep_core::Doc<Lang = SupportLang>>(
    root: &ast_grep_core::AstGrep<D>,
    _source: &str,
) -> Vec<ParsedEdge> {
    let mut edges = Vec::new();

    for node in root
        .root()
        .find_all(KindMatcher::new("import_declaration", SupportLang::Java))
    {
        let (start_line, end_line) = line_span(&node);
        if let Some(scoped) = find_child(&node, "scoped_identifier") {
            edges.push(ParsedEdge {
                kind: EdgeKind::Imports,
                src: None,
                dst: scoped.text().to_string(),
                confidence: 1.0,
                start_line,
                end_line,
            });
        }
    }

    for node in root
        .root()
        .find_all(KindMatcher::new("class_declaration", SupportLang::Java))
    {
        let Some(class_name) = node.field("name").map(|n| n.text().to_string()) else {
            continue;
        };
        let (start_line, end_line) = line_span(&node);

        if let Some(superclass) = find_child(&node, "superclass")
            && let Some(base) = find_child(&superclass, "type_identifier")
        {
            edges.push(ParsedEdge {
                kind: EdgeKind::Inherits,
                src: Some(class_name.clone()),
                dst: base.text().to_string(),
                confidence: 0.9,
                start_line,
                end_line,
            });
        }

        if let Some(interfaces) = find_child(&node, "super_interfaces")
            && let Some(list) = find_child(&interfaces, "type_list")
        {
            for child in list.children() {
                if child.kind().as_ref() == "type_identifier" {
                    edges.push(ParsedEdge {
                        kind: EdgeKind::Implements,
                        src: Some(class_name.clone()),
                        dst: child.text().to_string(),
                        confidence: 0.9,
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

    const SAMPLE: &str = r"package com.example.store;

import java.util.Map;
import java.util.HashMap;

interface Repository {
    Object findById(String id);
}

class UserRepository extends BaseRepository implements Repository {
    private Map<String, Object> cache = new HashMap<>();

    public Object findById(String id) {
        return cache.get(id);
    }

    public void clear() {
        cache.clear();
    }
}
";

    #[test]
    fn classes_methods_interfaces() {
        let root = SupportLang::Java.ast_grep(SAMPLE);
        let symbols = extract_symbols(&root, SAMPLE);
        let fqns: Vec<&str> = symbols.iter().map(|s| s.fqn.as_str()).collect();
        assert!(fqns.contains(&"UserRepository"));
        assert!(fqns.contains(&"UserRepository.findById"));
        assert!(fqns.contains(&"UserRepository.clear"));
        assert!(fqns.contains(&"Repository"));

        let interface = symbols.iter().find(|s| s.fqn == "Repository").unwrap();
        assert_eq!(interface.kind, SymbolKind::Interface);
        let method = symbols
            .iter()
            .find(|s| s.fqn == "UserRepository.findById")
            .unwrap();
        assert_eq!(method.kind, SymbolKind::Method);
        assert_eq!(method.signature, "findById(String id)");
    }

    #[test]
    fn imports_inheritance_and_implements() {
        let root = SupportLang::Java.ast_grep(SAMPLE);
        let edges = extract_edges(&root, SAMPLE);

        let imports: Vec<&str> = edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Imports)
            .map(|e| e.dst.as_str())
            .collect();
        assert_eq!(imports, vec!["java.util.Map", "java.util.HashMap"]);

        let inherits = edges
            .iter()
            .find(|e| e.kind == EdgeKind::Inherits)
            .unwrap();
        assert_eq!(inherits.src.as_deref(), Some("UserRepository"));
        assert_eq!(inherits.dst, "BaseRepository");
        assert!((inherits.confidence - 0.9).abs() < f64::EPSILON);

        let implements = edges
            .iter()
            .find(|e| e.kind == EdgeKind::Implements)
            .unwrap();
        assert_eq!(implements.dst, "Repository");
    }
}
