//! TypeScript extractor — JavaScript extraction plus interfaces and
//! `implements` clauses.

use ast_grep_core::matcher::KindMatcher;
use ast_grep_language::SupportLang;

use lode_core::enums::{EdgeKind, SymbolKind};

use super::helpers::{find_child, line_span, symbol_from_node};
use super::javascript;
use crate::types::{ParsedEdge, ParsedSymbol};

/// JavaScript symbols plus `interface_declaration`.
#[must_use]
pub fn extract_symbols<D: ast_grep_core::Doc<Lang = SupportLang>>(
    root: &ast_grep_core::AstGrep<D>,
    source: &str,
) -> Vec<ParsedSymbol> {
    let lang = *root.root().lang();
    let mut symbols = javascript::extract_symbols(root, source);

    for node in root
        .root()
        .find_all(KindMatcher::new("interface_declaration", lang))
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

/// JavaScript edges plus IMPLEMENTS from `implements_clause` (0.9).
#[must_use]
pub fn extract_edges<D: ast_grep_core::Doc<Lang = SupportLang>>(
    root: &ast_grep_core::AstGrep<D>,
    source: &str,
) -> Vec<ParsedEdge> {
    let lang = *root.root().lang();
    let mut edges = javascript::extract_edges(root, source);

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
        let Some(implements) = find_child(&heritage, "implements_clause") else {
            continue;
        };
        let (start_line, end_line) = line_span(&node);

        for child in implements.children() {
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

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast_grep_language::LanguageExt;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r"import { Logger } from './logger';

interface Repository {
  findById(id: string): Promise<unknown>;
}

class UserRepository implements Repository {
  findById(id: string) {
    return Promise.resolve(null);
  }
}

class CachedUserRepository extends UserRepository {
  cache = new Map();
}
";

    #[test]
    fn interfaces_extracted() {
        let root = SupportLang::TypeScript.ast_grep(SAMPLE);
        let symbols = extract_symbols(&root, SAMPLE);
        let interface = symbols.iter().find(|s| s.fqn == "Repository").unwrap();
        assert_eq!(interface.kind, SymbolKind::Interface);
        assert_eq!(interface.signature, "interface Repository");
    }

    #[test]
    fn implements_edge_has_high_confidence() {
        let root = SupportLang::TypeScript.ast_grep(SAMPLE);
        let edges = extract_edges(&root, SAMPLE);
        let implements: Vec<&ParsedEdge> = edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Implements)
            .collect();
        assert_eq!(implements.len(), 1);
        assert_eq!(implements[0].src.as_deref(), Some("UserRepository"));
        assert_eq!(implements[0].dst, "Repository");
        assert!((implements[0].confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn extends_still_produces_inherits() {
        let root = SupportLang::TypeScript.ast_grep(SAMPLE);
        let edges = extract_edges(&root, SAMPLE);
        assert!(
            edges
                .iter()
                .any(|e| e.kind == EdgeKind::Inherits
                    && e.src.as_deref() == Some("CachedUserRepository")
                    && e.dst == "UserRepository")
        );
    }

    #[test]
    fn imports_carried_from_javascript_extraction() {
        let root = SupportLang::TypeScript.ast_grep(SAMPLE);
        let edges = extract_edges(&root, SAMPLE);
        assert!(
            edges
                .iter()
                .any(|e| e.kind == EdgeKind::Imports && e.dst == "./logger")
        );
    }
}
