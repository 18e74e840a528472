//! Per-language symbol and edge extractors.
//!
//! Each language module walks the ast-grep tree with `KindMatcher` queries and
//! yields [`ParsedSymbol`] / [`ParsedEdge`] records. Extraction is best-effort:
//! what a language does not support is simply absent from its output.
//!
//! Edge kinds emitted per language:
//!
//! | language   | IMPORTS | INHERITS | IMPLEMENTS | CALLS |
//! |------------|---------|----------|------------|-------|
//! | python     | ✓ 1.0   | ✓ 0.7–0.8| —          | ✓ 0.5 |
//! | javascript | ✓ 1.0   | ✓ 0.8    | —          | —     |
//! | typescript | ✓ 1.0   | ✓ 0.8    | ✓ 0.9      | —     |
//! | go         | ✓ 1.0   | —        | —          | —     |
//! | java       | ✓ 1.0   | ✓ 0.9    | ✓ 0.9      | —     |

pub mod go;
pub(crate) mod helpers;
pub mod java;
pub mod javascript;
pub mod python;
pub mod typescript;

use ast_grep_language::SupportLang;

use lode_core::enums::Language;

use crate::types::{ParsedEdge, ParsedSymbol};

/// Extract all symbols from a parsed tree.
#[must_use]
pub fn extract_symbols<D: ast_grep_core::Doc<Lang = SupportLang>>(
    root: &ast_grep_core::AstGrep<D>,
    source: &str,
    language: Language,
) -> Vec<ParsedSymbol> {
    match language {
        Language::Python => python::extract_symbols(root, source),
        Language::Javascript => javascript::extract_symbols(root, source),
        Language::Typescript => typescript::extract_symbols(root, source),
        Language::Go => go::extract_symbols(root, source),
        Language::Java => java::extract_symbols(root, source),
        Language::Sql | Language::Unknown => Vec::new(),
    }
}

/// Extract all edges from a parsed tree.
#[must_use]
pub fn extract_edges<D: ast_grep_core::Doc<Lang = SupportLang>>(
    root: &ast_grep_core::AstGrep<D>,
    source: &str,
    language: Language,
) -> Vec<ParsedEdge> {
    match language {
        Language::Python => python::extract_edges(root, source),
        Language::Javascript => javascript::extract_edges(root, source),
        Language::Typescript => typescript::extract_edges(root, source),
        Language::Go => go::extract_edges(root, source),
        Language::Java => java::extract_edges(root, source),
        Language::Sql | Language::Unknown => Vec::new(),
    }
}
