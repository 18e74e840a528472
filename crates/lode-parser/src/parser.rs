//! ast-grep wrapper: language mapping and tree construction.

use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_language::SupportLang;

use lode_core::enums::Language;

/// The concrete AST tree type returned by [`parse_source`].
pub type AstTree = ast_grep_core::AstGrep<StrDoc<SupportLang>>;

/// Map a Lode language (and path, for the JSX/TSX split) to a grammar.
///
/// Returns `None` for SQL and unknown files, which take the fallback chunkers.
#[must_use]
pub fn support_lang(language: Language, path: &str) -> Option<SupportLang> {
    match language {
        Language::Python => Some(SupportLang::Python),
        Language::Javascript => Some(SupportLang::JavaScript),
        Language::Typescript => {
            if path.to_lowercase().ends_with(".tsx") {
                Some(SupportLang::Tsx)
            } else {
                Some(SupportLang::TypeScript)
            }
        }
        Language::Go => Some(SupportLang::Go),
        Language::Java => Some(SupportLang::Java),
        Language::Sql | Language::Unknown => None,
    }
}

/// Parse source code into an ast-grep tree for the given grammar.
#[must_use]
pub fn parse_source(source: &str, lang: SupportLang) -> AstTree {
    use ast_grep_language::LanguageExt;
    lang.ast_grep(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sql_has_no_parser() {
        assert_eq!(support_lang(Language::Sql, "schema.sql"), None);
        assert_eq!(support_lang(Language::Unknown, "data.bin"), None);
    }

    #[test]
    fn tsx_gets_tsx_grammar() {
        assert_eq!(
            support_lang(Language::Typescript, "App.tsx"),
            Some(SupportLang::Tsx)
        );
        assert_eq!(
            support_lang(Language::Typescript, "index.ts"),
            Some(SupportLang::TypeScript)
        );
    }

    #[test]
    fn parse_source_produces_valid_tree() {
        let tree = parse_source("def hello(): pass", SupportLang::Python);
        assert_eq!(tree.root().kind().as_ref(), "module");
    }
}
