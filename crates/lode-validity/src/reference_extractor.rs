//! Code reference extraction from documentation.
//!
//! Finds references to code elements (functions, classes, files, imports) in
//! markdown, reStructuredText, and AsciiDoc text, and classifies each with an
//! expected kind for validation.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// What a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefType {
    Symbol,
    File,
    Import,
    Module,
}

impl RefType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::File => "file",
            Self::Import => "import",
            Self::Module => "module",
        }
    }
}

/// A code reference extracted from documentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeReference {
    /// The raw reference text, normalized (no call parens).
    pub text: String,
    pub ref_type: RefType,
    pub line_number: Option<u32>,
    pub confidence: f64,
    /// `function`, `class`, `method`, `variable`, … when inferable.
    pub expected_kind: Option<String>,
}

/// Documentation format for pattern selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Markdown,
    Rst,
    Asciidoc,
}

impl DocFormat {
    /// Choose a format from a file path.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let lowered = path.to_lowercase();
        if lowered.ends_with(".rst") {
            Self::Rst
        } else if lowered.ends_with(".adoc") || lowered.ends_with(".asciidoc") {
            Self::Asciidoc
        } else {
            Self::Markdown
        }
    }
}

static INLINE_CODE_MD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+)`").unwrap_or_else(|_| unreachable!()));
static INLINE_CODE_RST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"``([^`]+)``").unwrap_or_else(|_| unreachable!()));
static RST_ROLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":(?:py:)?(?:func|class|meth|attr|mod|data|const|obj|exc|ref|doc):`([^`]+)`")
        .unwrap_or_else(|_| unreachable!())
});
static FILE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?:^|[\s(\[{])([A-Za-z0-9_./\-]+\.(?:py|js|ts|tsx|jsx|go|java|rs|rb|cpp|c|h|hpp|yaml|yml|json|toml|sql|sh))(?:[\s)\]}:,]|$)",
    )
    .unwrap_or_else(|_| unreachable!())
});
static LINK_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]*\]\(([^)]+\.(?:py|js|ts|tsx|jsx|go|java|rs|rb|yaml|yml|json|sql))\)")
        .unwrap_or_else(|_| unreachable!())
});
static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(\w*)\n(.*?)```").unwrap_or_else(|_| unreachable!()));
static IMPORT_STMT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:from\s+([A-Za-z_][\w.]*)\s+import\s+([\w.,\s*]+)|import\s+([A-Za-z_][\w.]*))")
        .unwrap_or_else(|_| unreachable!())
});
static FUNCTION_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][\w]*(?:\.[A-Za-z_][\w]*)*)\s*\(").unwrap_or_else(|_| unreachable!())
});
static CLASS_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Za-z0-9_]*$").unwrap_or_else(|_| unreachable!()));
static MODULE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z_][\w]*(?:\.[a-z_][\w]*)+$").unwrap_or_else(|_| unreachable!())
});
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][\w]*$").unwrap_or_else(|_| unreachable!()));

/// Extract all code references from a document.
#[must_use]
pub fn extract_references(content: &str, format: DocFormat) -> Vec<CodeReference> {
    let mut references = Vec::new();

    match format {
        DocFormat::Markdown | DocFormat::Asciidoc => {
            extract_inline(content, &INLINE_CODE_MD, &mut references);
            extract_link_files(content, &mut references);
            extract_code_blocks(content, &mut references);
        }
        DocFormat::Rst => {
            extract_rst_roles(content, &mut references);
            extract_inline(content, &INLINE_CODE_RST, &mut references);
        }
    }
    extract_file_paths(content, &mut references);

    dedupe(references)
}

fn line_of(content: &str, offset: usize) -> u32 {
    #[allow(clippy::cast_possible_truncation)]
    {
        content[..offset].matches('\n').count() as u32 + 1
    }
}

fn extract_inline(content: &str, pattern: &Regex, references: &mut Vec<CodeReference>) {
    for capture in pattern.captures_iter(content) {
        let Some(m) = capture.get(1) else { continue };
        let text = m.as_str().trim();
        if let Some(reference) = classify_inline(text, line_of(content, m.start())) {
            references.push(reference);
        }
    }
}

/// Classify inline code as a symbol / module / file reference, or reject it
/// (shell snippets, options, prose fragments).
fn classify_inline(text: &str, line: u32) -> Option<CodeReference> {
    if text.len() > 80 || text.contains(' ') && !text.contains('(') {
        return None;
    }

    if text.contains('/') || FILE_PATH.is_match(&format!(" {text} ")) {
        // Paths inside backticks are handled by the file-path pass
        return None;
    }

    if let Some(capture) = FUNCTION_CALL.captures(text) {
        let name = capture.get(1)?.as_str().to_string();
        let expected = if name.contains('.') { "method" } else { "function" };
        return Some(CodeReference {
            text: name,
            ref_type: RefType::Symbol,
            line_number: Some(line),
            confidence: 1.0,
            expected_kind: Some(expected.to_string()),
        });
    }
    if CLASS_NAME.is_match(text) {
        return Some(CodeReference {
            text: text.to_string(),
            ref_type: RefType::Symbol,
            line_number: Some(line),
            confidence: 0.9,
            expected_kind: Some("class".to_string()),
        });
    }
    if MODULE_PATH.is_match(text) {
        return Some(CodeReference {
            text: text.to_string(),
            ref_type: RefType::Module,
            line_number: Some(line),
            confidence: 0.7,
            expected_kind: None,
        });
    }
    if IDENTIFIER.is_match(text) && text.len() > 2 {
        return Some(CodeReference {
            text: text.to_string(),
            ref_type: RefType::Symbol,
            line_number: Some(line),
            confidence: 0.5,
            expected_kind: None,
        });
    }
    None
}

fn extract_file_paths(content: &str, references: &mut Vec<CodeReference>) {
    for capture in FILE_PATH.captures_iter(content) {
        let Some(m) = capture.get(1) else { continue };
        references.push(CodeReference {
            text: m.as_str().trim_start_matches("./").to_string(),
            ref_type: RefType::File,
            line_number: Some(line_of(content, m.start())),
            confidence: 0.9,
            expected_kind: None,
        });
    }
}

fn extract_link_files(content: &str, references: &mut Vec<CodeReference>) {
    for capture in LINK_FILE.captures_iter(content) {
        let Some(m) = capture.get(1) else { continue };
        references.push(CodeReference {
            text: m.as_str().trim_start_matches("./").to_string(),
            ref_type: RefType::File,
            line_number: Some(line_of(content, m.start())),
            confidence: 1.0,
            expected_kind: None,
        });
    }
}

fn extract_code_blocks(content: &str, references: &mut Vec<CodeReference>) {
    for capture in FENCED_BLOCK.captures_iter(content) {
        let Some(code) = capture.get(2) else { continue };
        let base_line = line_of(content, code.start());
        for import_capture in IMPORT_STMT.captures_iter(code.as_str()) {
            if let Some(module) = import_capture.get(1).or_else(|| import_capture.get(3)) {
                references.push(CodeReference {
                    text: module.as_str().to_string(),
                    ref_type: RefType::Import,
                    line_number: Some(base_line + line_of(code.as_str(), module.start()) - 1),
                    confidence: 1.0,
                    expected_kind: None,
                });
            }
        }
    }
}

fn extract_rst_roles(content: &str, references: &mut Vec<CodeReference>) {
    for capture in RST_ROLE.captures_iter(content) {
        let Some(m) = capture.get(1) else { continue };
        let full = capture.get(0).map_or("", |f| f.as_str());
        let expected_kind = if full.contains("func:") {
            Some("function".to_string())
        } else if full.contains("class:") || full.contains("exc:") {
            Some("class".to_string())
        } else if full.contains("meth:") {
            Some("method".to_string())
        } else {
            None
        };
        let ref_type = if full.contains("mod:") {
            RefType::Module
        } else {
            RefType::Symbol
        };
        references.push(CodeReference {
            text: m.as_str().to_string(),
            ref_type,
            line_number: Some(line_of(content, m.start())),
            confidence: 1.0,
            expected_kind,
        });
    }
}

fn dedupe(references: Vec<CodeReference>) -> Vec<CodeReference> {
    let mut seen = std::collections::HashSet::new();
    references
        .into_iter()
        .filter(|r| seen.insert((r.text.clone(), r.ref_type)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE_MD: &str = "# Auth\n\nCall `User.login()` after constructing a `User`.\nThe limit lives in `MAX_SESSIONS`.\nSee [the service](src/services/auth.py) and src/models/user.py for details.\n\n```python\nfrom auth import User\nimport hashlib\n```\n";

    fn find<'a>(refs: &'a [CodeReference], text: &str) -> &'a CodeReference {
        refs.iter()
            .find(|r| r.text == text)
            .unwrap_or_else(|| panic!("no reference '{text}'"))
    }

    #[test]
    fn method_call_classified() {
        let refs = extract_references(SAMPLE_MD, DocFormat::Markdown);
        let login = find(&refs, "User.login");
        assert_eq!(login.ref_type, RefType::Symbol);
        assert_eq!(login.expected_kind.as_deref(), Some("method"));
        assert_eq!(login.line_number, Some(3));
    }

    #[test]
    fn class_name_classified() {
        let refs = extract_references(SAMPLE_MD, DocFormat::Markdown);
        let user = find(&refs, "User");
        assert_eq!(user.expected_kind.as_deref(), Some("class"));
    }

    #[test]
    fn constant_is_a_loose_symbol() {
        let refs = extract_references(SAMPLE_MD, DocFormat::Markdown);
        let constant = find(&refs, "MAX_SESSIONS");
        assert_eq!(constant.ref_type, RefType::Symbol);
        assert!(constant.confidence < 1.0);
    }

    #[test]
    fn file_paths_from_links_and_prose() {
        let refs = extract_references(SAMPLE_MD, DocFormat::Markdown);
        assert_eq!(find(&refs, "src/services/auth.py").ref_type, RefType::File);
        assert_eq!(find(&refs, "src/models/user.py").ref_type, RefType::File);
    }

    #[test]
    fn imports_from_fenced_blocks() {
        let refs = extract_references(SAMPLE_MD, DocFormat::Markdown);
        assert_eq!(find(&refs, "auth").ref_type, RefType::Import);
        assert_eq!(find(&refs, "hashlib").ref_type, RefType::Import);
    }

    #[test]
    fn rst_roles_extracted() {
        let rst = "See :py:func:`connect` and :py:class:`Session` in :py:mod:`pool.core`.\n";
        let refs = extract_references(rst, DocFormat::Rst);
        assert_eq!(
            find(&refs, "connect").expected_kind.as_deref(),
            Some("function")
        );
        assert_eq!(
            find(&refs, "Session").expected_kind.as_deref(),
            Some("class")
        );
        assert_eq!(find(&refs, "pool.core").ref_type, RefType::Module);
    }

    #[test]
    fn duplicates_collapse() {
        let md = "`User` then `User` again and `User` once more.";
        let refs = extract_references(md, DocFormat::Markdown);
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn prose_in_backticks_ignored() {
        let md = "`not a symbol at all` and `--flag-name`";
        let refs = extract_references(md, DocFormat::Markdown);
        assert!(refs.is_empty());
    }

    #[test]
    fn format_detection() {
        assert_eq!(DocFormat::from_path("README.md"), DocFormat::Markdown);
        assert_eq!(DocFormat::from_path("api.rst"), DocFormat::Rst);
        assert_eq!(DocFormat::from_path("guide.adoc"), DocFormat::Asciidoc);
    }
}
