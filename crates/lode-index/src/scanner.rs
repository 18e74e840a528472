//! Repository walking: code files and documentation files.
//!
//! Uses the `ignore` crate, so `.gitignore` rules apply automatically.
//! Dependency and build directories are excluded explicitly for repositories
//! without ignore files.

use std::path::{Path, PathBuf};

use lode_core::enums::Language;
use lode_parser::language::detect_language;

/// Directory names never worth indexing.
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "target",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
    "vendor",
];

/// Documentation extensions picked up by the doc ingester. SQL dumps are
/// ingested as `SQL_SCHEMA` documents in addition to their code indexing.
const DOC_EXTENSIONS: &[&str] = &[
    "md", "markdown", "mdx", "html", "htm", "pdf", "txt", "rst", "sql",
];

fn skippable(path: &Path) -> bool {
    path.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| SKIP_DIRS.contains(&name))
    })
}

/// Walk the repository yielding `(absolute_path, language)` for every file
/// with a known language.
#[must_use]
pub fn scan_repo(root: &Path) -> Vec<(PathBuf, Language)> {
    let mut files = Vec::new();
    for entry in ignore::WalkBuilder::new(root).hidden(true).build().flatten() {
        let path = entry.path();
        if !entry.file_type().is_some_and(|ft| ft.is_file()) || skippable(path) {
            continue;
        }
        let language = detect_language(&path.to_string_lossy());
        if language != Language::Unknown {
            files.push((path.to_path_buf(), language));
        }
    }
    files.sort();
    files
}

/// Walk the repository yielding documentation files.
#[must_use]
pub fn scan_docs(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in ignore::WalkBuilder::new(root).hidden(true).build().flatten() {
        let path = entry.path();
        if !entry.file_type().is_some_and(|ft| ft.is_file()) || skippable(path) {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if DOC_EXTENSIONS.contains(&ext.as_str()) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "content").unwrap();
    }

    #[test]
    fn scan_finds_code_and_skips_junk() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/auth.py");
        touch(dir.path(), "src/app.ts");
        touch(dir.path(), "schema.sql");
        touch(dir.path(), "node_modules/pkg/index.js");
        touch(dir.path(), "data.csv");

        let files = scan_repo(dir.path());
        let names: Vec<String> = files
            .iter()
            .map(|(p, _)| {
                p.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["schema.sql", "src/app.ts", "src/auth.py"]);
    }

    #[test]
    fn scan_docs_finds_documentation() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "README.md");
        touch(dir.path(), "docs/limits.md");
        touch(dir.path(), "docs/manual.pdf");
        touch(dir.path(), "src/auth.py");

        let docs = scan_docs(dir.path());
        assert_eq!(docs.len(), 3);
        assert!(docs.iter().all(|p| p.extension().is_some()));
    }

    #[test]
    fn languages_detected_during_scan() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "main.go");
        let files = scan_repo(dir.path());
        assert_eq!(files[0].1, Language::Go);
    }
}
