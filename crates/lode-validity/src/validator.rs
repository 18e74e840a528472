//! Reference validation against the indexed repository.
//!
//! Each extracted reference is looked up exactly (name/FQN or path), then
//! trigram-fuzzily when the exact lookup misses. Misses become issues with a
//! "did you mean" suggestion when a close match exists.

use lode_core::entities::ValidityIssue;
use lode_db::LodeStore;

use crate::error::ValidityError;
use crate::reference_extractor::{CodeReference, RefType};

/// Suggestions require at least this trigram similarity.
const SUGGESTION_FLOOR: f64 = 0.3;

/// Result of validating all references of one document.
#[derive(Debug, Default)]
pub struct ValidationSummary {
    pub references_checked: usize,
    pub references_valid: usize,
    pub issues: Vec<ValidityIssue>,
    /// Paths of files the document demonstrably refers to (for freshness).
    pub related_files: Vec<String>,
}

/// Validate references against the repository.
///
/// # Errors
///
/// Returns [`ValidityError::Database`] if lookups fail.
pub async fn validate_references(
    store: &LodeStore,
    repo_id: &str,
    document_id: &str,
    references: &[CodeReference],
) -> Result<ValidationSummary, ValidityError> {
    let mut summary = ValidationSummary::default();

    for reference in references {
        summary.references_checked += 1;
        let outcome = match reference.ref_type {
            RefType::File => validate_file(store, repo_id, reference).await?,
            RefType::Symbol => validate_symbol(store, repo_id, reference).await?,
            RefType::Import | RefType::Module => {
                validate_module(store, repo_id, reference).await?
            }
        };

        match outcome {
            Outcome::Valid { related_file } => {
                summary.references_valid += 1;
                if let Some(path) = related_file {
                    if !summary.related_files.contains(&path) {
                        summary.related_files.push(path);
                    }
                }
            }
            Outcome::Missing {
                issue_type,
                found_match,
                found_similarity,
                suggestion,
            } => summary.issues.push(ValidityIssue {
                id: String::new(),
                document_id: document_id.to_string(),
                issue_type,
                severity: "warning".to_string(),
                reference_text: reference.text.clone(),
                reference_line: reference.line_number,
                expected_kind: reference.expected_kind.clone(),
                found_match,
                found_similarity,
                suggestion,
            }),
        }
    }

    Ok(summary)
}

enum Outcome {
    Valid {
        related_file: Option<String>,
    },
    Missing {
        issue_type: String,
        found_match: Option<String>,
        found_similarity: Option<f64>,
        suggestion: Option<String>,
    },
}

async fn validate_file(
    store: &LodeStore,
    repo_id: &str,
    reference: &CodeReference,
) -> Result<Outcome, ValidityError> {
    if let Some(file) = store.get_file_by_path(repo_id, &reference.text).await? {
        return Ok(Outcome::Valid {
            related_file: Some(file.path),
        });
    }

    // Referenced paths are often repo-root-relative while docs live deeper;
    // accept a unique suffix match before calling it missing.
    let fuzzy = store.fuzzy_file_paths(repo_id, &reference.text, 1).await?;
    if let Some((path, similarity)) = fuzzy.first() {
        if path.ends_with(&reference.text) || reference.text.ends_with(path.as_str()) {
            return Ok(Outcome::Valid {
                related_file: Some(path.clone()),
            });
        }
        if *similarity >= SUGGESTION_FLOOR {
            return Ok(Outcome::Missing {
                issue_type: "missing_file".to_string(),
                found_match: Some(path.clone()),
                found_similarity: Some(*similarity),
                suggestion: Some(format!("File not found. Did you mean '{path}'?")),
            });
        }
    }
    Ok(Outcome::Missing {
        issue_type: "missing_file".to_string(),
        found_match: None,
        found_similarity: None,
        suggestion: None,
    })
}

async fn validate_symbol(
    store: &LodeStore,
    repo_id: &str,
    reference: &CodeReference,
) -> Result<Outcome, ValidityError> {
    // Exact FQN, then exact simple name
    if let Some(symbol) = store.get_symbol_by_fqn(repo_id, &reference.text).await? {
        let path = store.get_file(&symbol.file_id).await?.map(|f| f.path);
        return Ok(Outcome::Valid { related_file: path });
    }
    let simple_name = reference
        .text
        .rsplit('.')
        .next()
        .unwrap_or(&reference.text);
    let by_name = store.get_symbols_by_name(repo_id, simple_name, 1).await?;
    if let Some(symbol) = by_name.first() {
        let path = store.get_file(&symbol.file_id).await?.map(|f| f.path);
        return Ok(Outcome::Valid { related_file: path });
    }

    // Trigram-fuzzy suggestion
    let fuzzy = store.fuzzy_symbols(repo_id, simple_name, 1).await?;
    if let Some(closest) = fuzzy.first()
        && closest.similarity >= SUGGESTION_FLOOR
    {
        return Ok(Outcome::Missing {
            issue_type: "missing_symbol".to_string(),
            found_match: Some(closest.symbol.name.clone()),
            found_similarity: Some(closest.similarity),
            suggestion: Some(format!(
                "Symbol not found. Did you mean '{}' ({})?",
                closest.symbol.name,
                closest.symbol.kind.as_str()
            )),
        });
    }
    Ok(Outcome::Missing {
        issue_type: "missing_symbol".to_string(),
        found_match: None,
        found_similarity: None,
        suggestion: None,
    })
}

/// Imports and module paths: valid when any symbol FQN or file path starts
/// with the module's path form.
async fn validate_module(
    store: &LodeStore,
    repo_id: &str,
    reference: &CodeReference,
) -> Result<Outcome, ValidityError> {
    let last_segment = reference
        .text
        .rsplit('.')
        .next()
        .unwrap_or(&reference.text);

    // A module usually maps to a file: auth.sessions → auth/sessions.py
    let path_form = reference.text.replace('.', "/");
    let fuzzy = store.fuzzy_file_paths(repo_id, &path_form, 3).await?;
    for (path, _) in &fuzzy {
        let stem = path.rsplit('/').next().unwrap_or(path);
        if stem.starts_with(&format!("{last_segment}.")) || path.contains(&path_form) {
            return Ok(Outcome::Valid {
                related_file: Some(path.clone()),
            });
        }
    }

    // Or to a symbol (from x import Name)
    if let Some(symbol) = store.get_symbol_by_fqn(repo_id, last_segment).await? {
        let path = store.get_file(&symbol.file_id).await?.map(|f| f.path);
        return Ok(Outcome::Valid { related_file: path });
    }

    // Standard-library and third-party imports are not issues; report them
    // as unresolved only when something similar exists in the repo.
    let best = fuzzy.first();
    if let Some((path, similarity)) = best
        && *similarity >= SUGGESTION_FLOOR
    {
        return Ok(Outcome::Missing {
            issue_type: "broken_import".to_string(),
            found_match: Some(path.clone()),
            found_similarity: Some(*similarity),
            suggestion: Some(format!("Import not found. Did you mean '{path}'?")),
        });
    }
    Ok(Outcome::Valid { related_file: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference_extractor::{DocFormat, extract_references};
    use lode_core::enums::{Language, SymbolKind};
    use lode_db::repos::indexing::{FileIndexData, NewSymbol};
    use pretty_assertions::assert_eq;

    fn symbol(fqn: &str, name: &str, kind: SymbolKind) -> NewSymbol {
        NewSymbol {
            fqn: fqn.to_string(),
            name: name.to_string(),
            kind,
            signature: format!("{name}()"),
            start_line: 1,
            end_line: 5,
            start_byte: 0,
            end_byte: 50,
            docstring: None,
            content_hash: lode_core::hashing::content_hash_str(fqn),
        }
    }

    async fn seeded() -> (LodeStore, String) {
        let store = LodeStore::open_in_memory().await.unwrap();
        let repo = store.ensure_repo("demo", "/tmp").await.unwrap();
        let data = FileIndexData {
            path: "src/services/auth.py".to_string(),
            language: Language::Python,
            content_hash: "h1".to_string(),
            mtime: chrono::Utc::now(),
            symbols: vec![
                symbol("User", "User", SymbolKind::Class),
                symbol("User.authenticate", "authenticate", SymbolKind::Method),
            ],
            chunks: Vec::new(),
            edges: Vec::new(),
        };
        store.apply_file_index(&repo.id, &data).await.unwrap();
        (store, repo.id)
    }

    #[tokio::test]
    async fn valid_references_count_and_relate_files() {
        let (store, repo_id) = seeded().await;
        let md = "Use `User.authenticate()` from src/services/auth.py.";
        let references = extract_references(md, DocFormat::Markdown);

        let summary = validate_references(&store, &repo_id, "doc-1", &references)
            .await
            .unwrap();
        assert_eq!(summary.references_checked, references.len());
        assert_eq!(summary.references_valid, references.len());
        assert!(summary.issues.is_empty());
        assert_eq!(summary.related_files, vec!["src/services/auth.py"]);
    }

    #[tokio::test]
    async fn missing_symbol_gets_fuzzy_suggestion() {
        let (store, repo_id) = seeded().await;
        let references = extract_references("Call `authentcate()`.", DocFormat::Markdown);

        let summary = validate_references(&store, &repo_id, "doc-1", &references)
            .await
            .unwrap();
        assert_eq!(summary.references_valid, 0);
        assert_eq!(summary.issues.len(), 1);
        let issue = &summary.issues[0];
        assert_eq!(issue.issue_type, "missing_symbol");
        assert_eq!(issue.found_match.as_deref(), Some("authenticate"));
        assert!(issue.suggestion.as_deref().unwrap().contains("authenticate"));
        assert!(issue.found_similarity.unwrap() > 0.3);
    }

    #[tokio::test]
    async fn stdlib_import_is_not_an_issue() {
        let (store, repo_id) = seeded().await;
        let references = extract_references(
            "```python\nimport hashlib\n```",
            DocFormat::Markdown,
        );
        let summary = validate_references(&store, &repo_id, "doc-1", &references)
            .await
            .unwrap();
        assert_eq!(summary.references_valid, 1);
        assert!(summary.issues.is_empty());
    }

    #[tokio::test]
    async fn missing_file_reported() {
        let (store, repo_id) = seeded().await;
        let references = extract_references(
            "See src/services/payments.py for details.",
            DocFormat::Markdown,
        );
        let summary = validate_references(&store, &repo_id, "doc-1", &references)
            .await
            .unwrap();
        assert_eq!(summary.references_valid, 0);
        assert_eq!(summary.issues[0].issue_type, "missing_file");
    }
}
