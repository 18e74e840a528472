//! Rule-based tagging.
//!
//! Applied at index time with source `RULE`; rebuilt on every reindex while
//! `MANUAL` tags survive. Rules match on path segments and language.

use lode_core::enums::{EntityKind, Language, TagSource};
use lode_db::LodeStore;

use crate::error::IndexError;

/// Path-substring rules: `(needle, tag)`.
const PATH_RULES: &[(&str, &str)] = &[
    ("test", "test"),
    ("spec", "test"),
    ("migration", "migration"),
    ("config", "config"),
    ("service", "service"),
    ("model", "model"),
    ("entit", "model"),
    ("controller", "api"),
    ("route", "api"),
    ("handler", "api"),
    ("script", "script"),
    ("doc", "docs"),
];

/// Apply file tag rules: one language tag plus any matching path tags.
///
/// # Errors
///
/// Returns [`IndexError::Database`] if a tag write fails.
pub async fn apply_file_rules(
    store: &LodeStore,
    repo_id: &str,
    file_id: &str,
    rel_path: &str,
    language: Language,
) -> Result<(), IndexError> {
    store
        .tag_entity(
            repo_id,
            language.as_str(),
            EntityKind::File,
            file_id,
            TagSource::Rule,
            1.0,
        )
        .await?;

    let lowered = rel_path.to_lowercase();
    for (needle, tag) in PATH_RULES {
        if lowered.contains(needle) {
            store
                .tag_entity(repo_id, tag, EntityKind::File, file_id, TagSource::Rule, 1.0)
                .await?;
        }
    }
    Ok(())
}

/// Re-apply rules to every file of a repository (the `tag_rules_sync`
/// operation). Manual tags are untouched.
///
/// # Errors
///
/// Returns [`IndexError::Database`] if a query or write fails.
pub async fn sync_tag_rules(store: &LodeStore, repo_id: &str) -> Result<usize, IndexError> {
    let mut rows = store
        .db()
        .query(
            "SELECT id, path, language FROM file WHERE repo_id = ?1 ORDER BY path",
            [repo_id],
        )
        .await?;

    let mut synced = 0usize;
    let mut files = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(lode_db::DatabaseError::from)?
    {
        let id: String = row.get(0).map_err(lode_db::DatabaseError::from)?;
        let path: String = row.get(1).map_err(lode_db::DatabaseError::from)?;
        let language: String = row.get(2).map_err(lode_db::DatabaseError::from)?;
        files.push((id, path, language));
    }

    for (file_id, path, language) in files {
        let language = lode_db::helpers::parse_enum::<Language>(&language)?;
        apply_file_rules(store, repo_id, &file_id, &path, language).await?;
        synced += 1;
    }
    Ok(synced)
}
