//! Single-file reindexing: transactional DELETE and UPSERT.
//!
//! DELETE removes the file row and all derived data while preserving manual
//! tags. UPSERT runs the same per-file pipeline as the repository walk, so
//! running it twice on an unchanged file is a no-op (hash match → `Skipped`).

use std::path::Path;

use lode_config::IndexerConfig;
use lode_core::enums::{IndexOutcome, ReindexOp};
use lode_db::LodeStore;
use lode_parser::language::detect_language;

use crate::error::IndexError;
use crate::indexer::Indexer;

/// Result of a single-file reindex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReindexResult {
    Deleted,
    /// DELETE of a file that was never indexed.
    NotFound,
    Upserted(IndexOutcome),
}

/// Apply a single-file reindex operation.
///
/// # Errors
///
/// Returns [`IndexError::InvalidPath`] when `abs_path` is outside
/// `repo_root`, or [`IndexError::Database`] on storage failure. Either way
/// storage is unchanged for the file.
pub async fn reindex_file(
    store: &LodeStore,
    config: &IndexerConfig,
    repo_id: &str,
    repo_root: &Path,
    abs_path: &Path,
    op: ReindexOp,
) -> Result<ReindexResult, IndexError> {
    let rel_path = abs_path
        .strip_prefix(repo_root)
        .map_err(|_| IndexError::InvalidPath(abs_path.to_string_lossy().into_owned()))?
        .to_string_lossy()
        .into_owned();

    match op {
        ReindexOp::Delete => {
            let Some(file) = store.get_file_by_path(repo_id, &rel_path).await? else {
                tracing::debug!(path = %rel_path, "delete for unindexed file");
                return Ok(ReindexResult::NotFound);
            };
            store.delete_file(repo_id, &file.id).await?;
            tracing::info!(path = %rel_path, "file deleted from index");
            Ok(ReindexResult::Deleted)
        }
        ReindexOp::Upsert => {
            let language = detect_language(&rel_path);
            let indexer = Indexer::new(config.clone());
            let outcome = indexer
                .index_file(store, repo_id, repo_root, abs_path, language)
                .await?;
            Ok(ReindexResult::Upserted(outcome))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lode_core::enums::{EntityKind, TagSource};
    use pretty_assertions::assert_eq;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn upsert_twice_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "auth.py", "def login(pwd):\n    return pwd\n");
        let store = LodeStore::open_in_memory().await.unwrap();
        let repo = store.ensure_repo("demo", "/tmp").await.unwrap();
        let config = IndexerConfig::default();

        let first = reindex_file(
            &store,
            &config,
            &repo.id,
            dir.path(),
            &dir.path().join("auth.py"),
            ReindexOp::Upsert,
        )
        .await
        .unwrap();
        assert_eq!(first, ReindexResult::Upserted(IndexOutcome::Indexed));

        let second = reindex_file(
            &store,
            &config,
            &repo.id,
            dir.path(),
            &dir.path().join("auth.py"),
            ReindexOp::Upsert,
        )
        .await
        .unwrap();
        assert_eq!(second, ReindexResult::Upserted(IndexOutcome::Skipped));
    }

    #[tokio::test]
    async fn delete_removes_derived_data_and_keeps_manual_tags() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "auth.py", "class User:\n    def login(self):\n        pass\n");
        let store = LodeStore::open_in_memory().await.unwrap();
        let repo = store.ensure_repo("demo", "/tmp").await.unwrap();
        let config = IndexerConfig::default();

        reindex_file(
            &store,
            &config,
            &repo.id,
            dir.path(),
            &dir.path().join("auth.py"),
            ReindexOp::Upsert,
        )
        .await
        .unwrap();

        let file = store
            .get_file_by_path(&repo.id, "auth.py")
            .await
            .unwrap()
            .unwrap();
        store
            .tag_entity(
                &repo.id,
                "reviewed",
                EntityKind::File,
                &file.id,
                TagSource::Manual,
                1.0,
            )
            .await
            .unwrap();

        let result = reindex_file(
            &store,
            &config,
            &repo.id,
            dir.path(),
            &dir.path().join("auth.py"),
            ReindexOp::Delete,
        )
        .await
        .unwrap();
        assert_eq!(result, ReindexResult::Deleted);

        assert!(
            store
                .get_file_by_path(&repo.id, "auth.py")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .get_symbol_by_fqn(&repo.id, "User")
                .await
                .unwrap()
                .is_none()
        );
        let tags = store
            .tags_for_entity(EntityKind::File, &file.id)
            .await
            .unwrap();
        assert_eq!(tags.len(), 1, "manual tag survives the delete");
    }

    #[tokio::test]
    async fn delete_unknown_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LodeStore::open_in_memory().await.unwrap();
        let repo = store.ensure_repo("demo", "/tmp").await.unwrap();

        let result = reindex_file(
            &store,
            &IndexerConfig::default(),
            &repo.id,
            dir.path(),
            &dir.path().join("missing.py"),
            ReindexOp::Delete,
        )
        .await
        .unwrap();
        assert_eq!(result, ReindexResult::NotFound);
    }

    #[tokio::test]
    async fn path_outside_root_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let store = LodeStore::open_in_memory().await.unwrap();
        let repo = store.ensure_repo("demo", "/tmp").await.unwrap();

        let result = reindex_file(
            &store,
            &IndexerConfig::default(),
            &repo.id,
            dir.path(),
            Path::new("/elsewhere/file.py"),
            ReindexOp::Delete,
        )
        .await;
        assert!(matches!(result, Err(IndexError::InvalidPath(_))));
    }
}
