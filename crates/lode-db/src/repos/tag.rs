//! Tags and entity tag assignments.

use std::collections::HashMap;

use lode_core::entities::Tag;
use lode_core::enums::{EntityKind, TagSource};
use lode_core::ids::{PREFIX_ENTITY_TAG, PREFIX_TAG, generate_id};

use crate::error::DatabaseError;
use crate::store::LodeStore;

impl LodeStore {
    /// Get or create a tag by name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the lookup or insert fails.
    pub async fn ensure_tag(&self, repo_id: &str, name: &str) -> Result<Tag, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT id, repo_id, name, description FROM tag WHERE repo_id = ?1 AND name = ?2",
                [repo_id, name],
            )
            .await?;
        if let Some(row) = rows.next().await? {
            return Ok(Tag {
                id: row.get::<String>(0)?,
                repo_id: row.get::<String>(1)?,
                name: row.get::<String>(2)?,
                description: row.get::<Option<String>>(3)?,
            });
        }

        let id = generate_id(PREFIX_TAG)?;
        self.db()
            .execute(
                "INSERT INTO tag (id, repo_id, name, description) VALUES (?1, ?2, ?3, NULL)",
                libsql::params![id.as_str(), repo_id, name],
            )
            .await?;
        Ok(Tag {
            id,
            repo_id: repo_id.to_string(),
            name: name.to_string(),
            description: None,
        })
    }

    /// Attach a tag to an entity. Idempotent per `(tag, entity, source)`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the write fails.
    pub async fn tag_entity(
        &self,
        repo_id: &str,
        tag_name: &str,
        entity_kind: EntityKind,
        entity_id: &str,
        source: TagSource,
        confidence: f64,
    ) -> Result<(), DatabaseError> {
        let tag = self.ensure_tag(repo_id, tag_name).await?;
        let id = generate_id(PREFIX_ENTITY_TAG)?;
        self.db()
            .execute(
                "INSERT OR IGNORE INTO entity_tag (id, repo_id, tag_id, entity_kind, entity_id, source, confidence)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    id.as_str(),
                    repo_id,
                    tag.id.as_str(),
                    entity_kind.as_str(),
                    entity_id,
                    source.as_str(),
                    confidence
                ],
            )
            .await?;
        Ok(())
    }

    /// Remove a tag from an entity (all sources).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the delete fails.
    pub async fn untag_entity(
        &self,
        repo_id: &str,
        tag_name: &str,
        entity_kind: EntityKind,
        entity_id: &str,
    ) -> Result<(), DatabaseError> {
        self.db()
            .execute(
                "DELETE FROM entity_tag
                 WHERE repo_id = ?1
                   AND tag_id IN (SELECT id FROM tag WHERE repo_id = ?1 AND name = ?2)
                   AND entity_kind = ?3 AND entity_id = ?4",
                libsql::params![repo_id, tag_name, entity_kind.as_str(), entity_id],
            )
            .await?;
        Ok(())
    }

    /// Tag names (with confidence) attached to one entity.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn tags_for_entity(
        &self,
        entity_kind: EntityKind,
        entity_id: &str,
    ) -> Result<Vec<(String, f64)>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT t.name, et.confidence FROM entity_tag et
                 JOIN tag t ON t.id = et.tag_id
                 WHERE et.entity_kind = ?1 AND et.entity_id = ?2
                 ORDER BY t.name",
                libsql::params![entity_kind.as_str(), entity_id],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push((row.get::<String>(0)?, row.get::<f64>(1)?));
        }
        Ok(out)
    }

    /// Tag names for a batch of chunks: `chunk_id → [tag names]`.
    ///
    /// Includes tags inherited from the chunk's file.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn tags_for_chunks(
        &self,
        chunk_ids: &[String],
    ) -> Result<HashMap<String, Vec<String>>, DatabaseError> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for chunk_id in chunk_ids {
            let mut rows = self
                .db()
                .query(
                    "SELECT DISTINCT t.name FROM entity_tag et
                     JOIN tag t ON t.id = et.tag_id
                     WHERE (et.entity_kind = 'chunk' AND et.entity_id = ?1)
                        OR (et.entity_kind = 'file' AND et.entity_id =
                            (SELECT file_id FROM chunk WHERE id = ?1))
                     ORDER BY t.name",
                    [chunk_id.as_str()],
                )
                .await?;
            let mut names = Vec::new();
            while let Some(row) = rows.next().await? {
                names.push(row.get::<String>(0)?);
            }
            if !names.is_empty() {
                map.insert(chunk_id.clone(), names);
            }
        }
        Ok(map)
    }

    /// All tags of a repository with their assignment counts.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_tags(&self, repo_id: &str) -> Result<Vec<(Tag, i64)>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT t.id, t.repo_id, t.name, t.description, COUNT(et.id)
                 FROM tag t
                 LEFT JOIN entity_tag et ON et.tag_id = t.id
                 WHERE t.repo_id = ?1
                 GROUP BY t.id
                 ORDER BY t.name",
                [repo_id],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push((
                Tag {
                    id: row.get::<String>(0)?,
                    repo_id: row.get::<String>(1)?,
                    name: row.get::<String>(2)?,
                    description: row.get::<Option<String>>(3)?,
                },
                row.get::<i64>(4)?,
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{empty_file_data, sample_chunk, test_store};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn tag_entity_is_idempotent() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        store
            .tag_entity(&repo.id, "auth", EntityKind::File, "fil-x", TagSource::Manual, 1.0)
            .await
            .unwrap();
        store
            .tag_entity(&repo.id, "auth", EntityKind::File, "fil-x", TagSource::Manual, 1.0)
            .await
            .unwrap();

        let tags = store.tags_for_entity(EntityKind::File, "fil-x").await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].0, "auth");
    }

    #[tokio::test]
    async fn chunks_inherit_file_tags() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        let mut data = empty_file_data("svc/auth.py", "h1");
        data.chunks = vec![sample_chunk("def login(): ...", None)];
        store.apply_file_index(&repo.id, &data).await.unwrap();

        let file = store
            .get_file_by_path(&repo.id, "svc/auth.py")
            .await
            .unwrap()
            .unwrap();
        let chunks = store.chunks_for_file(&file.id).await.unwrap();

        store
            .tag_entity(&repo.id, "service", EntityKind::File, &file.id, TagSource::Rule, 1.0)
            .await
            .unwrap();

        let map = store
            .tags_for_chunks(&[chunks[0].id.clone()])
            .await
            .unwrap();
        assert_eq!(map[&chunks[0].id], vec!["service".to_string()]);
    }

    #[tokio::test]
    async fn list_tags_counts_assignments() {
        let store = test_store().await;
        let repo = store.ensure_repo("demo", "/tmp/demo").await.unwrap();

        store
            .tag_entity(&repo.id, "auth", EntityKind::File, "fil-1", TagSource::Rule, 1.0)
            .await
            .unwrap();
        store
            .tag_entity(&repo.id, "auth", EntityKind::File, "fil-2", TagSource::Rule, 1.0)
            .await
            .unwrap();
        store.ensure_tag(&repo.id, "empty").await.unwrap();

        let tags = store.list_tags(&repo.id).await.unwrap();
        assert_eq!(tags.len(), 2);
        let auth = tags.iter().find(|(t, _)| t.name == "auth").unwrap();
        assert_eq!(auth.1, 2);
        let empty = tags.iter().find(|(t, _)| t.name == "empty").unwrap();
        assert_eq!(empty.1, 0);
    }
}
