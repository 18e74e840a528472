//! Per-file transactional index application.
//!
//! All derived-data changes for one file happen inside a single transaction:
//! upsert the file row, delete old derived rows, insert deduplicated symbols
//! and chunks, then resolve and insert edges. A failure anywhere leaves
//! storage unchanged for that file.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use lode_core::enums::{EdgeKind, Language, SymbolKind, TagSource};
use lode_core::ids::{PREFIX_CHUNK, PREFIX_EDGE, PREFIX_FILE, PREFIX_SYMBOL, generate_id};

use crate::error::DatabaseError;
use crate::store::LodeStore;

/// A symbol ready for insertion, before an id is assigned.
#[derive(Debug, Clone)]
pub struct NewSymbol {
    pub fqn: String,
    pub name: String,
    pub kind: SymbolKind,
    pub signature: String,
    pub start_line: u32,
    pub end_line: u32,
    pub start_byte: u32,
    pub end_byte: u32,
    pub docstring: Option<String>,
    pub content_hash: String,
}

/// A chunk ready for insertion. `symbol_fqn` links symbol chunks to the
/// symbol inserted in the same pass; `None` marks a header chunk.
#[derive(Debug, Clone)]
pub struct NewChunk {
    pub symbol_fqn: Option<String>,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    pub content_hash: String,
}

/// An extracted edge with unresolved endpoints. `src` is `None` for
/// file-level imports; both endpoints are FQNs or simple names that the
/// resolver maps to symbol ids.
#[derive(Debug, Clone)]
pub struct NewEdge {
    pub kind: EdgeKind,
    pub src: Option<String>,
    pub dst: String,
    pub confidence: f64,
    pub evidence_start_line: u32,
    pub evidence_end_line: u32,
}

/// Everything the indexer extracted from one file.
#[derive(Debug, Clone)]
pub struct FileIndexData {
    pub path: String,
    pub language: Language,
    pub content_hash: String,
    pub mtime: DateTime<Utc>,
    pub symbols: Vec<NewSymbol>,
    pub chunks: Vec<NewChunk>,
    pub edges: Vec<NewEdge>,
}

/// Counts from one applied file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub symbols: usize,
    pub chunks: usize,
    pub edges: usize,
    pub edges_dropped: usize,
}

impl LodeStore {
    /// Return the stored content hash for a path, if the file is known.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn file_hash(
        &self,
        repo_id: &str,
        path: &str,
    ) -> Result<Option<String>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT content_hash FROM file WHERE repo_id = ?1 AND path = ?2",
                [repo_id, path],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<String>(0)?)),
            None => Ok(None),
        }
    }

    /// Apply one file's extracted data in a single transaction.
    ///
    /// Deletes stale derived rows (symbols, chunks, evidence edges, and
    /// rebuildable tags), inserts symbols deduplicated by FQN, chunks
    /// deduplicated by `(start_line, end_line, content_hash)`, and edges whose
    /// endpoints resolve. Returns the applied counts.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` and leaves storage unchanged if any statement
    /// fails.
    #[allow(clippy::too_many_lines)]
    pub async fn apply_file_index(
        &self,
        repo_id: &str,
        data: &FileIndexData,
    ) -> Result<ApplyStats, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let tx = self.db().transaction().await?;

        // Upsert file
        let file_id = {
            let mut rows = tx
                .query(
                    "SELECT id FROM file WHERE repo_id = ?1 AND path = ?2",
                    libsql::params![repo_id, data.path.as_str()],
                )
                .await?;
            match rows.next().await? {
                Some(row) => {
                    let id = row.get::<String>(0)?;
                    tx.execute(
                        "UPDATE file SET language = ?1, content_hash = ?2, mtime = ?3, updated_at = ?4
                         WHERE id = ?5",
                        libsql::params![
                            data.language.as_str(),
                            data.content_hash.as_str(),
                            data.mtime.to_rfc3339(),
                            now.as_str(),
                            id.as_str()
                        ],
                    )
                    .await?;
                    id
                }
                None => {
                    let id = generate_id(PREFIX_FILE)?;
                    tx.execute(
                        "INSERT INTO file (id, repo_id, path, language, content_hash, mtime, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        libsql::params![
                            id.as_str(),
                            repo_id,
                            data.path.as_str(),
                            data.language.as_str(),
                            data.content_hash.as_str(),
                            data.mtime.to_rfc3339(),
                            now.as_str()
                        ],
                    )
                    .await?;
                    id
                }
            }
        };

        // Delete derived rows: rebuildable tags first (they reference the
        // soon-to-be-deleted symbol/chunk ids), then symbols, chunks, edges
        // evidenced by this file, and stale summaries.
        tx.execute(
            "DELETE FROM entity_tag
             WHERE repo_id = ?1
               AND source != ?2
               AND (
                   (entity_kind = 'file' AND entity_id = ?3)
                   OR (entity_kind = 'symbol' AND entity_id IN (SELECT id FROM symbol WHERE file_id = ?3))
                   OR (entity_kind = 'chunk' AND entity_id IN (SELECT id FROM chunk WHERE file_id = ?3))
               )",
            libsql::params![repo_id, TagSource::Manual.as_str(), file_id.as_str()],
        )
        .await?;
        tx.execute(
            "DELETE FROM symbol WHERE file_id = ?1",
            [file_id.as_str()],
        )
        .await?;
        tx.execute("DELETE FROM chunk WHERE file_id = ?1", [file_id.as_str()])
            .await?;
        tx.execute(
            "DELETE FROM edge WHERE evidence_file_id = ?1",
            [file_id.as_str()],
        )
        .await?;
        tx.execute(
            "DELETE FROM file_summary WHERE file_id = ?1",
            [file_id.as_str()],
        )
        .await?;

        let mut stats = ApplyStats::default();

        // Insert symbols, deduplicated by FQN (minified files repeat them)
        let mut fqn_to_id: HashMap<String, String> = HashMap::new();
        let mut name_to_id: HashMap<String, String> = HashMap::new();
        for symbol in &data.symbols {
            if fqn_to_id.contains_key(&symbol.fqn) {
                continue;
            }
            let id = generate_id(PREFIX_SYMBOL)?;
            tx.execute(
                "INSERT INTO symbol (id, repo_id, file_id, fqn, name, kind, signature,
                                     start_line, end_line, start_byte, end_byte, docstring, content_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                libsql::params![
                    id.as_str(),
                    repo_id,
                    file_id.as_str(),
                    symbol.fqn.as_str(),
                    symbol.name.as_str(),
                    symbol.kind.as_str(),
                    symbol.signature.as_str(),
                    i64::from(symbol.start_line),
                    i64::from(symbol.end_line),
                    i64::from(symbol.start_byte),
                    i64::from(symbol.end_byte),
                    symbol.docstring.as_deref(),
                    symbol.content_hash.as_str()
                ],
            )
            .await?;
            name_to_id.entry(symbol.name.clone()).or_insert(id.clone());
            fqn_to_id.insert(symbol.fqn.clone(), id);
            stats.symbols += 1;
        }

        // Insert chunks, deduplicated by (start_line, end_line, content_hash)
        let mut seen_chunks = std::collections::HashSet::new();
        for chunk in &data.chunks {
            let key = (chunk.start_line, chunk.end_line, chunk.content_hash.clone());
            if !seen_chunks.insert(key) {
                continue;
            }
            let symbol_id = chunk
                .symbol_fqn
                .as_ref()
                .and_then(|fqn| fqn_to_id.get(fqn).cloned());
            let id = generate_id(PREFIX_CHUNK)?;
            tx.execute(
                "INSERT INTO chunk (id, repo_id, file_id, symbol_id, start_line, end_line, content, content_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                libsql::params![
                    id.as_str(),
                    repo_id,
                    file_id.as_str(),
                    symbol_id.as_deref(),
                    i64::from(chunk.start_line),
                    i64::from(chunk.end_line),
                    chunk.content.as_str(),
                    chunk.content_hash.as_str()
                ],
            )
            .await?;
            stats.chunks += 1;
        }

        // Insert edges, skipping any whose endpoints cannot be resolved
        for edge in &data.edges {
            let src_id = match &edge.src {
                Some(name) => {
                    match resolve_symbol(&tx, repo_id, &fqn_to_id, &name_to_id, name).await? {
                        Some(id) => Some(id),
                        // A named source that does not resolve drops the edge
                        None => {
                            stats.edges_dropped += 1;
                            continue;
                        }
                    }
                }
                None => None,
            };
            // IMPORTS may have a null source, but the destination must resolve
            let Some(dst_id) =
                resolve_symbol(&tx, repo_id, &fqn_to_id, &name_to_id, &edge.dst).await?
            else {
                stats.edges_dropped += 1;
                continue;
            };
            if src_id.is_none() && edge.kind != EdgeKind::Imports {
                stats.edges_dropped += 1;
                continue;
            }

            let id = generate_id(PREFIX_EDGE)?;
            tx.execute(
                "INSERT OR IGNORE INTO edge (id, repo_id, kind, src_symbol_id, dst_symbol_id,
                                             evidence_file_id, evidence_start_line, evidence_end_line, confidence)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                libsql::params![
                    id.as_str(),
                    repo_id,
                    edge.kind.as_str(),
                    src_id.as_deref(),
                    dst_id.as_str(),
                    file_id.as_str(),
                    i64::from(edge.evidence_start_line),
                    i64::from(edge.evidence_end_line),
                    edge.confidence
                ],
            )
            .await?;
            stats.edges += 1;
        }

        tx.commit().await?;
        Ok(stats)
    }
}

/// Resolve a symbol reference to an id.
///
/// Resolution order, each step short-circuiting: local FQN map, local simple
/// name map, repo-wide FQN lookup, repo-wide simple-name lookup (first
/// match). A dotted reference that resolves nowhere falls back to its last
/// segment, so `auth.User` reaches the `User` symbol.
async fn resolve_symbol(
    tx: &libsql::Transaction,
    repo_id: &str,
    fqn_to_id: &HashMap<String, String>,
    name_to_id: &HashMap<String, String>,
    reference: &str,
) -> Result<Option<String>, DatabaseError> {
    if let Some(id) = fqn_to_id.get(reference) {
        return Ok(Some(id.clone()));
    }
    if let Some(id) = name_to_id.get(reference) {
        return Ok(Some(id.clone()));
    }

    let mut rows = tx
        .query(
            "SELECT id FROM symbol WHERE repo_id = ?1 AND fqn = ?2 LIMIT 1",
            libsql::params![repo_id, reference],
        )
        .await?;
    if let Some(row) = rows.next().await? {
        return Ok(Some(row.get::<String>(0)?));
    }

    let mut rows = tx
        .query(
            "SELECT id FROM symbol WHERE repo_id = ?1 AND name = ?2 LIMIT 1",
            libsql::params![repo_id, reference],
        )
        .await?;
    if let Some(row) = rows.next().await? {
        return Ok(Some(row.get::<String>(0)?));
    }

    if let Some((_, last_segment)) = reference.rsplit_once('.') {
        if let Some(id) = name_to_id.get(last_segment) {
            return Ok(Some(id.clone()));
        }
        let mut rows = tx
            .query(
                "SELECT id FROM symbol WHERE repo_id = ?1 AND name = ?2 LIMIT 1",
                libsql::params![repo_id, last_segment],
            )
            .await?;
        if let Some(row) = rows.next().await? {
            return Ok(Some(row.get::<String>(0)?));
        }
    }

    Ok(None)
}
