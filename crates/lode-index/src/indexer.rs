//! The per-file transactional indexer.
//!
//! For each file, one of three outcomes: `Indexed`, `Skipped` (content hash
//! unchanged), or `TooLarge`. All writes for a single file happen in one
//! transaction; a failure in parsing, extraction, or writing leaves storage
//! unchanged for that file, and the repository walk continues.

use std::path::Path;

use chrono::{DateTime, Utc};

use lode_config::IndexerConfig;
use lode_core::enums::{IndexOutcome, Language};
use lode_core::hashing::content_hash;
use lode_db::LodeStore;
use lode_db::repos::indexing::{FileIndexData, NewChunk, NewEdge, NewSymbol};
use lode_db::repos::sql_meta::{NewSqlRoutine, NewSqlTable};
use lode_parser::language::is_template_file;
use lode_parser::template::{LineMap, combine_script_blocks, extract_script_blocks, remap_line};
use lode_parser::types::{CodeChunk, ParsedEdge, ParsedSymbol};
use lode_parser::{chunker, extractors, parser, sql_chunker, sql_schema};

use crate::doc_ingester;
use crate::error::IndexError;
use crate::tagging;

/// Counts from a repository walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub files_scanned: usize,
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub files_too_large: usize,
    pub files_failed: usize,
    pub symbols: i64,
    pub chunks: i64,
    pub edges: i64,
    pub documents: usize,
    pub documents_skipped: usize,
}

/// Repository indexer, parameterized by size and chunking limits.
pub struct Indexer {
    config: IndexerConfig,
}

impl Indexer {
    #[must_use]
    pub const fn new(config: IndexerConfig) -> Self {
        Self { config }
    }

    /// Index a whole repository: walk code files, ingest documentation,
    /// apply tag rules, refresh the aggregate index state.
    ///
    /// Per-file failures are logged and counted; only storage failures at the
    /// call boundary abort the walk.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Database`] if repository bookkeeping fails.
    pub async fn index_repository(
        &self,
        store: &LodeStore,
        repo_name: &str,
        repo_root: &Path,
    ) -> Result<IndexStats, IndexError> {
        let repo = store
            .ensure_repo(repo_name, &repo_root.to_string_lossy())
            .await?;
        let mut stats = IndexStats::default();

        for (path, language) in crate::scanner::scan_repo(repo_root) {
            stats.files_scanned += 1;
            match self
                .index_file(store, &repo.id, repo_root, &path, language)
                .await
            {
                Ok(IndexOutcome::Indexed) => stats.files_indexed += 1,
                Ok(IndexOutcome::Skipped) => stats.files_skipped += 1,
                Ok(IndexOutcome::TooLarge) => stats.files_too_large += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to index file");
                    stats.files_failed += 1;
                }
            }
        }

        let doc_stats = doc_ingester::ingest_documents(store, &repo.id, repo_root).await?;
        stats.documents = doc_stats.ingested;
        stats.documents_skipped = doc_stats.skipped;

        let state = store.refresh_index_state(&repo.id).await?;
        stats.symbols = state.symbol_count;
        stats.chunks = state.chunk_count;
        stats.edges = store.count_edges(&repo.id).await?;

        tracing::info!(
            repo = repo_name,
            indexed = stats.files_indexed,
            skipped = stats.files_skipped,
            failed = stats.files_failed,
            symbols = stats.symbols,
            "repository walk finished"
        );
        Ok(stats)
    }

    /// Index a single file. See the module docs for the outcome contract.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] on read or storage failure; the per-file
    /// transaction guarantees storage is unchanged in that case.
    pub async fn index_file(
        &self,
        store: &LodeStore,
        repo_id: &str,
        repo_root: &Path,
        abs_path: &Path,
        language: Language,
    ) -> Result<IndexOutcome, IndexError> {
        let rel_path = abs_path
            .strip_prefix(repo_root)
            .map_err(|_| IndexError::InvalidPath(abs_path.to_string_lossy().into_owned()))?
            .to_string_lossy()
            .into_owned();

        let metadata = std::fs::metadata(abs_path)?;
        if metadata.len() > self.config.max_file_size_mb * 1024 * 1024 {
            tracing::debug!(path = %rel_path, size = metadata.len(), "file too large");
            return Ok(IndexOutcome::TooLarge);
        }

        let bytes = std::fs::read(abs_path)?;
        let hash = content_hash(&bytes);
        if store.file_hash(repo_id, &rel_path).await?.as_deref() == Some(hash.as_str()) {
            return Ok(IndexOutcome::Skipped);
        }

        let mtime: DateTime<Utc> = metadata.modified().map_or_else(|_| Utc::now(), Into::into);
        let source = String::from_utf8_lossy(&bytes).into_owned();

        let extraction = self.extract(&rel_path, &source, &bytes, language);

        let data = FileIndexData {
            path: rel_path.clone(),
            language,
            content_hash: hash,
            mtime,
            symbols: extraction.symbols.into_iter().map(to_new_symbol).collect(),
            chunks: extraction.chunks.into_iter().map(to_new_chunk).collect(),
            edges: extraction.edges.into_iter().map(to_new_edge).collect(),
        };
        store.apply_file_index(repo_id, &data).await?;

        let file = store
            .get_file_by_path(repo_id, &rel_path)
            .await?
            .ok_or(lode_db::DatabaseError::NoResult)?;

        if language == Language::Sql {
            let (tables, routines) = sql_schema::parse_sql_schema(&source);
            store
                .replace_sql_metadata(
                    repo_id,
                    &file.id,
                    &tables.into_iter().map(to_sql_table).collect::<Vec<_>>(),
                    &routines.into_iter().map(to_sql_routine).collect::<Vec<_>>(),
                )
                .await?;
        }

        tagging::apply_file_rules(store, repo_id, &file.id, &rel_path, language).await?;

        Ok(IndexOutcome::Indexed)
    }

    /// Parse and extract symbols, edges, and chunks for one file.
    fn extract(&self, rel_path: &str, source: &str, bytes: &[u8], language: Language) -> Extraction {
        // Template files: pull out embedded scripts, parse the combined
        // source, then remap every line number back to the original file.
        if is_template_file(rel_path) {
            return Self::extract_template(rel_path, source);
        }

        if let Some(lang) = parser::support_lang(language, rel_path) {
            let tree = parser::parse_source(source, lang);
            let symbols = extractors::extract_symbols(&tree, source, language);
            let edges = extractors::extract_edges(&tree, source, language);
            let chunks = chunker::create_chunks(source, &symbols);
            return Extraction {
                symbols,
                edges,
                chunks,
            };
        }

        // No parser: SQL-aware or plain-text chunking, no symbols or edges
        let chunks = if language == Language::Sql {
            sql_chunker::chunk_sql_file(
                source,
                self.config.sql_max_chunk_chars as usize,
                self.config.sql_max_statements_per_chunk as usize,
            )
        } else if source.contains('\u{FFFD}') && !bytes.is_empty() {
            vec![chunker::binary_placeholder_chunk(bytes.len())]
        } else {
            chunker::plain_text_chunks(source, self.config.plain_chunk_lines as usize)
        };

        Extraction {
            symbols: Vec::new(),
            edges: Vec::new(),
            chunks,
        }
    }

    fn extract_template(rel_path: &str, source: &str) -> Extraction {
        let extension = Path::new(rel_path)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        let blocks = extract_script_blocks(source, &extension);
        if blocks.is_empty() {
            // No embedded scripts: file record only, no symbols or chunks
            return Extraction::default();
        }

        // One TypeScript block flips the whole combined source to TypeScript
        let block_language = if blocks.iter().any(|b| b.language == Language::Typescript) {
            Language::Typescript
        } else {
            Language::Javascript
        };
        let (combined, line_map) = combine_script_blocks(&blocks);

        let Some(lang) = parser::support_lang(block_language, "combined.ts") else {
            return Extraction::default();
        };
        let tree = parser::parse_source(&combined, lang);
        let mut symbols = extractors::extract_symbols(&tree, &combined, block_language);
        let mut edges = extractors::extract_edges(&tree, &combined, block_language);
        let mut chunks = chunker::create_chunks(&combined, &symbols);

        remap_lines(&line_map, &mut symbols, &mut edges, &mut chunks);
        Extraction {
            symbols,
            edges,
            chunks,
        }
    }
}

#[derive(Default)]
struct Extraction {
    symbols: Vec<ParsedSymbol>,
    edges: Vec<ParsedEdge>,
    chunks: Vec<CodeChunk>,
}

fn remap_lines(
    line_map: &LineMap,
    symbols: &mut [ParsedSymbol],
    edges: &mut [ParsedEdge],
    chunks: &mut [CodeChunk],
) {
    for symbol in symbols {
        symbol.start_line = remap_line(line_map, symbol.start_line);
        symbol.end_line = remap_line(line_map, symbol.end_line);
    }
    for edge in edges {
        edge.start_line = remap_line(line_map, edge.start_line);
        edge.end_line = remap_line(line_map, edge.end_line);
    }
    for chunk in chunks {
        chunk.start_line = remap_line(line_map, chunk.start_line);
        chunk.end_line = remap_line(line_map, chunk.end_line);
    }
}

fn to_new_symbol(symbol: ParsedSymbol) -> NewSymbol {
    NewSymbol {
        fqn: symbol.fqn,
        name: symbol.name,
        kind: symbol.kind,
        signature: symbol.signature,
        start_line: symbol.start_line,
        end_line: symbol.end_line,
        start_byte: symbol.start_byte,
        end_byte: symbol.end_byte,
        docstring: symbol.docstring,
        content_hash: symbol.content_hash,
    }
}

fn to_new_chunk(chunk: CodeChunk) -> NewChunk {
    NewChunk {
        symbol_fqn: chunk.symbol_fqn,
        start_line: chunk.start_line,
        end_line: chunk.end_line,
        content: chunk.content,
        content_hash: chunk.content_hash,
    }
}

fn to_new_edge(edge: ParsedEdge) -> NewEdge {
    NewEdge {
        kind: edge.kind,
        src: edge.src,
        dst: edge.dst,
        confidence: edge.confidence,
        evidence_start_line: edge.start_line,
        evidence_end_line: edge.end_line,
    }
}

fn to_sql_table(table: sql_schema::ParsedTable) -> NewSqlTable {
    NewSqlTable {
        schema_name: table.schema_name.clone(),
        table_name: table.table_name.clone(),
        qualified_name: table.qualified_name.clone(),
        columns: serde_json::to_value(&table.columns).unwrap_or_default(),
        constraints: serde_json::to_value(&table.constraints).unwrap_or_default(),
        start_line: table.start_line,
        end_line: table.end_line,
        content_hash: table.content_hash,
    }
}

fn to_sql_routine(routine: sql_schema::ParsedRoutine) -> NewSqlRoutine {
    NewSqlRoutine {
        schema_name: routine.schema_name.clone(),
        routine_name: routine.routine_name.clone(),
        qualified_name: routine.qualified_name.clone(),
        routine_type: routine.routine_type.clone(),
        parameters: serde_json::to_value(&routine.parameters).unwrap_or_default(),
        return_type: routine.return_type.clone(),
        language: routine.language.clone(),
        volatility: routine.volatility.clone(),
        trigger_table: routine.trigger_table.clone(),
        trigger_events: serde_json::to_value(&routine.trigger_events).unwrap_or_default(),
        trigger_timing: routine.trigger_timing.clone(),
        start_line: routine.start_line,
        end_line: routine.end_line,
        content_hash: routine.content_hash,
    }
}
