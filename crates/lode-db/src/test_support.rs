//! Shared helpers for lode-db tests.

use chrono::Utc;

use lode_core::enums::Language;

use crate::repos::indexing::{FileIndexData, NewChunk, NewSymbol};
use crate::store::LodeStore;

/// Fresh in-memory store with migrations applied.
pub async fn test_store() -> LodeStore {
    LodeStore::open_in_memory().await.unwrap()
}

/// Minimal index payload for one file with no symbols or edges.
pub fn empty_file_data(path: &str, hash: &str) -> FileIndexData {
    FileIndexData {
        path: path.to_string(),
        language: Language::Python,
        content_hash: hash.to_string(),
        mtime: Utc::now(),
        symbols: Vec::new(),
        chunks: Vec::new(),
        edges: Vec::new(),
    }
}

/// Symbol payload with sane span defaults.
pub fn sample_symbol(fqn: &str, name: &str, kind: lode_core::enums::SymbolKind) -> NewSymbol {
    NewSymbol {
        fqn: fqn.to_string(),
        name: name.to_string(),
        kind,
        signature: format!("{name}()"),
        start_line: 1,
        end_line: 5,
        start_byte: 0,
        end_byte: 100,
        docstring: None,
        content_hash: lode_core::hashing::content_hash_str(fqn),
    }
}

/// Chunk payload bound to an optional symbol FQN.
pub fn sample_chunk(content: &str, symbol_fqn: Option<&str>) -> NewChunk {
    NewChunk {
        symbol_fqn: symbol_fqn.map(String::from),
        start_line: 1,
        end_line: 5,
        content: content.to_string(),
        content_hash: lode_core::hashing::content_hash_str(content),
    }
}
