//! Indexer configuration.

use serde::{Deserialize, Serialize};

const fn default_max_file_size_mb() -> u64 {
    100
}

const fn default_plain_chunk_lines() -> u32 {
    100
}

const fn default_sql_max_chunk_chars() -> u32 {
    5_000
}

const fn default_sql_max_statements_per_chunk() -> u32 {
    50
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexerConfig {
    /// Files above this size are skipped with a `TooLarge` outcome.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Lines per chunk for files without a parser.
    #[serde(default = "default_plain_chunk_lines")]
    pub plain_chunk_lines: u32,

    /// Character cap per SQL chunk.
    #[serde(default = "default_sql_max_chunk_chars")]
    pub sql_max_chunk_chars: u32,

    /// Statement cap per SQL chunk.
    #[serde(default = "default_sql_max_statements_per_chunk")]
    pub sql_max_statements_per_chunk: u32,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            plain_chunk_lines: default_plain_chunk_lines(),
            sql_max_chunk_chars: default_sql_max_chunk_chars(),
            sql_max_statements_per_chunk: default_sql_max_statements_per_chunk(),
        }
    }
}
