//! # lode-index
//!
//! The indexing pipeline for Lode: walk a repository, parse each file,
//! extract symbols/edges/chunks, and apply everything in per-file
//! transactions. Also covers single-file reindexing (delete/upsert),
//! documentation ingestion, and rule-based tagging.

pub mod doc_ingester;
pub mod error;
pub mod indexer;
pub mod reindexer;
pub mod scanner;
pub mod summaries;
pub mod tagging;

pub use error::IndexError;
pub use indexer::{IndexStats, Indexer};
pub use reindexer::reindex_file;
