//! # lode-kb
//!
//! Documentation knowledge-base extraction for Lode.
//!
//! Turns documentation files (Markdown, HTML, PDF, plain text) into a uniform
//! [`types::ExtractedDocument`] of heading-aware sections, then chunks them
//! into overlapping, section-path-preserving pieces sized for embedding.

pub mod chunker;
pub mod error;
pub mod extractors;
pub mod types;

pub use chunker::{ChunkingConfig, DocChunk, chunk_extracted};
pub use error::KbError;
pub use extractors::extract_document;
pub use types::{ExtractedDocument, ExtractedSection};
