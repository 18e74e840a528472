//! # lode-embeddings
//!
//! Embedding generation for Lode over a configurable HTTP backend.
//!
//! Two wire protocols are supported: a native JSON endpoint (one text per
//! request) and the OpenAI-compatible `/v1/embeddings` endpoint (batched).
//! The sweep pipeline embeds chunks and documents that have no stored
//! embedding yet; a failed batch is left unembedded and picked up by the
//! next sweep.

pub mod client;
pub mod error;
pub mod sweep;

pub use client::EmbeddingClient;
pub use error::EmbeddingError;
pub use sweep::{SweepStats, embed_missing_chunks, embed_missing_documents};
