//! # lode-llm
//!
//! LLM client for Lode with two logical model slots:
//!
//! - **deep** — complex extraction and verification (claim extraction,
//!   claim verdicts, comprehensive reviews)
//! - **small** — summaries, classifications, simple Q&A
//!
//! Both slots speak either the native `/api/generate` protocol or an
//! OpenAI-compatible completions/chat endpoint. Configuration is a passed-in
//! immutable value; there is no process-wide model state, so concurrent
//! pipelines with different models never interfere.

mod client;
pub mod error;
mod parse;

pub use client::{LlmClient, ModelSlot};
pub use error::LlmError;
pub use parse::parse_json_response;
