//! # lode-validity
//!
//! Documentation validity for Lode:
//! - Reference extraction from markdown/RST/asciidoc documents and validation
//!   against the indexed repository (exact, then trigram-fuzzy)
//! - LLM-driven extraction of behavioral claims
//! - Claim verification: multi-query retrieval, enforcement-aware reranking,
//!   evidence packing, and an LLM verdict with value normalization
//! - The combined 0–100 validity score per document

pub mod claim_extractor;
pub mod claim_verifier;
pub mod error;
pub mod reference_extractor;
pub mod scorer;
pub mod validator;

pub use claim_extractor::{ExtractionResult, extract_and_store_claims};
pub use claim_verifier::{RerankWeights, verify_and_store_claim};
pub use error::ValidityError;
pub use scorer::validate_document;
