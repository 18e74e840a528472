//! Entity structs for all Lode domain objects.
//!
//! Each entity maps to a table in the per-repository libSQL namespace.
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON
//! roundtrip and tool payloads.

mod chunk;
mod claim;
mod document;
mod edge;
mod file;
mod index_state;
mod repo;
mod sql_meta;
mod symbol;
mod tag;
mod validity;

pub use chunk::Chunk;
pub use claim::{BehavioralClaim, ClaimVerification, DocDriftIssue, EvidenceRef};
pub use document::Document;
pub use edge::{Edge, EdgeEvidence};
pub use file::FileRecord;
pub use index_state::RepoIndexState;
pub use repo::Repository;
pub use sql_meta::{SqlRoutineMetadata, SqlTableMetadata};
pub use symbol::{Span, Symbol};
pub use tag::{EntityTag, Tag};
pub use validity::{DocValidityScore, ValidityIssue};
