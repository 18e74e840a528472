//! Entity ID prefixes and generation.
//!
//! All entity ids are opaque 128-bit values rendered as `"<prefix>-<32 hex>"`,
//! e.g. `sym-3f2a9c…`. The prefix makes ids self-describing in logs and
//! foreign-key columns without a join.

use crate::errors::CoreError;

pub const PREFIX_REPO: &str = "rep";
pub const PREFIX_FILE: &str = "fil";
pub const PREFIX_SYMBOL: &str = "sym";
pub const PREFIX_CHUNK: &str = "chk";
pub const PREFIX_EDGE: &str = "edg";
pub const PREFIX_DOCUMENT: &str = "doc";
pub const PREFIX_TAG: &str = "tag";
pub const PREFIX_ENTITY_TAG: &str = "etg";
pub const PREFIX_CLAIM: &str = "clm";
pub const PREFIX_VERIFICATION: &str = "ver";
pub const PREFIX_DRIFT_ISSUE: &str = "drf";
pub const PREFIX_VALIDITY_SCORE: &str = "vsc";
pub const PREFIX_VALIDITY_ISSUE: &str = "vis";
pub const PREFIX_SUMMARY: &str = "sum";
pub const PREFIX_SQL_TABLE: &str = "sqt";
pub const PREFIX_SQL_ROUTINE: &str = "sqr";
pub const PREFIX_FEATURE: &str = "fea";
pub const PREFIX_JOB: &str = "job";

/// Generate a fresh entity id: `"<prefix>-<32 hex chars>"` (128 random bits).
///
/// # Errors
///
/// Returns `CoreError::Other` if the OS entropy source fails.
pub fn generate_id(prefix: &str) -> Result<String, CoreError> {
    let mut bytes = [0u8; 16];
    getrandom::fill(&mut bytes).map_err(|e| CoreError::Other(anyhow::anyhow!("entropy: {e}")))?;
    Ok(format!("{prefix}-{}", hex::encode(bytes)))
}

/// Extract the prefix of an id, if it has the expected shape.
#[must_use]
pub fn id_prefix(id: &str) -> Option<&str> {
    id.split_once('-').map(|(prefix, _)| prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn generated_id_has_prefix_and_length() {
        let id = generate_id(PREFIX_SYMBOL).unwrap();
        assert!(id.starts_with("sym-"));
        assert_eq!(id.len(), "sym-".len() + 32);
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = generate_id(PREFIX_CHUNK).unwrap();
        let b = generate_id(PREFIX_CHUNK).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn prefix_extraction() {
        assert_eq!(id_prefix("fil-abc123"), Some("fil"));
        assert_eq!(id_prefix("nodash"), None);
    }
}
