//! Content hashing for change detection and deduplication.
//!
//! Every hashed entity (file, symbol byte range, chunk, SQL statement,
//! document) uses the same scheme: SHA-256 truncated to the first 16 hex
//! characters. Equal hash ⇒ unchanged content ⇒ no re-index.

use sha2::{Digest, Sha256};

/// Hash arbitrary bytes to the canonical 16-hex-char content hash.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)[..16].to_string()
}

/// Hash a string slice. Convenience wrapper over [`content_hash`].
#[must_use]
pub fn content_hash_str(text: &str) -> String {
    content_hash(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hash_is_16_hex_chars() {
        let h = content_hash(b"fn main() {}");
        assert_eq!(h.len(), 16);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(content_hash(b"same input"), content_hash(b"same input"));
        assert_ne!(content_hash(b"input a"), content_hash(b"input b"));
    }

    #[test]
    fn empty_input_hashes() {
        // sha256("") prefix, stable across releases
        assert_eq!(content_hash(b""), "e3b0c44298fc1c14");
    }
}
