//! Content hashing used by the zero-trust cache-validation rule.

use md5::{Digest, Md5};

/// MD5 of `source`, formatted as 32 lowercase hex characters.
pub fn content_hash(source: &str) -> String {
    let digest = Md5::digest(source.as_bytes());
    format!("{digest:x}")
}

pub fn is_valid_hash(hash: &str) -> bool {
    hash.len() == 32 && hash.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_32_hex_chars() {
        let h = content_hash("def add(a, b): return a + b");
        assert_eq!(h.len(), 32);
        assert!(is_valid_hash(&h));
    }

    #[test]
    fn different_content_hashes_differ() {
        assert_ne!(content_hash("a"), content_hash("b"));
    }

    #[test]
    fn same_content_hashes_match() {
        assert_eq!(content_hash("same"), content_hash("same"));
    }
}
