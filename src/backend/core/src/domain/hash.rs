//! Stable content-digest hashing for task/queue-item identity.
//!
//! The component design calls for a stable content digest over a canonical
//! `"a|b|c"` byte string rather than object identity, so that two tasks
//! describing the same (plugin, input, organisation) triple are recognised
//! as the same item even across process restarts. SHA-256 (already pulled
//! in for other purposes) stands in for the illustrative murmur3.

use sha2::{Digest, Sha256};

/// Hashes the pipe-joined parts into a stable lowercase hex digest.
pub fn stable_hash(parts: &[&str]) -> String {
    let joined = parts.join("|");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_parts_same_hash() {
        assert_eq!(stable_hash(&["a", "b", "c"]), stable_hash(&["a", "b", "c"]));
    }

    #[test]
    fn different_parts_different_hash() {
        assert_ne!(stable_hash(&["a", "b", "c"]), stable_hash(&["a", "b", "d"]));
    }

    #[test]
    fn order_matters() {
        assert_ne!(stable_hash(&["a", "b"]), stable_hash(&["b", "a"]));
    }
}
