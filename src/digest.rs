//! Short content hashes used for file names and user facing keys

use sha2::{Digest, Sha256};

/// Hex SHA-256 of `input`, truncated to `len` characters
pub fn short_hash(input: &str, len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    hash[..len.min(hash.len())].to_string()
}
