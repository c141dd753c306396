//! # Hashing Utilities
//!
//! SHA-256 is the only digest in the registry. Block hashes travel as
//! lowercase hex strings because that is what clients paste into URLs and
//! compare by eye; the raw-array helpers exist for code that needs bytes.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use star_registry::crypto::sha256;
///
/// let hash = sha256(b"star registry");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash multiple byte slices together without concatenation overhead.
///
/// Feeding parts sequentially gives the same digest as hashing their
/// concatenation, minus the temporary buffer.
pub fn sha256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// SHA-256 rendered as a 64-character lowercase hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}
