//! # Cryptographic Primitives
//!
//! Everything security-related in the registry flows through here:
//!
//! - **SHA-256** for block digests. Rendered as lowercase hex.
//! - **Ed25519** for ownership proofs. Addresses are base58 public keys.
//!
//! Everything here is a thin, type-safe wrapper around audited
//! implementations. We don't roll our own.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{sha256, sha256_hex, sha256_multi};
pub use keys::{KeyError, StarKeypair, StarPublicKey, StarSignature};
pub use signatures::{
    sign_message, verify_message, Ed25519Verifier, SignatureError, SignatureVerifier,
};
