//! # Ownership Signatures
//!
//! The registry never holds anyone's private key. Clients sign the challenge
//! string themselves and hand back `(address, message, signature)`; this
//! module answers one question about that triple: does the signature check
//! out under the key the address names?
//!
//! Verification sits behind the [`SignatureVerifier`] trait so the ownership
//! protocol does not care which scheme is on the other side. The default is
//! [`Ed25519Verifier`]; an HSM-backed or remote verifier can be dropped in
//! without touching the registry.
//!
//! ## Two kinds of "no"
//!
//! `Ok(false)` means the inputs were well formed and the signature is wrong.
//! `Err(_)` means the primitive could not even run: the address or the
//! signature did not decode. Callers map these to different errors.

use async_trait::async_trait;
use thiserror::Error;

use super::keys::{KeyError, StarKeypair, StarPublicKey, StarSignature};

/// Errors raised by a verification primitive on malformed input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed address: {0}")]
    MalformedAddress(String),

    #[error("malformed signature: {0}")]
    MalformedSignature(String),
}

impl From<KeyError> for SignatureError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::InvalidSignature(msg) => SignatureError::MalformedSignature(msg),
            other => SignatureError::MalformedAddress(other.to_string()),
        }
    }
}

/// Checks that `signature` is a valid signature of `message` under the
/// public key implied by `address`.
///
/// This is one of the two places where the registry may wait on an external
/// collaborator, hence `async`.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    /// Returns `Ok(true)` for a valid signature, `Ok(false)` for a
    /// well-formed but wrong one, and `Err` when the inputs do not decode.
    async fn verify(
        &self,
        message: &str,
        address: &str,
        signature: &str,
    ) -> Result<bool, SignatureError>;
}

/// Default verifier: base58 Ed25519 addresses, hex-encoded signatures over
/// the UTF-8 bytes of the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

#[async_trait]
impl SignatureVerifier for Ed25519Verifier {
    async fn verify(
        &self,
        message: &str,
        address: &str,
        signature: &str,
    ) -> Result<bool, SignatureError> {
        verify_message(message, address, signature)
    }
}

/// Synchronous core of [`Ed25519Verifier`].
pub fn verify_message(
    message: &str,
    address: &str,
    signature: &str,
) -> Result<bool, SignatureError> {
    let public_key = StarPublicKey::from_address(address)?;
    let signature = StarSignature::from_hex(signature)?;
    Ok(public_key.verify(message.as_bytes(), &signature))
}

/// Sign a message and return the hex signature the registry expects.
///
/// This is the client half of the protocol; the node exposes it as
/// `star-node sign` so nobody has to hand-roll hex encoding.
pub fn sign_message(keypair: &StarKeypair, message: &str) -> String {
    keypair.sign(message.as_bytes()).to_hex()
}
