//! # Key Management
//!
//! Ed25519 keypairs and the addresses derived from them.
//!
//! An address is the base58 encoding of a 32-byte Ed25519 public key. That
//! makes the mapping "address → public key" a pure decode: the registry never
//! needs a key directory to check who signed a challenge.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (thanks, ed25519-dalek).
//! - Key generation uses `OsRng`.
//! - Secret key bytes are never logged or printed by `Debug`.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{SIGNATURE_LENGTH, VERIFYING_KEY_LENGTH};

/// Errors that can occur during key and address handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not hex")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),
}

/// An Ed25519 keypair that owns a registry address.
///
/// Does NOT implement `Serialize`: exporting a private key should be a
/// deliberate call to [`secret_key_hex`](Self::secret_key_hex).
pub struct StarKeypair {
    signing_key: SigningKey,
}

/// The public half of a keypair. Its base58 form is the owner's address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StarPublicKey {
    bytes: [u8; VERIFYING_KEY_LENGTH],
}

/// A detached Ed25519 signature. Travels as 128 hex characters.
#[derive(Clone, PartialEq, Eq)]
pub struct StarSignature {
    bytes: [u8; SIGNATURE_LENGTH],
}

// ---------------------------------------------------------------------------
// StarKeypair
// ---------------------------------------------------------------------------

impl StarKeypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Constructs a keypair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from a hex-encoded secret key, as written by
    /// `star-node keygen`. Surrounding whitespace is ignored.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// Exports the secret key as hex. Handle with care.
    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Returns the public key associated with this keypair.
    pub fn public_key(&self) -> StarPublicKey {
        StarPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// The registry address owned by this keypair.
    pub fn address(&self) -> String {
        self.public_key().to_address()
    }

    /// Sign a message. Ed25519 is deterministic: same key and message,
    /// same signature.
    pub fn sign(&self, message: &[u8]) -> StarSignature {
        StarSignature {
            bytes: self.signing_key.sign(message).to_bytes(),
        }
    }
}

impl Clone for StarKeypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for StarKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret key material in debug output.
        write!(f, "StarKeypair(address={})", self.address())
    }
}

// ---------------------------------------------------------------------------
// StarPublicKey
// ---------------------------------------------------------------------------

impl StarPublicKey {
    /// Decode an address back into the public key it names.
    ///
    /// Rejects non-base58 input, wrong lengths and bytes that are not a
    /// valid Ed25519 point.
    pub fn from_address(address: &str) -> Result<Self, KeyError> {
        let decoded = bs58::decode(address)
            .into_vec()
            .map_err(|e| KeyError::InvalidAddress(e.to_string()))?;
        let bytes: [u8; VERIFYING_KEY_LENGTH] =
            decoded.as_slice().try_into().map_err(|_| {
                KeyError::InvalidAddress(format!(
                    "expected {} bytes, got {}",
                    VERIFYING_KEY_LENGTH,
                    decoded.len()
                ))
            })?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// Base58 address form of this key.
    pub fn to_address(&self) -> String {
        bs58::encode(self.bytes).into_string()
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; VERIFYING_KEY_LENGTH] {
        &self.bytes
    }

    /// Verify a signature against this public key.
    pub fn verify(&self, message: &[u8], signature: &StarSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let dalek_sig = DalekSignature::from_bytes(&signature.bytes);
        verifying_key.verify_strict(message, &dalek_sig).is_ok()
    }
}

impl fmt::Display for StarPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_address())
    }
}

impl fmt::Debug for StarPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StarPublicKey({})", self.to_address())
    }
}

// ---------------------------------------------------------------------------
// StarSignature
// ---------------------------------------------------------------------------

impl StarSignature {
    /// Returns the raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.bytes
    }

    /// Hex-encoded signature. 128 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse a hex-encoded signature.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s.trim()).map_err(|e| KeyError::InvalidSignature(e.to_string()))?;
        let bytes: [u8; SIGNATURE_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
            KeyError::InvalidSignature(format!(
                "expected {} bytes, got {}",
                SIGNATURE_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }
}

impl fmt::Display for StarSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for StarSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        write!(f, "StarSignature({}...{})", &hex_str[..8], &hex_str[120..])
    }
}
