//! Registry error type.

use thiserror::Error;

use crate::crypto::SignatureError;
use crate::storage::{ChainError, CodecError, DbError, Violation};

/// Everything a registry operation can reject with.
///
/// None of these are fatal: the ledger stays usable after any of them.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The signed challenge is at least one window old.
    #[error("challenge expired: issued {age_secs}s ago (window: {window_secs}s)")]
    ChallengeExpired { age_secs: u64, window_secs: u64 },

    /// The signature is well formed but does not verify under the address.
    #[error("invalid signature for address {address}")]
    InvalidSignature { address: String },

    /// The address or signature could not be decoded at all.
    #[error("malformed signature input: {reason}")]
    MalformedSignature { reason: String },

    /// The message is not a challenge this registry could have issued.
    #[error("malformed challenge: {reason}")]
    MalformedChallenge { reason: String },

    /// The append broke ledger integrity and was rolled back.
    #[error("chain integrity violation: {} violation(s)", .0.len())]
    ChainIntegrityViolation(Vec<Violation>),

    /// No block matches the requested hash or height.
    #[error("block not found: {0}")]
    NotFound(String),

    /// The owner has no stars on the ledger.
    #[error("no stars registered to {0}")]
    NoResults(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("storage error: {0}")]
    Storage(#[from] DbError),
}

impl RegistryError {
    /// Short machine-readable label, used for metrics and API bodies.
    pub fn reason(&self) -> &'static str {
        match self {
            RegistryError::ChallengeExpired { .. } => "challenge_expired",
            RegistryError::InvalidSignature { .. } => "invalid_signature",
            RegistryError::MalformedSignature { .. } => "malformed_signature",
            RegistryError::MalformedChallenge { .. } => "malformed_challenge",
            RegistryError::ChainIntegrityViolation(_) => "chain_integrity_violation",
            RegistryError::NotFound(_) => "not_found",
            RegistryError::NoResults(_) => "no_results",
            RegistryError::Codec(_) => "codec",
            RegistryError::Storage(_) => "storage",
        }
    }
}

impl From<ChainError> for RegistryError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::IntegrityViolation(v) => RegistryError::ChainIntegrityViolation(v),
            ChainError::Storage(e) => RegistryError::Storage(e),
        }
    }
}

impl From<SignatureError> for RegistryError {
    fn from(err: SignatureError) -> Self {
        RegistryError::MalformedSignature {
            reason: err.to_string(),
        }
    }
}
