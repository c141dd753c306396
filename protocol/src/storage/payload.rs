//! # Block Payloads
//!
//! A block's `body` is opaque to the ledger: the chain hashes it, links it
//! and never looks inside. Meaning is assigned by a [`PayloadCodec`].
//!
//! ## Payload shapes
//!
//! ```text
//! genesis : "Genesis Block"
//! star    : { "address": ..., "message": ..., "star": { "dec", "ra", "story", ... } }
//! ```
//!
//! The default [`HexJsonCodec`] stores the JSON document hex-encoded, which
//! keeps bodies ASCII-safe in URLs, logs and the hash preimage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GENESIS_PAYLOAD;

/// Errors from encoding or decoding a block body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("body is not valid hex: {0}")]
    InvalidHex(String),

    #[error("body is not a valid payload document: {0}")]
    InvalidDocument(String),

    #[error("failed to encode payload: {0}")]
    Encode(String),
}

/// Celestial coordinates plus the owner's story about them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Star {
    /// Declination, e.g. `"+68° 52' 56.9"`.
    pub dec: String,
    /// Right ascension, e.g. `"16h 29m 1.0s"`.
    pub ra: String,
    /// Free-form story attached by the owner.
    pub story: String,
    /// Magnitude, when the submitter knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mag: Option<String>,
    /// Constellation, when the submitter knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cen: Option<String>,
}

impl Star {
    /// Star with the three mandatory fields.
    pub fn new(dec: impl Into<String>, ra: impl Into<String>, story: impl Into<String>) -> Self {
        Self {
            dec: dec.into(),
            ra: ra.into(),
            story: story.into(),
            mag: None,
            cen: None,
        }
    }
}

/// What a star block carries: who claimed it, the challenge they signed,
/// and the star itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarClaim {
    pub address: String,
    pub message: String,
    pub star: Star,
}

/// Decoded block body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// A plain text note. The genesis block is the only writer of these.
    Note(String),
    /// An ownership claim on a star.
    Star(StarClaim),
}

impl Payload {
    /// The genesis payload.
    pub fn genesis() -> Self {
        Payload::Note(GENESIS_PAYLOAD.to_string())
    }

    /// Returns the claim if this payload is a star.
    pub fn as_star(&self) -> Option<&StarClaim> {
        match self {
            Payload::Star(claim) => Some(claim),
            Payload::Note(_) => None,
        }
    }
}

/// Turns payloads into opaque block bodies and back.
///
/// Encoding happens before the ledger's critical section and is cheap, so
/// it is synchronous. Decoding runs over the whole chain during owner
/// queries and may be backed by something slow, so it is `async`.
#[async_trait]
pub trait PayloadCodec: Send + Sync {
    fn encode(&self, payload: &Payload) -> Result<String, CodecError>;

    async fn decode(&self, body: &str) -> Result<Payload, CodecError>;
}

/// Hex-encoded JSON bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexJsonCodec;

impl HexJsonCodec {
    /// Synchronous decode, shared by the async trait method and by callers
    /// that already hold the body in hand.
    pub fn decode_body(body: &str) -> Result<Payload, CodecError> {
        let bytes = hex::decode(body).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| CodecError::InvalidDocument(e.to_string()))
    }

    /// Synchronous encode.
    pub fn encode_payload(payload: &Payload) -> Result<String, CodecError> {
        let json = serde_json::to_vec(payload).map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(hex::encode(json))
    }
}

#[async_trait]
impl PayloadCodec for HexJsonCodec {
    fn encode(&self, payload: &Payload) -> Result<String, CodecError> {
        Self::encode_payload(payload)
    }

    async fn decode(&self, body: &str) -> Result<Payload, CodecError> {
        Self::decode_body(body)
    }
}
