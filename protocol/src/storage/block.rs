//! # Block Structure
//!
//! A block is one committed record in the registry ledger: a position, a
//! timestamp, a link to its predecessor, an opaque body, and a digest over
//! all of those.
//!
//! ## Block Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  height: u64               (0 = genesis)         │
//! │  timestamp: u64            (unix seconds)        │
//! │  previous_hash: Option<hex> (None only at 0)     │
//! │  hash: hex                 (SHA-256, see below)  │
//! │  body: String              (codec-encoded)       │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Hash Computation
//!
//! The digest covers `height || timestamp || previous_hash || body` in a
//! length-prefixed encoding. The `hash` field itself is NOT included. Both
//! sealing and self-validation go through [`compute_block_hash`], so a new
//! field only has to be added in one place to stay consistent.
//!
//! ## Immutability
//!
//! Fields are private and there are no setters. Blocks come into existence
//! through [`ChainBlock::seal`], which only the chain store calls.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::payload::{CodecError, Payload, PayloadCodec};
use crate::config::GENESIS_PAYLOAD;
use crate::crypto::hash::sha256_multi;

// ---------------------------------------------------------------------------
// ChainBlock
// ---------------------------------------------------------------------------

/// What the ledger needs from a block type.
///
/// The chain store and validator are generic over this trait, so an
/// alternate payload or hash scheme can be plugged in without touching them.
pub trait ChainBlock: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// The unvalidated input to an append: payload only, no position.
    type Draft: Send;

    /// Build a block from a draft and the fields the ledger assigns,
    /// computing its digest.
    fn seal(draft: Self::Draft, height: u64, timestamp: u64, previous_hash: Option<String>)
        -> Self;

    fn height(&self) -> u64;

    fn hash(&self) -> &str;

    fn previous_hash(&self) -> Option<&str>;

    /// Recompute the digest from the block's current fields.
    fn compute_hash(&self) -> String;

    /// Self-validation: does the stored hash match the content?
    fn is_self_consistent(&self) -> bool {
        self.compute_hash() == self.hash()
    }
}

// ---------------------------------------------------------------------------
// BlockDraft
// ---------------------------------------------------------------------------

/// Payload-only input to [`ChainStore::append`](super::chain::ChainStore::append).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockDraft {
    body: String,
}

impl BlockDraft {
    /// Draft around an already-encoded body.
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Encode `payload` with `codec` into a draft.
    pub fn from_payload(codec: &dyn PayloadCodec, payload: &Payload) -> Result<Self, CodecError> {
        Ok(Self::new(codec.encode(payload)?))
    }

    /// The genesis draft: `"Genesis Block"` as a hex-encoded JSON string.
    pub fn genesis() -> Self {
        let json = serde_json::Value::from(GENESIS_PAYLOAD).to_string();
        Self::new(hex::encode(json))
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A committed registry block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    height: u64,
    timestamp: u64,
    previous_hash: Option<String>,
    hash: String,
    body: String,
}

impl Block {
    /// Unix timestamp (seconds) assigned when the block was appended.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The codec-encoded payload.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    /// Decode the body with the given codec.
    pub async fn decode(&self, codec: &dyn PayloadCodec) -> Result<Payload, CodecError> {
        codec.decode(&self.body).await
    }

    /// Self-validation, spelled the way callers outside the ledger expect.
    pub fn validate(&self) -> bool {
        self.is_self_consistent()
    }

    /// Out-of-band mutation, for corruption tests only.
    #[cfg(test)]
    pub(crate) fn tamper(&mut self, body: Option<&str>, hash: Option<&str>) {
        if let Some(body) = body {
            self.body = body.to_string();
        }
        if let Some(hash) = hash {
            self.hash = hash.to_string();
        }
    }
}

impl ChainBlock for Block {
    type Draft = BlockDraft;

    fn seal(draft: BlockDraft, height: u64, timestamp: u64, previous_hash: Option<String>) -> Self {
        let hash = compute_block_hash(height, timestamp, previous_hash.as_deref(), &draft.body);
        Block {
            height,
            timestamp,
            previous_hash,
            hash,
            body: draft.body,
        }
    }

    fn height(&self) -> u64 {
        self.height
    }

    fn hash(&self) -> &str {
        &self.hash
    }

    fn previous_hash(&self) -> Option<&str> {
        self.previous_hash.as_deref()
    }

    fn compute_hash(&self) -> String {
        compute_block_hash(
            self.height,
            self.timestamp,
            self.previous_hash.as_deref(),
            &self.body,
        )
    }
}

// ---------------------------------------------------------------------------
// Hash Computation
// ---------------------------------------------------------------------------

/// SHA-256 over a block's fields, excluding the hash itself. Lowercase hex.
///
/// Variable-length fields are length-prefixed and the optional link carries
/// a presence tag, so no two distinct field tuples share a preimage.
pub fn compute_block_hash(
    height: u64,
    timestamp: u64,
    previous_hash: Option<&str>,
    body: &str,
) -> String {
    let (link_tag, link) = match previous_hash {
        Some(prev) => ([1u8], prev.as_bytes()),
        None => ([0u8], &[][..]),
    };
    let digest = sha256_multi(&[
        &height.to_le_bytes(),
        &timestamp.to_le_bytes(),
        &link_tag,
        &(link.len() as u64).to_le_bytes(),
        link,
        &(body.len() as u64).to_le_bytes(),
        body.as_bytes(),
    ]);
    hex::encode(digest)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
