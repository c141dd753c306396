//! # Registry Module
//!
//! The public face of the star registry. [`StarRegistry`] ties the ledger
//! to the ownership protocol and the read-side index, and is what callers
//! share (behind an `Arc`) across tasks.
//!
//! ## Architecture
//!
//! ```text
//! challenge.rs — challenge string format and parsing
//! ownership.rs — OwnershipVerifier: freshness + signature, then append
//! query.rs     — QueryIndex: by hash, by height, by owner
//! error.rs     — RegistryError
//! ```
//!
//! ## Typical flow
//!
//! ```text
//! client                         registry
//!   │── request_challenge(addr) ──→│
//!   │←── "addr:ts:starRegistry" ───│
//!   │  sign(message)               │
//!   │── submit_star(addr, msg, ───→│  parse → fresh? → verify → append
//!   │      sig, star)              │
//!   │←────────── Block ────────────│
//! ```

pub mod challenge;
pub mod error;
pub mod ownership;
pub mod query;

use std::sync::Arc;

use crate::config::RegistryConfig;
use crate::crypto::{Ed25519Verifier, SignatureVerifier};
use crate::storage::{
    Block, BlockDraft, ChainStore, HexJsonCodec, LedgerDb, PayloadCodec, Star, ValidationReport,
};

pub use challenge::{format_challenge, parse_challenge, Challenge};
pub use error::RegistryError;
pub use ownership::OwnershipVerifier;
pub use query::{OwnedStar, QueryIndex};

/// The star registry service.
pub struct StarRegistry {
    chain: Arc<ChainStore>,
    ownership: OwnershipVerifier,
    index: QueryIndex,
}

impl StarRegistry {
    /// Registry over `chain` with explicit collaborators.
    pub fn new(
        chain: ChainStore,
        verifier: Arc<dyn SignatureVerifier>,
        codec: Arc<dyn PayloadCodec>,
        config: RegistryConfig,
    ) -> Self {
        let chain = Arc::new(chain);
        Self {
            ownership: OwnershipVerifier::new(
                Arc::clone(&chain),
                verifier,
                Arc::clone(&codec),
                config,
            ),
            index: QueryIndex::new(Arc::clone(&chain), codec),
            chain,
        }
    }

    /// In-memory registry with the default Ed25519 verifier and hex JSON
    /// codec.
    pub fn in_memory(config: RegistryConfig) -> Result<Self, RegistryError> {
        let chain = ChainStore::in_memory()?;
        Ok(Self::with_defaults(chain, config))
    }

    /// Durable registry backed by `db`, with the default collaborators.
    pub fn open(db: LedgerDb, config: RegistryConfig) -> Result<Self, RegistryError> {
        let chain = ChainStore::open(db, BlockDraft::genesis())?;
        Ok(Self::with_defaults(chain, config))
    }

    fn with_defaults(chain: ChainStore, config: RegistryConfig) -> Self {
        Self::new(chain, Arc::new(Ed25519Verifier), Arc::new(HexJsonCodec), config)
    }

    /// Height of the tip; 0 when only genesis exists.
    pub fn chain_height(&self) -> u64 {
        self.chain.height()
    }

    /// Challenge string for `address` to sign.
    pub fn request_challenge(&self, address: &str) -> String {
        self.ownership.challenge(address)
    }

    /// Register `star` to `address` given a signed challenge.
    pub async fn submit_star(
        &self,
        address: &str,
        message: &str,
        signature: &str,
        star: Star,
    ) -> Result<Block, RegistryError> {
        self.ownership.submit(address, message, signature, star).await
    }

    pub fn block_by_hash(&self, hash: &str) -> Result<Block, RegistryError> {
        self.index.find_by_hash(hash)
    }

    pub fn block_by_height(&self, height: u64) -> Result<Block, RegistryError> {
        self.index.find_by_height(height)
    }

    /// Every star registered to `address`, oldest first.
    pub async fn stars_by_owner(&self, address: &str) -> Result<Vec<OwnedStar>, RegistryError> {
        self.index.stars_by_owner(address).await
    }

    /// Full-ledger integrity check.
    pub fn validate_chain(&self) -> ValidationReport {
        self.chain.validate()
    }

    /// The underlying ledger.
    pub fn chain(&self) -> &ChainStore {
        &self.chain
    }
}
