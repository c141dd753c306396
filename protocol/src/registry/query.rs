//! Read-side lookups over the committed ledger.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::storage::{Block, ChainBlock, ChainStore, Payload, PayloadCodec, Star};

use super::error::RegistryError;

/// A star together with the address that registered it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedStar {
    pub owner: String,
    pub star: Star,
}

/// Lookups by hash, by height, and by owner.
pub struct QueryIndex {
    chain: Arc<ChainStore>,
    codec: Arc<dyn PayloadCodec>,
}

impl QueryIndex {
    pub fn new(chain: Arc<ChainStore>, codec: Arc<dyn PayloadCodec>) -> Self {
        Self { chain, codec }
    }

    pub fn find_by_hash(&self, hash: &str) -> Result<Block, RegistryError> {
        self.chain
            .read(|blocks| blocks.iter().find(|b| b.hash() == hash).cloned())
            .ok_or_else(|| RegistryError::NotFound(format!("hash {hash}")))
    }

    pub fn find_by_height(&self, height: u64) -> Result<Block, RegistryError> {
        self.chain
            .read(|blocks| blocks.iter().find(|b| b.height() == height).cloned())
            .ok_or_else(|| RegistryError::NotFound(format!("height {height}")))
    }

    /// Every star registered to `address`, in height order.
    ///
    /// Decodes all non-genesis bodies concurrently from a snapshot, so no
    /// lock is held while the codec runs. The owner filter only runs once
    /// the full ordered set is in hand.
    pub async fn stars_by_owner(&self, address: &str) -> Result<Vec<OwnedStar>, RegistryError> {
        let blocks = self.chain.snapshot();
        let codec = self.codec.as_ref();

        let decoded = join_all(
            blocks
                .iter()
                .filter(|b| !b.is_genesis())
                .map(|b| b.decode(codec)),
        )
        .await;

        let mut collected = Vec::with_capacity(decoded.len());
        for payload in decoded {
            if let Payload::Star(claim) = payload? {
                collected.push(OwnedStar {
                    owner: claim.address,
                    star: claim.star,
                });
            }
        }

        let owned: Vec<OwnedStar> = collected
            .into_iter()
            .filter(|s| s.owner == address)
            .collect();

        if owned.is_empty() {
            Err(RegistryError::NoResults(address.to_string()))
        } else {
            Ok(owned)
        }
    }
}
