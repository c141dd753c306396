//! # LedgerDb — Durable Block Storage
//!
//! Optional write-through persistence for the ledger, built on sled's
//! embedded key-value store. The ledger's semantics live in
//! [`ChainStore`](super::chain::ChainStore); this layer only remembers what
//! was committed so a restarted node comes back with the same chain.
//!
//! ## Tree Layout
//!
//! | Tree       | Key                 | Value              |
//! |------------|---------------------|--------------------|
//! | `blocks`   | `height` (8B BE)    | `bincode(Block)`   |
//! | `metadata` | key (UTF-8)         | value (bytes)      |
//!
//! Heights are big-endian so sled's lexicographic order is numeric order and
//! a full scan of `blocks` yields the chain in height order.
//!
//! Both trees are written in one sled transaction, so a block and the
//! latest-height marker land together or not at all.

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, IVec, Transactional, Tree};
use std::path::Path;
use tracing::warn;

use super::block::ChainBlock;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Well-known key in the `metadata` tree for the latest block height.
const META_LATEST_HEIGHT: &[u8] = b"latest_block_height";

// ---------------------------------------------------------------------------
// LedgerDb
// ---------------------------------------------------------------------------

/// Persistent block storage.
///
/// sled is thread-safe, so `LedgerDb` is `Clone` and cheap to share.
#[derive(Debug, Clone)]
pub struct LedgerDb {
    db: Db,
    blocks: Tree,
    metadata: Tree,
}

impl LedgerDb {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database that is removed when dropped.
    pub fn open_temporary() -> DbResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let blocks = db.open_tree("blocks")?;
        let metadata = db.open_tree("metadata")?;
        Ok(Self {
            db,
            blocks,
            metadata,
        })
    }

    /// Persist a committed block and the new latest height, then flush.
    ///
    /// On error nothing from this call remains in the database: a failed
    /// transaction writes nothing, and a failed flush is undone.
    pub fn put_block<B: ChainBlock>(&self, block: &B) -> DbResult<()> {
        let height_key = block.height().to_be_bytes();
        let bytes =
            bincode::serialize(block).map_err(|e| DbError::Serialization(e.to_string()))?;

        let previous = (&self.blocks, &self.metadata)
            .transaction(|(blocks, metadata)| {
                blocks.insert(&height_key[..], bytes.clone())?;
                let previous = metadata.insert(META_LATEST_HEIGHT, &height_key[..])?;
                Ok::<_, ConflictableTransactionError<DbError>>(previous)
            })
            .map_err(from_transaction)?;

        if let Err(e) = self.db.flush() {
            if let Err(undo) = self.undo_put(&height_key, previous) {
                warn!(height = block.height(), error = %undo, "failed to undo unflushed block");
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Remove the block at `height_key` and restore the previous latest
    /// height, in one transaction.
    fn undo_put(&self, height_key: &[u8], previous: Option<IVec>) -> DbResult<()> {
        (&self.blocks, &self.metadata)
            .transaction(|(blocks, metadata)| {
                blocks.remove(height_key)?;
                match &previous {
                    Some(prev) => metadata.insert(META_LATEST_HEIGHT, prev.clone())?,
                    None => metadata.remove(META_LATEST_HEIGHT)?,
                };
                Ok::<_, ConflictableTransactionError<DbError>>(())
            })
            .map_err(from_transaction)?;
        self.db.flush()?;
        Ok(())
    }

    /// Retrieve a block by its height.
    pub fn get_block<B: ChainBlock>(&self, height: u64) -> DbResult<Option<B>> {
        match self.blocks.get(height.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Load every stored block in height order.
    pub fn load_blocks<B: ChainBlock>(&self) -> DbResult<Vec<B>> {
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for entry in self.blocks.iter() {
            let (_key, value) = entry?;
            blocks.push(decode(&value)?);
        }
        Ok(blocks)
    }

    /// Latest persisted block height, `None` on an empty database.
    pub fn latest_height(&self) -> DbResult<Option<u64>> {
        match self.metadata.get(META_LATEST_HEIGHT)? {
            Some(bytes) => Ok(Some(decode_height(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Number of stored blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

fn from_transaction(err: TransactionError<DbError>) -> DbError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => DbError::Sled(e),
    }
}

fn decode<B: ChainBlock>(bytes: &[u8]) -> DbResult<B> {
    bincode::deserialize(bytes).map_err(|e| DbError::Serialization(e.to_string()))
}

fn decode_height(bytes: &[u8]) -> DbResult<u64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| DbError::Serialization("invalid height bytes".to_string()))?;
    Ok(u64::from_be_bytes(arr))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block::{Block, BlockDraft};

    fn make_chain(count: u64) -> Vec<Block> {
        let mut blocks: Vec<Block> = Vec::new();
        for h in 0..count {
            let prev = blocks.last().map(|b| b.hash().to_string());
            let draft = if h == 0 {
                BlockDraft::genesis()
            } else {
                BlockDraft::new(hex::encode(format!("block {h}")))
            };
            blocks.push(Block::seal(draft, h, 1_700_000_000 + h, prev));
        }
        blocks
    }

    #[test]
    fn open_temporary_database() {
        let db = LedgerDb::open_temporary().expect("temp db");
        assert_eq!(db.block_count(), 0);
        assert_eq!(db.latest_height().unwrap(), None);
    }

    #[test]
    fn store_and_retrieve_blocks() {
        let db = LedgerDb::open_temporary().unwrap();
        let chain = make_chain(3);
        for b in &chain {
            db.put_block(b).unwrap();
        }

        assert_eq!(db.block_count(), 3);
        assert_eq!(db.latest_height().unwrap(), Some(2));
        assert_eq!(db.get_block::<Block>(1).unwrap(), Some(chain[1].clone()));
        assert_eq!(db.get_block::<Block>(9).unwrap(), None);
    }

    #[test]
    fn block_and_latest_height_are_written_together() {
        let db = LedgerDb::open_temporary().unwrap();
        for b in &make_chain(2) {
            db.put_block(b).unwrap();
            assert_eq!(db.latest_height().unwrap(), Some(b.height()));
            assert_eq!(db.block_count() as u64, b.height() + 1);
        }
    }

    #[test]
    fn undo_put_restores_previous_state() {
        let db = LedgerDb::open_temporary().unwrap();
        let chain = make_chain(2);
        db.put_block(&chain[0]).unwrap();
        db.put_block(&chain[1]).unwrap();

        db.undo_put(&1u64.to_be_bytes(), Some(IVec::from(&0u64.to_be_bytes()[..])))
            .unwrap();
        assert_eq!(db.load_blocks::<Block>().unwrap(), vec![chain[0].clone()]);
        assert_eq!(db.latest_height().unwrap(), Some(0));

        db.undo_put(&0u64.to_be_bytes(), None).unwrap();
        assert_eq!(db.block_count(), 0);
        assert_eq!(db.latest_height().unwrap(), None);
    }

    #[test]
    fn load_blocks_returns_height_order() {
        let db = LedgerDb::open_temporary().unwrap();
        let chain = make_chain(300);
        // Insert out of order; big-endian keys must still scan in order.
        for b in chain.iter().rev() {
            db.put_block(b).unwrap();
        }
        let loaded: Vec<Block> = db.load_blocks().unwrap();
        assert_eq!(loaded, chain);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let chain = make_chain(2);
        {
            let db = LedgerDb::open(dir.path()).expect("open");
            for b in &chain {
                db.put_block(b).unwrap();
            }
        }
        let db = LedgerDb::open(dir.path()).expect("reopen");
        let loaded: Vec<Block> = db.load_blocks().unwrap();
        assert_eq!(loaded, chain);
    }
}
