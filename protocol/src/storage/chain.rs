//! # ChainStore — Atomic Append with Rollback
//!
//! Owns the ordered block sequence and is the only code that creates or
//! removes blocks.
//!
//! ## Append protocol
//!
//! ```text
//!   write lock ─┬─ height = len, timestamp = now, link = hash(tip)
//!               ├─ seal (compute digest)
//!               ├─ push                       ← tentative commit
//!               ├─ validate whole chain
//!               ├─ violation at new height? ── yes → pop, return violations
//!               ├─ persist (if durable)    ── err → pop, return error
//!   unlock   ───┴─ return block
//! ```
//!
//! The write guard spans the entire sequence, so concurrent appends never
//! assign overlapping heights and readers never see a block that is about
//! to be rolled back.
//!
//! ## Pre-existing corruption
//!
//! Violations at heights below the new block were already there before the
//! append. They stay visible through [`ChainStore::validate`] but do not
//! block new data, and nothing here tries to heal them.

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::block::{Block, BlockDraft, ChainBlock};
use super::db::{DbError, LedgerDb};
use super::validator::{validate_chain, ValidationReport, Violation};

/// Errors from ledger mutation.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Post-append validation failed; the append was rolled back.
    #[error("chain integrity violation: {}", format_violations(.0))]
    IntegrityViolation(Vec<Violation>),

    /// The durable store rejected the write; the append was rolled back.
    #[error("storage error: {0}")]
    Storage(#[from] DbError),
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The registry ledger.
#[derive(Debug)]
pub struct ChainStore<B: ChainBlock = Block> {
    blocks: RwLock<Vec<B>>,
    db: Option<LedgerDb>,
}

impl ChainStore<Block> {
    /// Fresh in-memory ledger holding only the standard genesis block.
    pub fn in_memory() -> Result<Self, ChainError> {
        Self::new(BlockDraft::genesis())
    }
}

impl<B: ChainBlock> ChainStore<B> {
    /// Fresh in-memory ledger, self-initialized by appending `genesis`.
    pub fn new(genesis: B::Draft) -> Result<Self, ChainError> {
        let store = Self {
            blocks: RwLock::new(Vec::new()),
            db: None,
        };
        store.append(genesis)?;
        Ok(store)
    }

    /// Ledger backed by `db`.
    ///
    /// An empty database gets a genesis block; a populated one is loaded
    /// as-is. Stored corruption is logged and stays reported by
    /// [`validate`](Self::validate); it is never rewritten.
    pub fn open(db: LedgerDb, genesis: B::Draft) -> Result<Self, ChainError> {
        let blocks: Vec<B> = db.load_blocks()?;
        let loaded = blocks.len();
        let store = Self {
            blocks: RwLock::new(blocks),
            db: Some(db),
        };

        if loaded == 0 {
            store.append(genesis)?;
            info!("initialized empty ledger with genesis block");
        } else {
            let report = store.validate();
            info!(blocks = loaded, valid = report.is_valid(), "ledger loaded from storage");
            if let ValidationReport::Invalid(violations) = &report {
                warn!(count = violations.len(), "stored ledger has integrity violations");
            }
        }
        Ok(store)
    }

    /// Height of the tip. The genesis block is always present, so this is
    /// `committed blocks - 1`.
    pub fn height(&self) -> u64 {
        (self.blocks.read().len() as u64).saturating_sub(1)
    }

    /// Number of committed blocks.
    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }

    /// Append a draft. See the module docs for the full protocol.
    pub fn append(&self, draft: B::Draft) -> Result<B, ChainError> {
        let mut blocks = self.blocks.write();

        let height = blocks.len() as u64;
        let previous_hash = blocks.last().map(B::compute_hash);
        let timestamp = now_secs();
        let block = B::seal(draft, height, timestamp, previous_hash);

        blocks.push(block.clone());

        let report = validate_chain(blocks.as_slice());
        if report.violations_at(height).next().is_some() {
            blocks.pop();
            let violations = report.violations().to_vec();
            warn!(
                height,
                violations = violations.len(),
                "append failed validation, rolled back"
            );
            return Err(ChainError::IntegrityViolation(violations));
        }

        if let Some(db) = &self.db {
            if let Err(e) = db.put_block(&block) {
                blocks.pop();
                warn!(height, error = %e, "failed to persist block, rolled back");
                return Err(e.into());
            }
        }

        debug!(height, hash = block.hash(), "block committed");
        Ok(block)
    }

    /// Validate the whole committed chain.
    pub fn validate(&self) -> ValidationReport {
        validate_chain(self.blocks.read().as_slice())
    }

    /// Run `f` against the committed blocks under a read guard.
    ///
    /// Keep `f` short: appends wait for it.
    pub fn read<R>(&self, f: impl FnOnce(&[B]) -> R) -> R {
        f(&self.blocks.read())
    }

    /// Owned copy of the committed blocks, for work that must not hold the
    /// lock (e.g. async payload decoding).
    pub fn snapshot(&self) -> Vec<B> {
        self.blocks.read().clone()
    }

    /// Out-of-band mutation of a committed block, for corruption tests only.
    #[cfg(test)]
    pub(crate) fn corrupt(&self, height: usize, f: impl FnOnce(&mut B)) {
        f(&mut self.blocks.write()[height]);
    }
}

/// Current Unix time in whole seconds. Sub-second precision is dropped.
pub fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    fn body(n: u64) -> BlockDraft {
        BlockDraft::new(hex::encode(format!("payload {n}")))
    }

    #[test]
    fn fresh_ledger_has_only_genesis() {
        let chain = ChainStore::in_memory().unwrap();
        assert_eq!(chain.height(), 0);
        assert_eq!(chain.len(), 1);
        chain.read(|blocks| {
            assert!(blocks[0].is_genesis());
            assert!(blocks[0].previous_hash().is_none());
        });
        assert!(chain.validate().is_valid());
    }

    #[test]
    fn appends_advance_height_and_stay_valid() {
        let chain = ChainStore::in_memory().unwrap();
        for n in 1..=10 {
            let block = chain.append(body(n)).unwrap();
            assert_eq!(block.height(), n);
        }
        assert_eq!(chain.height(), 10);
        assert_eq!(chain.validate(), ValidationReport::Valid);
    }

    #[test]
    fn appended_block_links_to_tip() {
        let chain = ChainStore::in_memory().unwrap();
        let b1 = chain.append(body(1)).unwrap();
        let b2 = chain.append(body(2)).unwrap();
        assert_eq!(b2.previous_hash(), Some(b1.hash()));
        assert!(b2.timestamp() >= b1.timestamp());
    }

    #[test]
    fn tampered_payload_is_reported_not_healed() {
        let chain = ChainStore::in_memory().unwrap();
        chain.append(body(1)).unwrap();
        chain.append(body(2)).unwrap();

        chain.corrupt(1, |b| b.tamper(Some("deadbeef"), None));
        let report = chain.validate();
        assert!(report.violations_at(1).next().is_some());

        // New data is still accepted on top of the damaged chain.
        let b3 = chain.append(body(3)).unwrap();
        assert_eq!(b3.height(), 3);
        assert_eq!(chain.height(), 3);

        // And the damage is still there.
        assert!(chain.validate().violations_at(1).next().is_some());
    }

    #[test]
    fn tampered_tip_does_not_block_appends() {
        let chain = ChainStore::in_memory().unwrap();
        chain.append(body(1)).unwrap();
        chain.corrupt(1, |b| b.tamper(None, Some(&"0".repeat(64))));

        let b2 = chain.append(body(2)).unwrap();
        assert_eq!(b2.height(), 2);
        let report = chain.validate();
        assert_eq!(report.violations(), &[Violation::self_hash_mismatch(1)]);
    }

    // -- Rollback -----------------------------------------------------------

    /// A block scheme whose sealing can be told to store a wrong digest.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct FaultyBlock {
        height: u64,
        previous_hash: Option<String>,
        hash: String,
        body: String,
    }

    struct FaultyDraft {
        body: String,
        corrupt: bool,
    }

    impl FaultyBlock {
        fn digest(height: u64, previous_hash: Option<&str>, body: &str) -> String {
            crate::crypto::sha256_hex(
                format!("{height}|{}|{body}", previous_hash.unwrap_or("-")).as_bytes(),
            )
        }
    }

    impl ChainBlock for FaultyBlock {
        type Draft = FaultyDraft;

        fn seal(draft: FaultyDraft, height: u64, _ts: u64, previous_hash: Option<String>) -> Self {
            let mut hash = Self::digest(height, previous_hash.as_deref(), &draft.body);
            if draft.corrupt {
                hash = "f".repeat(64);
            }
            Self {
                height,
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
            Self::digest(self.height, self.previous_hash.as_deref(), &self.body)
        }
    }

    fn draft(body: &str, corrupt: bool) -> FaultyDraft {
        FaultyDraft {
            body: body.to_string(),
            corrupt,
        }
    }

    #[test]
    fn invalid_append_is_rolled_back() {
        let chain: ChainStore<FaultyBlock> = ChainStore::new(draft("genesis", false)).unwrap();
        chain.append(draft("one", false)).unwrap();

        let err = chain.append(draft("bad", true)).unwrap_err();
        match err {
            ChainError::IntegrityViolation(v) => {
                assert_eq!(v, vec![Violation::self_hash_mismatch(2)]);
            }
            other => panic!("expected integrity violation, got {other:?}"),
        }

        assert_eq!(chain.height(), 1);
        assert!(chain.validate().is_valid());
        chain.read(|blocks| assert!(blocks.iter().all(|b| b.body != "bad")));

        // The ledger stays usable and reuses the freed height.
        let next = chain.append(draft("two", false)).unwrap();
        assert_eq!(next.height(), 2);
    }

    #[test]
    fn new_height_follows_position_not_tip_field() {
        let chain: ChainStore<FaultyBlock> = ChainStore::new(draft("genesis", false)).unwrap();
        chain.append(draft("one", false)).unwrap();
        chain.corrupt(1, |b| b.height = 7);

        let next = chain.append(draft("two", false)).unwrap();
        assert_eq!(next.height(), 2);
        assert_eq!(chain.height(), 2);
        assert!(chain.validate().violations_at(2).next().is_none());
    }

    #[test]
    fn faulty_genesis_fails_construction() {
        let err = ChainStore::<FaultyBlock>::new(draft("genesis", true)).unwrap_err();
        assert!(matches!(err, ChainError::IntegrityViolation(_)));
    }

    #[test]
    fn integrity_error_lists_violations() {
        let err = ChainError::IntegrityViolation(vec![
            Violation::self_hash_mismatch(2),
            Violation::broken_link(3),
        ]);
        assert_eq!(
            err.to_string(),
            "chain integrity violation: hash mismatch at height 2, broken link at height 3"
        );
    }

    // -- Concurrency --------------------------------------------------------

    #[test]
    fn concurrent_appends_get_distinct_heights() {
        let chain = Arc::new(ChainStore::in_memory().unwrap());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let chain = Arc::clone(&chain);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|i| chain.append(body(t * 100 + i)).unwrap().height())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut heights: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        heights.sort_unstable();

        assert_eq!(heights, (1..=200).collect::<Vec<_>>());
        assert_eq!(chain.height(), 200);
        assert!(chain.validate().is_valid());
    }

    // -- Persistence --------------------------------------------------------

    #[test]
    fn durable_ledger_writes_through() {
        let db = LedgerDb::open_temporary().unwrap();
        let chain = ChainStore::<Block>::open(db.clone(), BlockDraft::genesis()).unwrap();
        let b1 = chain.append(body(1)).unwrap();

        assert_eq!(db.block_count(), 2);
        assert_eq!(db.latest_height().unwrap(), Some(1));
        assert_eq!(db.get_block::<Block>(1).unwrap(), Some(b1));
    }

    #[test]
    fn reopened_ledger_resumes_from_storage() {
        let dir = tempfile::tempdir().unwrap();
        let genesis_hash;
        {
            let db = LedgerDb::open(dir.path()).unwrap();
            let chain = ChainStore::<Block>::open(db, BlockDraft::genesis()).unwrap();
            chain.append(body(1)).unwrap();
            chain.append(body(2)).unwrap();
            genesis_hash = chain.read(|b| b[0].hash().to_string());
        }

        let db = LedgerDb::open(dir.path()).unwrap();
        let chain = ChainStore::<Block>::open(db, BlockDraft::genesis()).unwrap();
        assert_eq!(chain.height(), 2);
        assert!(chain.validate().is_valid());
        // Genesis is reused, not re-created.
        assert_eq!(chain.read(|b| b[0].hash().to_string()), genesis_hash);

        let b3 = chain.append(body(3)).unwrap();
        assert_eq!(b3.height(), 3);
    }

    #[test]
    fn rolled_back_block_is_not_persisted() {
        let db = LedgerDb::open_temporary().unwrap();
        let chain: ChainStore<FaultyBlock> =
            ChainStore::open(db.clone(), draft("genesis", false)).unwrap();
        assert!(chain.append(draft("bad", true)).is_err());
        assert_eq!(db.block_count(), 1);
        assert_eq!(db.latest_height().unwrap(), Some(0));
    }

    #[test]
    fn rolled_back_block_does_not_return_on_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = LedgerDb::open(dir.path()).unwrap();
            let chain: ChainStore<FaultyBlock> =
                ChainStore::open(db, draft("genesis", false)).unwrap();
            chain.append(draft("one", false)).unwrap();
            assert!(chain.append(draft("bad", true)).is_err());
        }

        let db = LedgerDb::open(dir.path()).unwrap();
        let chain: ChainStore<FaultyBlock> =
            ChainStore::open(db, draft("genesis", false)).unwrap();
        assert_eq!(chain.height(), 1);
        assert!(chain.validate().is_valid());
        chain.read(|blocks| assert!(blocks.iter().all(|b| b.body != "bad")));
    }
}
