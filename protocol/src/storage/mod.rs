//! # Storage Module
//!
//! The registry ledger: blocks, their encoding, the append-only chain that
//! owns them, and optional durable persistence.
//!
//! ## Architecture
//!
//! ```text
//! payload.rs   — Star/claim payloads and the PayloadCodec seam
//! block.rs     — Block structure, digest computation, self-validation
//! validator.rs — Whole-chain link and self-hash checks
//! chain.rs     — ChainStore: atomic append with rollback
//! db.rs        — sled persistence
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! Payload ─codec─→ BlockDraft ─append─→ Block ─→ ChainStore ─→ LedgerDb
//!                                                   │
//!                                               validate
//! ```
//!
//! Bodies are opaque to everything below the codec. The chain hashes and
//! links them; only the registry layer decodes them.

pub mod block;
pub mod chain;
pub mod db;
pub mod payload;
pub mod validator;

pub use block::{compute_block_hash, Block, BlockDraft, ChainBlock};
pub use chain::{ChainError, ChainStore};
pub use db::{DbError, LedgerDb};
pub use payload::{CodecError, HexJsonCodec, Payload, PayloadCodec, Star, StarClaim};
pub use validator::{validate_chain, ValidationReport, Violation, ViolationKind};
