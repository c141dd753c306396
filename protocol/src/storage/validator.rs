//! Whole-chain integrity checks.
//!
//! Two independent checks run over every block:
//!
//! 1. **Link continuity** — each non-genesis block's `previous_hash` must
//!    equal the recomputed digest of the block before it, and its `height`
//!    must equal its position.
//! 2. **Self-consistency** — each block's stored hash must equal the digest
//!    of its current fields.
//!
//! Every violation is collected; the walk never stops at the first one.

use serde::{Deserialize, Serialize};

use super::block::ChainBlock;

/// What went wrong at a given height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The block does not link to its predecessor.
    BrokenLink,
    /// The block's stored hash does not match its content.
    SelfHashMismatch,
}

/// A detected break in the ledger, with the offending height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub height: u64,
}

impl Violation {
    pub fn broken_link(height: u64) -> Self {
        Self {
            kind: ViolationKind::BrokenLink,
            height,
        }
    }

    pub fn self_hash_mismatch(height: u64) -> Self {
        Self {
            kind: ViolationKind::SelfHashMismatch,
            height,
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ViolationKind::BrokenLink => write!(f, "broken link at height {}", self.height),
            ViolationKind::SelfHashMismatch => {
                write!(f, "hash mismatch at height {}", self.height)
            }
        }
    }
}

/// Outcome of a full-chain validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "violations", rename_all = "snake_case")]
pub enum ValidationReport {
    Valid,
    Invalid(Vec<Violation>),
}

impl ValidationReport {
    fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            ValidationReport::Valid
        } else {
            ValidationReport::Invalid(violations)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationReport::Valid)
    }

    /// All violations, empty when valid.
    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationReport::Valid => &[],
            ValidationReport::Invalid(v) => v,
        }
    }

    /// Violations that point at `height`.
    pub fn violations_at(&self, height: u64) -> impl Iterator<Item = &Violation> {
        self.violations().iter().filter(move |v| v.height == height)
    }
}

/// Walk `blocks` (in height order) and report every violation.
///
/// O(n) digest recomputations: each block's digest is computed once and
/// reused for its successor's link check.
pub fn validate_chain<B: ChainBlock>(blocks: &[B]) -> ValidationReport {
    let mut violations = Vec::new();
    let mut previous_digest: Option<String> = None;

    for (position, block) in blocks.iter().enumerate() {
        let height = block.height();
        let digest = block.compute_hash();

        let linked = match (position, block.previous_hash(), previous_digest.as_deref()) {
            (0, None, _) => true,
            (_, Some(stored), Some(actual)) if position > 0 => stored == actual,
            _ => false,
        };
        if !linked || height != position as u64 {
            violations.push(Violation::broken_link(height));
        }

        if digest != block.hash() {
            violations.push(Violation::self_hash_mismatch(height));
        }

        previous_digest = Some(digest);
    }

    ValidationReport::from_violations(violations)
}
