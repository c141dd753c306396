// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Star Registry — Core Library
//!
//! A tamper-evident, append-only registry that lets anyone claim a star by
//! proving control of an address. Each claim is a block hash-linked to the
//! one before it; any later edit to a committed block shows up the next time
//! the chain is validated.
//!
//! SHA-256 links the blocks, Ed25519 proves ownership, and sled keeps the
//! ledger across restarts when asked to.
//!
//! ## Architecture
//!
//! - **crypto** — Hashing, Ed25519 keys, and the signature verification seam.
//! - **storage** — Blocks, payload codec, the chain store, and persistence.
//! - **registry** — Ownership challenges, submissions, and queries.
//! - **config** — Protocol constants and runtime knobs.
//!
//! ## Quick look
//!
//! ```no_run
//! use star_registry::config::RegistryConfig;
//! use star_registry::crypto::{sign_message, StarKeypair};
//! use star_registry::registry::StarRegistry;
//! use star_registry::storage::Star;
//!
//! # async fn run() -> Result<(), star_registry::registry::RegistryError> {
//! let registry = StarRegistry::in_memory(RegistryConfig::default())?;
//! let owner = StarKeypair::generate();
//!
//! let message = registry.request_challenge(&owner.address());
//! let signature = sign_message(&owner, &message);
//! let star = Star::new("+68° 52' 56.9", "16h 29m 1.0s", "First light");
//!
//! registry
//!     .submit_star(&owner.address(), &message, &signature, star)
//!     .await?;
//! assert_eq!(registry.chain_height(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crypto;
pub mod registry;
pub mod storage;
