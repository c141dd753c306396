//! Ownership challenges.
//!
//! A challenge is a plain string the client signs to prove control of an
//! address:
//!
//! ```text
//! <address>:<unix seconds at issue>:starRegistry
//! ```
//!
//! Nothing is stored server-side. Freshness comes entirely from the embedded
//! timestamp, so any string of this shape that the owner signed within the
//! window is accepted.

use crate::config::{CHALLENGE_SEPARATOR, CHALLENGE_SUFFIX};

use super::error::RegistryError;

/// A parsed challenge message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Challenge<'a> {
    pub address: &'a str,
    pub issued_at: u64,
}

/// Render the challenge string for `address` issued at `issued_at`.
pub fn format_challenge(address: &str, issued_at: u64) -> String {
    format!(
        "{address}{sep}{issued_at}{sep}{CHALLENGE_SUFFIX}",
        sep = CHALLENGE_SEPARATOR
    )
}

/// Split a challenge string back into its parts.
///
/// Addresses never contain the separator, so the message must split into
/// exactly three fields.
pub fn parse_challenge(message: &str) -> Result<Challenge<'_>, RegistryError> {
    let malformed = |reason: &str| RegistryError::MalformedChallenge {
        reason: reason.to_string(),
    };

    let fields: Vec<&str> = message.split(CHALLENGE_SEPARATOR).collect();
    let [address, timestamp, suffix] = fields.as_slice() else {
        return Err(malformed("expected <address>:<timestamp>:starRegistry"));
    };
    if *suffix != CHALLENGE_SUFFIX {
        return Err(malformed("unknown challenge suffix"));
    }
    if address.is_empty() {
        return Err(malformed("empty address"));
    }
    let issued_at = timestamp
        .parse::<u64>()
        .map_err(|_| malformed("timestamp is not an integer"))?;

    Ok(Challenge { address, issued_at })
}
