//! # Registry Configuration & Constants
//!
//! Every magic number in the registry lives here. If you're hardcoding a
//! constant somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Most of these values are baked into signed challenges and stored block
//! digests. Changing them after blocks have been committed is somewhere
//! between "awkward" and "rewrite history", so choose wisely.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full protocol version string.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Ownership Challenges
// ---------------------------------------------------------------------------

/// Trailing tag of every challenge message:
/// `"<address>:<unixSecondsAtIssue>:starRegistry"`.
pub const CHALLENGE_SUFFIX: &str = "starRegistry";

/// Field separator inside a challenge message.
pub const CHALLENGE_SEPARATOR: char = ':';

/// Maximum age of a challenge, in seconds, at verification time.
/// A challenge whose age is >= this value is rejected as expired.
pub const CHALLENGE_WINDOW_SECS: u64 = 300;

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Payload carried by the genesis block.
pub const GENESIS_PAYLOAD: &str = "Genesis Block";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Public (verifying) key length in bytes. Addresses are base58 of these.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default HTTP API port.
pub const DEFAULT_API_PORT: u16 = 8000;

/// Default metrics (Prometheus) port.
pub const DEFAULT_METRICS_PORT: u16 = 8001;

// ---------------------------------------------------------------------------
// Runtime Configuration
// ---------------------------------------------------------------------------

/// Runtime knobs for the ownership-proof protocol.
///
/// The defaults are the protocol constants above. Tests and private
/// deployments may tighten the window; widening it past the default is
/// allowed but makes replayed challenges live longer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Maximum challenge age in seconds.
    pub challenge_window_secs: u64,
    /// How far into the future a challenge timestamp may lie before it is
    /// rejected as malformed. `None` accepts any future timestamp; such a
    /// challenge simply has a negative age and counts as fresh.
    #[serde(default)]
    pub max_clock_skew_secs: Option<u64>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            challenge_window_secs: CHALLENGE_WINDOW_SECS,
            max_clock_skew_secs: None,
        }
    }
}
