//! # Ownership Proof
//!
//! Binds a star claim to an address by a freshly signed challenge.
//!
//! ## Submission checks
//!
//! Checks run cheapest first and stop at the first failure. Nothing touches
//! the ledger until all of them pass.
//!
//! 1. **Shape**: the message parses as a challenge for the submitting
//!    address.
//! 2. **Freshness**: `now - issued_at < window`. A future `issued_at` has a
//!    negative age and passes, unless a clock skew limit is configured.
//! 3. **Signature**: verifies under the address's public key.
//! 4. **Append**: the claim is encoded and appended; integrity failures
//!    come back unchanged.
//!
//! The signature check is the only suspension point. It completes before
//! the append takes the ledger's write lock.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::crypto::SignatureVerifier;
use crate::storage::chain::now_secs;
use crate::storage::{Block, BlockDraft, ChainStore, Payload, PayloadCodec, Star, StarClaim};

use super::challenge::{format_challenge, parse_challenge};
use super::error::RegistryError;

/// Issues challenges and turns signed submissions into star blocks.
pub struct OwnershipVerifier {
    chain: Arc<ChainStore>,
    verifier: Arc<dyn SignatureVerifier>,
    codec: Arc<dyn PayloadCodec>,
    config: RegistryConfig,
}

impl OwnershipVerifier {
    pub fn new(
        chain: Arc<ChainStore>,
        verifier: Arc<dyn SignatureVerifier>,
        codec: Arc<dyn PayloadCodec>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            chain,
            verifier,
            codec,
            config,
        }
    }

    /// Challenge string for `address`, stamped with the current time.
    pub fn challenge(&self, address: &str) -> String {
        let message = format_challenge(address, now_secs());
        debug!(%address, "challenge issued");
        message
    }

    /// Check a signed challenge and append the star claim.
    pub async fn submit(
        &self,
        address: &str,
        message: &str,
        signature: &str,
        star: Star,
    ) -> Result<Block, RegistryError> {
        let result = self.check_and_append(address, message, signature, star).await;
        if let Err(e) = &result {
            info!(%address, reason = e.reason(), "submission rejected");
        }
        result
    }

    async fn check_and_append(
        &self,
        address: &str,
        message: &str,
        signature: &str,
        star: Star,
    ) -> Result<Block, RegistryError> {
        let challenge = parse_challenge(message)?;
        if challenge.address != address {
            return Err(RegistryError::MalformedChallenge {
                reason: "challenge was issued to a different address".to_string(),
            });
        }

        self.check_freshness(challenge.issued_at, now_secs())?;

        if !self.verifier.verify(message, address, signature).await? {
            return Err(RegistryError::InvalidSignature {
                address: address.to_string(),
            });
        }

        let payload = Payload::Star(StarClaim {
            address: address.to_string(),
            message: message.to_string(),
            star,
        });
        let draft = BlockDraft::from_payload(self.codec.as_ref(), &payload)?;
        Ok(self.chain.append(draft)?)
    }

    fn check_freshness(&self, issued_at: u64, now: u64) -> Result<(), RegistryError> {
        if let Some(skew) = self.config.max_clock_skew_secs {
            if issued_at > now.saturating_add(skew) {
                return Err(RegistryError::MalformedChallenge {
                    reason: format!("timestamp {issued_at} is in the future"),
                });
            }
        }
        let age_secs = now.saturating_sub(issued_at);
        if age_secs >= self.config.challenge_window_secs {
            return Err(RegistryError::ChallengeExpired {
                age_secs,
                window_secs: self.config.challenge_window_secs,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{sign_message, Ed25519Verifier, StarKeypair};
    use crate::storage::{ChainBlock, HexJsonCodec};

    fn verifier() -> OwnershipVerifier {
        verifier_with(RegistryConfig::default())
    }

    fn verifier_with(config: RegistryConfig) -> OwnershipVerifier {
        OwnershipVerifier::new(
            Arc::new(ChainStore::in_memory().unwrap()),
            Arc::new(Ed25519Verifier),
            Arc::new(HexJsonCodec),
            config,
        )
    }

    fn star() -> Star {
        Star::new("+68° 52' 56.9", "16h 29m 1.0s", "Found it")
    }

    #[test]
    fn challenge_embeds_address_and_now() {
        let v = verifier();
        let before = now_secs();
        let msg = v.challenge("addrA");
        let parsed = parse_challenge(&msg).unwrap();
        assert_eq!(parsed.address, "addrA");
        assert!(parsed.issued_at >= before && parsed.issued_at <= now_secs());
    }

    #[test]
    fn freshness_window_is_exclusive() {
        let v = verifier();
        let now = 1_700_000_000;
        assert!(v.check_freshness(now, now).is_ok());
        assert!(v.check_freshness(now - 299, now).is_ok());
        assert!(matches!(
            v.check_freshness(now - 300, now),
            Err(RegistryError::ChallengeExpired { age_secs: 300, .. })
        ));
    }

    #[test]
    fn future_timestamps_are_fresh_by_default() {
        let v = verifier();
        let now = 1_700_000_000;
        assert!(v.check_freshness(now + 30, now).is_ok());
        assert!(v.check_freshness(now + 86_400, now).is_ok());
    }

    #[test]
    fn configured_skew_limit_rejects_far_future() {
        let v = verifier_with(RegistryConfig {
            max_clock_skew_secs: Some(30),
            ..RegistryConfig::default()
        });
        let now = 1_700_000_000;
        assert!(v.check_freshness(now + 30, now).is_ok());
        assert!(matches!(
            v.check_freshness(now + 31, now),
            Err(RegistryError::MalformedChallenge { .. })
        ));
    }

    #[tokio::test]
    async fn future_dated_challenge_is_accepted() {
        let v = verifier();
        let kp = StarKeypair::generate();
        let addr = kp.address();
        let msg = format_challenge(&addr, now_secs() + 120);
        let sig = sign_message(&kp, &msg);

        let block = v.submit(&addr, &msg, &sig, star()).await.unwrap();
        assert_eq!(block.height(), 1);
        assert_eq!(v.chain.height(), 1);
    }

    #[tokio::test]
    async fn valid_submission_appends_star_block() {
        let v = verifier();
        let kp = StarKeypair::generate();
        let addr = kp.address();
        let msg = v.challenge(&addr);
        let sig = sign_message(&kp, &msg);

        let block = v.submit(&addr, &msg, &sig, star()).await.unwrap();
        assert_eq!(block.height(), 1);
        assert_eq!(v.chain.height(), 1);

        let payload = block.decode(&HexJsonCodec).await.unwrap();
        let claim = payload.as_star().unwrap();
        assert_eq!(claim.address, addr);
        assert_eq!(claim.message, msg);
        assert_eq!(claim.star, star());
    }

    #[tokio::test]
    async fn stale_challenge_is_expired() {
        let v = verifier();
        let kp = StarKeypair::generate();
        let addr = kp.address();
        let msg = format_challenge(&addr, now_secs() - 300);
        let sig = sign_message(&kp, &msg);

        let err = v.submit(&addr, &msg, &sig, star()).await.unwrap_err();
        assert!(matches!(err, RegistryError::ChallengeExpired { .. }));
        assert_eq!(v.chain.height(), 0);
    }

    #[tokio::test]
    async fn foreign_signature_is_invalid() {
        let v = verifier();
        let owner = StarKeypair::generate();
        let other = StarKeypair::generate();
        let addr = owner.address();
        let msg = v.challenge(&addr);
        let sig = sign_message(&other, &msg);

        let err = v.submit(&addr, &msg, &sig, star()).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSignature { .. }));
        assert_eq!(v.chain.height(), 0);
    }

    #[tokio::test]
    async fn undecodable_signature_is_malformed() {
        let v = verifier();
        let kp = StarKeypair::generate();
        let addr = kp.address();
        let msg = v.challenge(&addr);

        let err = v.submit(&addr, &msg, "zz", star()).await.unwrap_err();
        assert!(matches!(err, RegistryError::MalformedSignature { .. }));
    }

    #[tokio::test]
    async fn undecodable_address_is_malformed() {
        let v = verifier();
        let msg = v.challenge("not-base58!");
        let err = v
            .submit("not-base58!", &msg, &"00".repeat(64), star())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedSignature { .. }));
    }

    #[tokio::test]
    async fn challenge_for_other_address_is_rejected() {
        let v = verifier();
        let alice = StarKeypair::generate();
        let bob = StarKeypair::generate();
        let msg = v.challenge(&alice.address());
        let sig = sign_message(&bob, &msg);

        let err = v
            .submit(&bob.address(), &msg, &sig, star())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedChallenge { .. }));
        assert_eq!(v.chain.height(), 0);
    }
}
