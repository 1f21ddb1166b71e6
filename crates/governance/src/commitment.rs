//! Commit-reveal vote hiding
//!
//! A vote is committed as `sha256(salt || vote)` where the vote is encoded as
//! a 32-byte big-endian integer. The salt is never stored: it is re-derived
//! on demand by signing a fixed message and hashing the signature, which only
//! works because the signer produces deterministic signatures.

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use motions_core::{sha256, Address, Hash};

use crate::calls;
use crate::error::{GovernanceError, GovernanceResult};
use crate::interfaces::{ChainExecutor, Signer};
use crate::types::{MotionId, ReputationProof, Vote};

/// Width of the encoded vote tag
const VOTE_WORD: usize = 32;

/// Derives salts and builds vote commitments for one motions module
#[derive(Debug, Clone)]
pub struct VoteCommitmentCodec {
    module: Address,
}

impl VoteCommitmentCodec {
    pub fn new(module: Address) -> Self {
        Self { module }
    }

    /// Message signed to obtain the salt for a motion
    ///
    /// Must stay on a single line: some wallets rewrite line breaks before
    /// signing, which would change the salt.
    pub fn salt_message(&self, motion_id: MotionId) -> String {
        format!(
            "Sign this message to generate 'salt' entropy. Extension Address: {} Motion ID: {}",
            self.module, motion_id
        )
    }

    /// Salt for `motion_id`, reproducible for the same signer
    pub async fn derive_salt(&self, signer: &dyn Signer, motion_id: MotionId) -> GovernanceResult<Hash> {
        let signature = signer.sign_message(&self.salt_message(motion_id)).await?;
        Ok(sha256(signature.as_bytes()))
    }

    /// Commitment hiding `vote` under `salt`
    pub fn build_commitment(salt: &Hash, vote: Vote) -> Hash {
        let mut word = [0u8; VOTE_WORD];
        word[VOTE_WORD - 1] = vote.tag();

        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(word);
        Hash(hasher.finalize().to_vec())
    }

    /// Whether `salt` and `vote` open `commitment`
    pub fn verify(commitment: &Hash, salt: &Hash, vote: Vote) -> bool {
        Self::build_commitment(salt, vote) == *commitment
    }

    /// Best-effort discovery of the side `caller` committed to
    ///
    /// Dry-runs a reveal for Nay, then for Yay if Nay was rejected as a
    /// commitment mismatch. `None` means no side could be confirmed, which is
    /// an expected outcome: any other rejection stops the search since it says
    /// nothing about the committed side. Transport failures are returned.
    pub async fn resolve_revealed_side(
        &self,
        executor: &dyn ChainExecutor,
        caller: &Address,
        motion_id: MotionId,
        salt: &Hash,
        proof: &ReputationProof,
    ) -> GovernanceResult<Option<Vote>> {
        for side in Vote::BOTH {
            let call = calls::reveal_vote(&self.module, caller, motion_id, salt, side, proof);
            match executor.simulate(call).await.map_err(GovernanceError::from) {
                Ok(()) => {
                    debug!("Motion {}: commitment of {} opens with {}", motion_id, caller, side);
                    return Ok(Some(side));
                }
                Err(err) if err.is_commitment_mismatch() => continue,
                Err(err @ GovernanceError::Transport(_)) => return Err(err),
                Err(err) => {
                    warn!("Motion {}: stopped looking for the side {} voted: {}", motion_id, caller, err);
                    return Ok(None);
                }
            }
        }

        warn!("Motion {}: neither side opens the commitment of {}", motion_id, caller);
        Ok(None)
    }
}
