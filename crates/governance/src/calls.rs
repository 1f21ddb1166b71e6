//! Contract call builders for the motions module and the organization

use motions_core::{Address, Amount, Hash};

use crate::interfaces::{CallArg, ContractCall};
use crate::types::{DomainId, MotionId, ReputationProof, Vote};

pub const STAKE_MOTION: &str = "stakeMotion";
pub const SUBMIT_VOTE: &str = "submitVote";
pub const REVEAL_VOTE: &str = "revealVote";
pub const FINALIZE_MOTION: &str = "finalizeMotion";
pub const APPROVE_STAKE: &str = "approveStake";

/// `stakeMotion(motionId, vote, amount)` on the motions module
pub fn stake_motion(module: &Address, caller: &Address, motion_id: MotionId, side: Vote, amount: Amount) -> ContractCall {
    ContractCall::new(module.clone(), STAKE_MOTION, caller.clone())
        .arg(CallArg::Uint(motion_id.into()))
        .arg(CallArg::Uint(side.tag().into()))
        .arg(CallArg::Uint(amount))
}

/// `submitVote(motionId, commitment, proof)` on the motions module
pub fn submit_vote(
    module: &Address,
    caller: &Address,
    motion_id: MotionId,
    commitment: &Hash,
    proof: &ReputationProof,
) -> ContractCall {
    ContractCall::new(module.clone(), SUBMIT_VOTE, caller.clone())
        .arg(CallArg::Uint(motion_id.into()))
        .arg(CallArg::Bytes(commitment.as_bytes().to_vec()))
        .arg(CallArg::Proof(proof.clone()))
}

/// `revealVote(motionId, salt, vote, proof)` on the motions module
pub fn reveal_vote(
    module: &Address,
    caller: &Address,
    motion_id: MotionId,
    salt: &Hash,
    side: Vote,
    proof: &ReputationProof,
) -> ContractCall {
    ContractCall::new(module.clone(), REVEAL_VOTE, caller.clone())
        .arg(CallArg::Uint(motion_id.into()))
        .arg(CallArg::Bytes(salt.as_bytes().to_vec()))
        .arg(CallArg::Uint(side.tag().into()))
        .arg(CallArg::Proof(proof.clone()))
}

/// `finalizeMotion(motionId)` on the motions module
pub fn finalize_motion(module: &Address, caller: &Address, motion_id: MotionId) -> ContractCall {
    ContractCall::new(module.clone(), FINALIZE_MOTION, caller.clone())
        .arg(CallArg::Uint(motion_id.into()))
}

/// `approveStake(obligator, domainId, amount)` on the organization
pub fn approve_stake(
    colony: &Address,
    caller: &Address,
    obligator: &Address,
    domain_id: DomainId,
    amount: Amount,
) -> ContractCall {
    ContractCall::new(colony.clone(), APPROVE_STAKE, caller.clone())
        .arg(CallArg::Address(obligator.clone()))
        .arg(CallArg::Uint(domain_id.into()))
        .arg(CallArg::Uint(amount))
}
