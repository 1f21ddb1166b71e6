//! Motion lifecycle coordination
//!
//! Every mutating operation reads the motion first, checks its local
//! preconditions in a fixed order and only then submits a single call to the
//! chain executor. A rejection of that call is surfaced as
//! [`GovernanceError::RevertedOnChain`]; nothing is retried.

use tracing::{debug, info};

use motions_core::{Address, Amount, Hash};

use crate::calls;
use crate::commitment::VoteCommitmentCodec;
use crate::error::{GovernanceError, GovernanceResult};
use crate::events::{self, MotionEventSet, MotionFinalized, MotionStaked, MotionVoteRevealed, MotionVoteSubmitted, UserTokenApproved};
use crate::interfaces::{Collaborators, TransactionReceipt};
use crate::state_machine::{MotionState, MotionStateMachine, Operation};
use crate::thresholds::StakeThresholdCalculator;
use crate::types::{DomainId, Motion, MotionId, RemainingStakes, ReputationProof, StakeFractions, Vote, ROOT_DOMAIN, STAKE_END};

/// Events emitted by a successful stake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeEvents {
    pub staked: MotionStaked,
    /// Present when the stake moved one of the motion's windows
    pub event_set: Option<MotionEventSet>,
}

/// Drives motions of one organization through their lifecycle
pub struct MotionLifecycleCoordinator {
    colony: Address,
    token: Address,
    module: Address,
    collaborators: Collaborators,
    thresholds: StakeThresholdCalculator,
    codec: VoteCommitmentCodec,
}

impl MotionLifecycleCoordinator {
    /// Create a coordinator for the motions module at `module`
    pub fn new(
        colony: Address,
        token: Address,
        module: Address,
        fractions: StakeFractions,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            colony,
            token,
            codec: VoteCommitmentCodec::new(module.clone()),
            module,
            collaborators,
            thresholds: StakeThresholdCalculator::new(fractions),
        }
    }

    /// Address of the motions module
    pub fn address(&self) -> &Address {
        &self.module
    }

    /// Threshold arithmetic over the module's stake fractions
    pub fn thresholds(&self) -> &StakeThresholdCalculator {
        &self.thresholds
    }

    /// Salt and commitment codec bound to the module address
    pub fn codec(&self) -> &VoteCommitmentCodec {
        &self.codec
    }

    /// State machine sharing this coordinator's thresholds
    pub fn state_machine(&self) -> MotionStateMachine {
        MotionStateMachine::new(self.thresholds)
    }

    /// Get a motion by its id
    pub async fn get_motion(&self, motion_id: MotionId) -> GovernanceResult<Motion> {
        let count = self.collaborators.executor.motion_count(&self.module).await?;
        if motion_id == 0 || motion_id > count {
            return Err(GovernanceError::NotFound(format!("Motion with id {} does not exist", motion_id)));
        }

        self.collaborators.executor.get_motion(&self.module, motion_id).await?
            .ok_or_else(|| GovernanceError::NotFound(format!("Motion with id {} does not exist", motion_id)))
    }

    /// Phase the ledger reports for a motion
    pub async fn get_motion_state(&self, motion_id: MotionId) -> GovernanceResult<MotionState> {
        Ok(self.collaborators.executor.motion_state(&self.module, motion_id).await?)
    }

    /// Amounts each side still needs to activate
    pub async fn get_remaining_stakes(&self, motion_id: MotionId) -> GovernanceResult<RemainingStakes> {
        let motion = self.get_motion(motion_id).await?;
        Ok(self.thresholds.remaining_stakes(&motion))
    }

    /// Minimum amount a stake on `side` must carry
    pub async fn get_min_stake(&self, motion_id: MotionId, side: Vote) -> GovernanceResult<Amount> {
        let motion = self.get_motion(motion_id).await?;
        Ok(self.thresholds.min_stake(&motion, side))
    }

    /// Approve deposited tokens for staking motions in a team
    ///
    /// Defaults to the root team.
    pub async fn approve_stake(
        &self,
        amount: Amount,
        team: Option<DomainId>,
    ) -> GovernanceResult<(UserTokenApproved, TransactionReceipt)> {
        let domain_id = team.unwrap_or(ROOT_DOMAIN);
        let executor = &self.collaborators.executor;

        if executor.domain(&self.colony, domain_id).await?.is_none() {
            return Err(GovernanceError::NotFound(format!("Team with id {} does not exist", domain_id)));
        }

        let caller = self.collaborators.signer.address();
        let call = calls::approve_stake(&self.colony, &caller, &self.module, domain_id, amount);
        let receipt = executor.execute(call).await?;
        info!("{} approved {} for staking in team {} (tx {})", caller, amount, domain_id, receipt.tx_hash);

        Ok((events::extract(&receipt)?, receipt))
    }

    /// Stake `amount` on `side` of a motion
    ///
    /// Deposit, organization approval, module approval, staking window and
    /// minimum stake are checked in that order, then the reported phase.
    pub async fn stake(
        &self,
        motion_id: MotionId,
        side: Vote,
        amount: Amount,
    ) -> GovernanceResult<(StakeEvents, TransactionReceipt)> {
        let user = self.collaborators.signer.address();
        let motion = self.get_motion(motion_id).await?;

        let tokens = &self.collaborators.tokens;
        let executor = &self.collaborators.executor;
        let (deposited, colony_approval, module_approval) = futures::try_join!(
            tokens.deposited(&self.token, &user),
            tokens.approved(&self.token, &user, &self.colony),
            executor.stake_approval(&self.colony, &user, &self.module, motion.domain_id),
        )?;

        if deposited < amount {
            return reject(GovernanceError::InsufficientDeposit { required: amount, deposited });
        }
        if colony_approval < amount {
            return reject(GovernanceError::InsufficientApproval {
                obligator: self.colony.clone(),
                required: amount,
                approved: colony_approval,
            });
        }
        if module_approval < amount {
            return reject(GovernanceError::InsufficientApproval {
                obligator: self.module.clone(),
                required: amount,
                approved: module_approval,
            });
        }

        let now = self.collaborators.clock.now_secs();
        let ended_at = motion.events[STAKE_END];
        if ended_at <= now {
            return reject(GovernanceError::StakingWindowClosed { motion_id, ended_at });
        }

        let minimum = self.thresholds.min_stake(&motion, side);
        if amount < minimum {
            return reject(GovernanceError::StakeTooSmall { minimum, amount });
        }
        self.require_state(motion_id, Operation::Stake).await?;

        let call = calls::stake_motion(&self.module, &user, motion_id, side, amount);
        let receipt = executor.execute(call).await?;
        info!("{} staked {} on {} of motion {} (tx {})", user, amount, side, motion_id, receipt.tx_hash);

        let staked = events::extract(&receipt)?;
        let event_set = events::find(&receipt)?;
        Ok((StakeEvents { staked, event_set }, receipt))
    }

    /// Commit a hidden vote on a motion
    pub async fn submit_vote(
        &self,
        motion_id: MotionId,
        vote: Vote,
    ) -> GovernanceResult<(MotionVoteSubmitted, TransactionReceipt)> {
        let motion = self.get_motion(motion_id).await?;
        self.require_state(motion_id, Operation::SubmitVote).await?;

        let user = self.collaborators.signer.address();
        let (proof, salt) = self.proof_and_salt(&motion, &user).await?;

        let commitment = VoteCommitmentCodec::build_commitment(&salt, vote);
        let call = calls::submit_vote(&self.module, &user, motion_id, &commitment, &proof);
        let receipt = self.collaborators.executor.execute(call).await?;
        info!("{} submitted a vote on motion {} (tx {})", user, motion_id, receipt.tx_hash);

        Ok((events::extract(&receipt)?, receipt))
    }

    /// Reveal a committed vote
    ///
    /// When `vote` is `None` the committed side is looked up, which is best
    /// effort. Passing the vote explicitly is preferred.
    pub async fn reveal_vote(
        &self,
        motion_id: MotionId,
        vote: Option<Vote>,
    ) -> GovernanceResult<(MotionVoteRevealed, TransactionReceipt)> {
        let motion = self.get_motion(motion_id).await?;
        self.require_state(motion_id, Operation::RevealVote).await?;

        let user = self.collaborators.signer.address();
        let (proof, salt) = self.proof_and_salt(&motion, &user).await?;

        let side = match vote {
            Some(side) => side,
            None => self.codec
                .resolve_revealed_side(self.collaborators.executor.as_ref(), &user, motion_id, &salt, &proof)
                .await?
                .ok_or_else(|| GovernanceError::VoteNotFound { voter: user.clone(), motion_id })?,
        };

        let call = calls::reveal_vote(&self.module, &user, motion_id, &salt, side, &proof);
        let receipt = self.collaborators.executor.execute(call).await?;
        info!("{} revealed {} on motion {} (tx {})", user, side, motion_id, receipt.tx_hash);

        Ok((events::extract(&receipt)?, receipt))
    }

    /// Finalize a motion, executing its action if Yay prevailed
    pub async fn finalize(&self, motion_id: MotionId) -> GovernanceResult<(MotionFinalized, TransactionReceipt)> {
        self.get_motion(motion_id).await?;
        self.require_state(motion_id, Operation::Finalize).await?;

        let user = self.collaborators.signer.address();
        let call = calls::finalize_motion(&self.module, &user, motion_id);
        let receipt = self.collaborators.executor.execute(call).await?;

        let finalized: MotionFinalized = events::extract(&receipt)?;
        info!("Motion {} finalized, action executed: {} (tx {})", motion_id, finalized.executed, receipt.tx_hash);
        Ok((finalized, receipt))
    }

    async fn require_state(&self, motion_id: MotionId, operation: Operation) -> GovernanceResult<()> {
        let found = self.get_motion_state(motion_id).await?;
        MotionStateMachine::require(operation, found)
    }

    async fn proof_and_salt(&self, motion: &Motion, user: &Address) -> GovernanceResult<(ReputationProof, Hash)> {
        let oracle = &self.collaborators.oracle;
        let proof = async {
            oracle.reputation_proof(motion.skill_id, user, &motion.root_hash).await
                .map_err(GovernanceError::from)
        };
        let salt = self.codec.derive_salt(self.collaborators.signer.as_ref(), motion.id);

        futures::try_join!(proof, salt)
    }
}

fn reject<T>(error: GovernanceError) -> GovernanceResult<T> {
    debug!("Stake rejected: {}", error);
    Err(error)
}
