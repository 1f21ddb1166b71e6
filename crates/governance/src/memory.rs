//! In-memory ledger
//!
//! A single-organization ledger that serves as chain executor, token ledger
//! and reputation oracle at once. It enforces the rules the motions module
//! enforces on chain and emits the same events, so coordinators can be
//! exercised end to end without a network.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use motions_core::{sha256, Address, Amount, Hash, Timestamp};

use crate::calls;
use crate::commitment::VoteCommitmentCodec;
use crate::error::RevertReason;
use crate::events::{
    LedgerEvent, MotionEventSet, MotionFinalized, MotionStaked, MotionVoteRevealed, MotionVoteSubmitted,
    UserTokenApproved,
};
use crate::interfaces::{
    ChainError, ChainEvent, ChainExecutor, ChainResult, Clock, ContractCall, OracleError, ReputationOracle,
    TokenLedger, TransactionReceipt,
};
use crate::state_machine::{MotionState, MotionStateMachine};
use crate::thresholds::StakeThresholdCalculator;
use crate::types::{
    Domain, DomainId, ExtensionInfo, Motion, MotionId, ReputationProof, SkillId, StakeFractions, Vote, REVEAL_END,
    ROOT_DOMAIN, STAKE_END, SUBMIT_END,
};

const UNKNOWN_CONTRACT: &str = "ledger-unknown-contract";
const UNKNOWN_METHOD: &str = "ledger-unknown-method";
const MOTION_DOES_NOT_EXIST: &str = "voting-rep-motion-does-not-exist";
const INSUFFICIENT_STAKE: &str = "voting-rep-insufficient-stake";
const INSUFFICIENT_DEPOSIT: &str = "colony-token-locking-insufficient-deposit";
const INSUFFICIENT_APPROVAL: &str = "colony-insufficient-approval";
const DOMAIN_DOES_NOT_EXIST: &str = "colony-domain-does-not-exist";
const VALUE_OUT_OF_RANGE: &str = "ledger-value-out-of-range";

/// Lengths of the three motion windows in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Periods {
    pub staking: u64,
    pub submit: u64,
    pub reveal: u64,
}

impl Default for Periods {
    fn default() -> Self {
        Self {
            staking: 3600,
            submit: 3600,
            reveal: 3600,
        }
    }
}

/// A vote commitment and the reputation behind it
#[derive(Debug, Clone)]
struct Commitment {
    hash: Option<Hash>,
    weight: Amount,
}

#[derive(Debug, Clone)]
struct MotionRecord {
    motion: Motion,
    stakes: HashMap<(Address, Vote), Amount>,
    /// `hash` is cleared once revealed
    commitments: HashMap<Address, Commitment>,
}

#[derive(Debug, Clone, Default)]
struct LedgerState {
    extensions: HashMap<String, ExtensionInfo>,
    domains: HashMap<DomainId, Domain>,
    motions: Vec<MotionRecord>,
    deposits: HashMap<Address, Amount>,
    token_approvals: HashMap<(Address, Address), Amount>,
    stake_approvals: HashMap<(Address, Address, DomainId), Amount>,
    reputation: HashMap<(SkillId, Address), Amount>,
    executed_actions: Vec<MotionId>,
    block_number: u64,
    oracle_offline: bool,
}

impl LedgerState {
    fn record_mut(&mut self, motion_id: MotionId) -> ChainResult<&mut MotionRecord> {
        motion_id.checked_sub(1)
            .and_then(|index| self.motions.get_mut(index as usize))
            .ok_or_else(|| revert(MOTION_DOES_NOT_EXIST))
    }
}

fn revert(reason: &str) -> ChainError {
    ChainError::Reverted(reason.to_string())
}

/// Integer argument `index` narrowed to `T`
fn uint_arg<T: TryFrom<Amount>>(call: &ContractCall, index: usize) -> ChainResult<T> {
    T::try_from(call.uint(index)?).map_err(|_| revert(VALUE_OUT_OF_RANGE))
}

fn vote_arg(call: &ContractCall, index: usize) -> ChainResult<Vote> {
    Vote::try_from(uint_arg::<u8>(call, index)?).map_err(ChainError::Reverted)
}

fn debit(balance: &mut Amount, amount: Amount, reason: &str) -> ChainResult<()> {
    *balance = balance.checked_sub(amount).ok_or_else(|| revert(reason))?;
    Ok(())
}

fn proof_blob(skill_id: SkillId, user: &Address, root_hash: &Hash) -> Vec<u8> {
    let mut preimage = skill_id.to_be_bytes().to_vec();
    preimage.extend_from_slice(user.as_str().as_bytes());
    preimage.extend_from_slice(root_hash.as_bytes());
    sha256(&preimage).0
}

/// In-memory ledger for one organization with one motions module
#[derive(Clone)]
pub struct InMemoryLedger {
    colony: Address,
    token: Address,
    module: Address,
    fractions: StakeFractions,
    periods: Periods,
    clock: Arc<dyn Clock>,
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    /// Create a ledger with a root team backed by skill 1
    pub fn new(colony: Address, token: Address, module: Address, fractions: StakeFractions, clock: Arc<dyn Clock>) -> Self {
        let mut state = LedgerState::default();
        state.domains.insert(ROOT_DOMAIN, Domain { id: ROOT_DOMAIN, skill_id: 1 });

        Self {
            colony,
            token,
            module,
            fractions,
            periods: Periods::default(),
            clock,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Use `periods` for the windows of motions created from now on
    pub fn with_periods(mut self, periods: Periods) -> Self {
        self.periods = periods;
        self
    }

    pub fn colony(&self) -> &Address {
        &self.colony
    }

    pub fn token(&self) -> &Address {
        &self.token
    }

    pub fn module(&self) -> &Address {
        &self.module
    }

    fn state_machine(&self) -> MotionStateMachine {
        MotionStateMachine::new(StakeThresholdCalculator::new(self.fractions))
    }

    /// Register the motions module under `name`
    pub async fn install_extension(&self, name: &str, version: u32) {
        let mut state = self.state.write().await;
        state.extensions.insert(name.to_string(), ExtensionInfo { address: self.module.clone(), version });
    }

    pub async fn add_domain(&self, domain_id: DomainId, skill_id: SkillId) {
        let mut state = self.state.write().await;
        state.domains.insert(domain_id, Domain { id: domain_id, skill_id });
    }

    pub async fn set_deposit(&self, user: &Address, amount: Amount) {
        self.state.write().await.deposits.insert(user.clone(), amount);
    }

    pub async fn set_token_approval(&self, user: &Address, obligator: &Address, amount: Amount) {
        self.state.write().await.token_approvals.insert((user.clone(), obligator.clone()), amount);
    }

    pub async fn set_reputation(&self, skill_id: SkillId, user: &Address, amount: Amount) {
        self.state.write().await.reputation.insert((skill_id, user.clone()), amount);
    }

    /// Make every proof request fail as if the oracle were unreachable
    pub async fn set_oracle_offline(&self, offline: bool) {
        self.state.write().await.oracle_offline = offline;
    }

    /// Create a motion in `domain_id`, with its windows starting now
    pub async fn create_motion(&self, domain_id: DomainId, skill_rep: Amount, action: Vec<u8>) -> ChainResult<MotionId> {
        let now = self.clock.now_secs();
        let mut state = self.state.write().await;

        let skill_id = state.domains.get(&domain_id)
            .map(|domain| domain.skill_id)
            .ok_or_else(|| revert(DOMAIN_DOES_NOT_EXIST))?;

        let id = state.motions.len() as MotionId + 1;
        let stake_end = now + self.periods.staking;
        let motion = Motion {
            id,
            domain_id,
            skill_id,
            root_hash: sha256(format!("reputation-root:{}", id).as_bytes()),
            skill_rep,
            rep_submitted: 0,
            stakes: [0, 0],
            votes: [0, 0],
            events: [
                stake_end,
                stake_end + self.periods.submit,
                stake_end + self.periods.submit + self.periods.reveal,
            ],
            escalated: false,
            finalized: false,
            alt_target: self.colony.clone(),
            action,
        };

        state.motions.push(MotionRecord { motion, stakes: HashMap::new(), commitments: HashMap::new() });
        debug!("Created motion {} in team {}", id, domain_id);
        Ok(id)
    }

    /// Amount `user` staked on `side` of a motion
    pub async fn user_stake(&self, motion_id: MotionId, user: &Address, side: Vote) -> Amount {
        let state = self.state.read().await;
        motion_id.checked_sub(1)
            .and_then(|index| state.motions.get(index as usize))
            .and_then(|record| record.stakes.get(&(user.clone(), side)).copied())
            .unwrap_or(0)
    }

    /// Motions whose action ran on finalization
    pub async fn executed_actions(&self) -> Vec<MotionId> {
        self.state.read().await.executed_actions.clone()
    }

    fn apply(&self, state: &mut LedgerState, call: &ContractCall, now: Timestamp) -> ChainResult<Vec<ChainEvent>> {
        if call.contract == self.colony {
            return match call.method.as_str() {
                calls::APPROVE_STAKE => self.apply_approve_stake(state, call),
                _ => Err(revert(UNKNOWN_METHOD)),
            };
        }
        if call.contract != self.module {
            return Err(revert(UNKNOWN_CONTRACT));
        }

        let motion_id: MotionId = uint_arg(call, 0)?;
        match call.method.as_str() {
            calls::STAKE_MOTION => self.apply_stake(state, call, motion_id, now),
            calls::SUBMIT_VOTE => self.apply_submit(state, call, motion_id, now),
            calls::REVEAL_VOTE => self.apply_reveal(state, call, motion_id, now),
            calls::FINALIZE_MOTION => self.apply_finalize(state, motion_id, now),
            _ => Err(revert(UNKNOWN_METHOD)),
        }
    }

    fn apply_approve_stake(&self, state: &mut LedgerState, call: &ContractCall) -> ChainResult<Vec<ChainEvent>> {
        let obligator = call.address(0)?.clone();
        let domain_id: DomainId = uint_arg(call, 1)?;
        let amount = call.uint(2)?;

        if !state.domains.contains_key(&domain_id) {
            return Err(revert(DOMAIN_DOES_NOT_EXIST));
        }

        let key = (call.caller.clone(), obligator.clone(), domain_id);
        let approval = state.stake_approvals.entry(key).or_insert(0);
        *approval = approval.saturating_add(amount);

        Ok(vec![ChainEvent::new(UserTokenApproved::NAME)
            .with("token", self.token.to_string())
            .with("user", call.caller.to_string())
            .with("obligator", obligator.to_string())
            .with("domainId", domain_id)
            .with("amount", amount.to_string())])
    }

    fn apply_stake(
        &self,
        state: &mut LedgerState,
        call: &ContractCall,
        motion_id: MotionId,
        now: Timestamp,
    ) -> ChainResult<Vec<ChainEvent>> {
        let side = vote_arg(call, 1)?;
        let amount = call.uint(2)?;
        let staker = call.caller.clone();
        let thresholds = StakeThresholdCalculator::new(self.fractions);
        let machine = self.state_machine();

        let domain_id = {
            let record = state.record_mut(motion_id)?;
            let motion = &record.motion;
            if machine.derive(motion, now) != MotionState::Staking {
                return Err(revert(RevertReason::MOTION_NOT_STAKING));
            }
            if amount > thresholds.remaining_stakes(motion).for_side(side) {
                return Err(revert(RevertReason::STAKE_TOO_LARGE));
            }
            if amount < thresholds.min_stake(motion, side) {
                return Err(revert(INSUFFICIENT_STAKE));
            }
            motion.domain_id
        };

        let deposit = state.deposits.entry(staker.clone()).or_insert(0);
        debit(deposit, amount, INSUFFICIENT_DEPOSIT)?;
        let approval = state.token_approvals.entry((staker.clone(), self.colony.clone())).or_insert(0);
        debit(approval, amount, INSUFFICIENT_APPROVAL)?;
        let approval = state.stake_approvals.entry((staker.clone(), self.module.clone(), domain_id)).or_insert(0);
        debit(approval, amount, INSUFFICIENT_APPROVAL)?;

        let record = state.record_mut(motion_id)?;
        let total = &mut record.motion.stakes[side.index()];
        *total = total.saturating_add(amount);
        let user_stake = record.stakes.entry((staker.clone(), side)).or_insert(0);
        *user_stake = user_stake.saturating_add(amount);

        let mut events = vec![ChainEvent::new(MotionStaked::NAME)
            .with("motionId", motion_id)
            .with("staker", staker.to_string())
            .with("vote", side.tag())
            .with("amount", amount.to_string())];

        // Yay activation closes staking and opens voting right away
        if side == Vote::Yay && thresholds.is_activated(&record.motion, Vote::Yay) {
            let motion = &mut record.motion;
            motion.events[STAKE_END] = now;
            motion.events[SUBMIT_END] = now + self.periods.submit;
            motion.events[REVEAL_END] = now + self.periods.submit + self.periods.reveal;
            events.push(event_set(motion_id, STAKE_END));
        }

        Ok(events)
    }

    fn verify_proof(&self, state: &LedgerState, motion: &Motion, caller: &Address, proof: &ReputationProof) -> ChainResult<()> {
        let expected = state.reputation.get(&(motion.skill_id, caller.clone())).copied();
        let blob = proof_blob(motion.skill_id, caller, &motion.root_hash);
        if expected != Some(proof.weight) || proof.blob != blob || proof.weight == 0 {
            return Err(revert(RevertReason::INVALID_PROOF));
        }
        Ok(())
    }

    fn apply_submit(
        &self,
        state: &mut LedgerState,
        call: &ContractCall,
        motion_id: MotionId,
        now: Timestamp,
    ) -> ChainResult<Vec<ChainEvent>> {
        let commitment = Hash(call.bytes(1)?.to_vec());
        let proof = call.proof(2)?.clone();
        let voter = call.caller.clone();
        let machine = self.state_machine();

        let motion = state.record_mut(motion_id)?.motion.clone();
        if machine.derive(&motion, now) != MotionState::Submit {
            return Err(revert(RevertReason::MOTION_NOT_OPEN));
        }
        self.verify_proof(state, &motion, &voter, &proof)?;

        let record = state.record_mut(motion_id)?;
        // Resubmitting replaces the commitment without counting reputation twice
        if !record.commitments.contains_key(&voter) {
            record.motion.rep_submitted = record.motion.rep_submitted.saturating_add(proof.weight);
        }
        record.commitments.insert(voter.clone(), Commitment { hash: Some(commitment), weight: proof.weight });

        Ok(vec![ChainEvent::new(MotionVoteSubmitted::NAME)
            .with("motionId", motion_id)
            .with("voter", voter.to_string())])
    }

    fn apply_reveal(
        &self,
        state: &mut LedgerState,
        call: &ContractCall,
        motion_id: MotionId,
        now: Timestamp,
    ) -> ChainResult<Vec<ChainEvent>> {
        let salt = Hash(call.bytes(1)?.to_vec());
        let side = vote_arg(call, 2)?;
        let proof = call.proof(3)?.clone();
        let voter = call.caller.clone();
        let machine = self.state_machine();

        let (motion, commitment) = {
            let record = state.record_mut(motion_id)?;
            (record.motion.clone(), record.commitments.get(&voter).cloned())
        };
        if machine.derive(&motion, now) != MotionState::Reveal {
            return Err(revert(RevertReason::MOTION_NOT_REVEAL));
        }
        let commitment = commitment.ok_or_else(|| revert(RevertReason::NOTHING_TO_REVEAL))?;
        let opens = commitment.hash.as_ref()
            .map(|hash| VoteCommitmentCodec::verify(hash, &salt, side))
            .unwrap_or(false);
        if !opens {
            return Err(revert(RevertReason::SECRET_NO_MATCH));
        }
        self.verify_proof(state, &motion, &voter, &proof)?;

        let record = state.record_mut(motion_id)?;
        record.commitments.insert(voter.clone(), Commitment { hash: None, weight: commitment.weight });
        let tally = &mut record.motion.votes[side.index()];
        *tally = tally.saturating_add(commitment.weight);

        let mut events = vec![ChainEvent::new(MotionVoteRevealed::NAME)
            .with("motionId", motion_id)
            .with("voter", voter.to_string())
            .with("vote", side.tag())];

        let motion = &mut record.motion;
        if motion.rep_revealed() >= motion.rep_submitted {
            motion.events[REVEAL_END] = now;
            events.push(event_set(motion_id, REVEAL_END));
        }

        Ok(events)
    }

    fn apply_finalize(&self, state: &mut LedgerState, motion_id: MotionId, now: Timestamp) -> ChainResult<Vec<ChainEvent>> {
        let machine = self.state_machine();
        let record = state.record_mut(motion_id)?;

        let current = machine.derive(&record.motion, now);
        if current != MotionState::Finalizable {
            return Err(revert(RevertReason::MOTION_NOT_FINALIZABLE));
        }
        MotionStateMachine::validate_transition(current, MotionState::Finalized)
            .map_err(|e| ChainError::Reverted(e.to_string()))?;

        let motion = &mut record.motion;
        motion.finalized = true;
        let executed = motion.prevailing_side() == Vote::Yay;
        let action = format!("0x{}", hex::encode(&motion.action));
        if executed {
            state.executed_actions.push(motion_id);
        }

        Ok(vec![ChainEvent::new(MotionFinalized::NAME)
            .with("motionId", motion_id)
            .with("action", action)
            .with("executed", executed)])
    }
}

fn event_set(motion_id: MotionId, index: usize) -> ChainEvent {
    ChainEvent::new(MotionEventSet::NAME)
        .with("motionId", motion_id)
        .with("eventIndex", index as u64)
}

#[async_trait]
impl ChainExecutor for InMemoryLedger {
    async fn execute(&self, call: ContractCall) -> ChainResult<TransactionReceipt> {
        let now = self.clock.now_secs();
        let mut state = self.state.write().await;

        let mut next = state.clone();
        let events = self.apply(&mut next, &call, now)?;
        next.block_number += 1;
        let block_number = next.block_number;
        *state = next;

        debug!("{} by {} mined in block {}", call.method, call.caller, block_number);
        Ok(TransactionReceipt {
            tx_hash: sha256(format!("{}:{}:{}", block_number, call.method, call.caller).as_bytes()),
            block_number,
            events,
        })
    }

    async fn simulate(&self, call: ContractCall) -> ChainResult<()> {
        let now = self.clock.now_secs();
        let mut scratch = self.state.read().await.clone();
        self.apply(&mut scratch, &call, now).map(|_| ())
    }

    async fn installed_extension(&self, colony: &Address, name: &str) -> ChainResult<Option<ExtensionInfo>> {
        if *colony != self.colony {
            return Ok(None);
        }
        Ok(self.state.read().await.extensions.get(name).cloned())
    }

    async fn motion_count(&self, _module: &Address) -> ChainResult<u64> {
        Ok(self.state.read().await.motions.len() as u64)
    }

    async fn get_motion(&self, _module: &Address, motion_id: MotionId) -> ChainResult<Option<Motion>> {
        let state = self.state.read().await;
        Ok(motion_id.checked_sub(1)
            .and_then(|index| state.motions.get(index as usize))
            .map(|record| record.motion.clone()))
    }

    async fn motion_state(&self, module: &Address, motion_id: MotionId) -> ChainResult<MotionState> {
        let now = self.clock.now_secs();
        Ok(match self.get_motion(module, motion_id).await? {
            Some(motion) => self.state_machine().derive(&motion, now),
            None => MotionState::NonExistent,
        })
    }

    async fn stake_fractions(&self, _module: &Address) -> ChainResult<StakeFractions> {
        Ok(self.fractions)
    }

    async fn domain(&self, colony: &Address, domain_id: DomainId) -> ChainResult<Option<Domain>> {
        if *colony != self.colony {
            return Ok(None);
        }
        Ok(self.state.read().await.domains.get(&domain_id).cloned())
    }

    async fn stake_approval(
        &self,
        _colony: &Address,
        user: &Address,
        obligator: &Address,
        domain_id: DomainId,
    ) -> ChainResult<Amount> {
        let state = self.state.read().await;
        let key = (user.clone(), obligator.clone(), domain_id);
        Ok(state.stake_approvals.get(&key).copied().unwrap_or(0))
    }
}

#[async_trait]
impl TokenLedger for InMemoryLedger {
    async fn deposited(&self, _token: &Address, user: &Address) -> ChainResult<Amount> {
        Ok(self.state.read().await.deposits.get(user).copied().unwrap_or(0))
    }

    async fn approved(&self, _token: &Address, user: &Address, obligator: &Address) -> ChainResult<Amount> {
        let state = self.state.read().await;
        Ok(state.token_approvals.get(&(user.clone(), obligator.clone())).copied().unwrap_or(0))
    }
}

#[async_trait]
impl ReputationOracle for InMemoryLedger {
    async fn reputation_proof(
        &self,
        skill_id: SkillId,
        user: &Address,
        root_hash: &Hash,
    ) -> Result<ReputationProof, OracleError> {
        let state = self.state.read().await;
        if state.oracle_offline {
            return Err(OracleError::Unavailable("reputation oracle offline".to_string()));
        }

        let weight = state.reputation.get(&(skill_id, user.clone())).copied()
            .filter(|weight| *weight > 0)
            .ok_or_else(|| OracleError::NoReputation { skill_id, user: user.clone() })?;

        Ok(ReputationProof { blob: proof_blob(skill_id, user, root_hash), weight })
    }
}
