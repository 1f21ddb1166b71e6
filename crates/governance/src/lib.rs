//! Governance module for motions
//!
//! This module provides stake-gated, reputation-weighted motions: stake
//! thresholds, commit-reveal vote hiding, phase derivation and the
//! coordinator that drives a motion from staking to finalization.

pub mod calls;
pub mod commitment;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod interfaces;
pub mod memory;
pub mod organization;
pub mod state_machine;
pub mod thresholds;
pub mod types;

pub use commitment::VoteCommitmentCodec;
pub use coordinator::{MotionLifecycleCoordinator, StakeEvents};
pub use error::{GovernanceError, GovernanceResult, RevertReason};
pub use interfaces::{
    ChainError, ChainExecutor, Clock, Collaborators, ContractCall, ManualClock, OracleError, ReputationOracle,
    Signer, SystemClock, TokenLedger, TransactionReceipt,
};
pub use memory::{InMemoryLedger, Periods};
pub use organization::Organization;
pub use state_machine::{MotionState, MotionStateMachine, Operation};
pub use thresholds::{StakeThresholdCalculator, SCALE};
pub use types::{Motion, MotionId, RemainingStakes, StakeFractions, Vote, ROOT_DOMAIN};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use motions_core::{Address, Amount, Hash, KeyPairWrapper, MotionsConfig};

    use crate::calls;
    use crate::coordinator::MotionLifecycleCoordinator;
    use crate::interfaces::{ChainExecutor, Collaborators, ManualClock, Signer};
    use crate::memory::InMemoryLedger;
    use crate::thresholds::SCALE;
    use crate::types::{Motion, StakeFractions, ROOT_DOMAIN};

    /// Motion 1 in team 1 with 1000 skill reputation and windows ending at 100/200/300
    pub fn motion_with(stakes: [Amount; 2], votes: [Amount; 2]) -> Motion {
        Motion {
            id: 1,
            domain_id: 1,
            skill_id: 2,
            root_hash: Hash(vec![0xab; 32]),
            skill_rep: 1000,
            rep_submitted: 0,
            stakes,
            votes,
            events: [100, 200, 300],
            escalated: false,
            finalized: false,
            alt_target: Address::zero(),
            action: vec![],
        }
    }

    pub fn address(byte: char) -> Address {
        let body: String = std::iter::repeat(byte).take(40).collect();
        Address::parse(&format!("0x{}", body)).unwrap()
    }

    /// An in-memory organization at time 1000 with fractions 0.5 and 0.1
    pub struct Fixture {
        pub ledger: InMemoryLedger,
        pub clock: Arc<ManualClock>,
        pub signer: Arc<KeyPairWrapper>,
        pub fractions: StakeFractions,
    }

    impl Fixture {
        pub fn new() -> Self {
            let clock = Arc::new(ManualClock::new(1_000));
            let fractions = StakeFractions {
                total_stake_fraction: SCALE / 2,
                user_min_stake_fraction: SCALE / 10,
            };
            let ledger = InMemoryLedger::new(address('1'), address('2'), address('3'), fractions, clock.clone());

            Self {
                ledger,
                clock,
                signer: Arc::new(KeyPairWrapper::from_seed(&[1u8; 32]).unwrap()),
                fractions,
            }
        }

        pub fn config(&self) -> MotionsConfig {
            let mut config = MotionsConfig::default();
            config.network.colony_address = self.ledger.colony().clone();
            config.network.token_address = self.ledger.token().clone();
            config
        }

        pub fn collaborators_for(&self, signer: Arc<KeyPairWrapper>) -> Collaborators {
            let ledger = Arc::new(self.ledger.clone());
            Collaborators {
                executor: ledger.clone(),
                tokens: ledger.clone(),
                oracle: ledger,
                signer,
                clock: self.clock.clone(),
            }
        }

        pub fn collaborators(&self) -> Collaborators {
            self.collaborators_for(self.signer.clone())
        }

        pub fn coordinator(&self) -> MotionLifecycleCoordinator {
            MotionLifecycleCoordinator::new(
                self.ledger.colony().clone(),
                self.ledger.token().clone(),
                self.ledger.module().clone(),
                self.fractions,
                self.collaborators(),
            )
        }

        pub fn user(&self) -> Address {
            self.signer.address()
        }

        /// Deposit and approve `amount` for staking in the root team
        pub async fn fund(&self, user: &Address, amount: Amount) {
            self.ledger.set_deposit(user, amount).await;
            self.ledger.set_token_approval(user, self.ledger.colony(), amount).await;
            let call = calls::approve_stake(self.ledger.colony(), user, self.ledger.module(), ROOT_DOMAIN, amount);
            self.ledger.execute(call).await.unwrap();
        }
    }
}
