use std::sync::Arc;

use tokio_test::{assert_err, assert_ok};

use motions::core::utils::ONE_TOKEN;
use motions::core::{Address, Amount, KeyPairWrapper};
use motions::governance::{
    Clock, Collaborators, GovernanceError, InMemoryLedger, ManualClock, MotionLifecycleCoordinator, MotionState,
    Operation, Periods, RevertReason, Signer, StakeFractions, TokenLedger, Vote, ROOT_DOMAIN, SCALE,
};

const T: Amount = ONE_TOKEN;
const START: u64 = 1_000;
const WINDOW: u64 = 600;

fn address(byte: char) -> Address {
    let body: String = std::iter::repeat(byte).take(40).collect();
    Address::parse(&format!("0x{}", body)).unwrap()
}

fn member(seed: u8) -> Arc<KeyPairWrapper> {
    Arc::new(KeyPairWrapper::from_seed(&[seed; 32]).unwrap())
}

/// An organization with a motions module, fractions 0.5 and 0.1 and ten-minute windows
struct Org {
    ledger: InMemoryLedger,
    clock: Arc<ManualClock>,
    fractions: StakeFractions,
}

impl Org {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::new(START));
        let fractions = StakeFractions {
            total_stake_fraction: SCALE / 2,
            user_min_stake_fraction: SCALE / 10,
        };
        let ledger = InMemoryLedger::new(address('a'), address('b'), address('c'), fractions, clock.clone())
            .with_periods(Periods { staking: WINDOW, submit: WINDOW, reveal: WINDOW });
        Self { ledger, clock, fractions }
    }

    fn coordinator(&self, signer: Arc<KeyPairWrapper>) -> MotionLifecycleCoordinator {
        let ledger = Arc::new(self.ledger.clone());
        let collaborators = Collaborators {
            executor: ledger.clone(),
            tokens: ledger.clone(),
            oracle: ledger,
            signer,
            clock: self.clock.clone(),
        };
        MotionLifecycleCoordinator::new(
            self.ledger.colony().clone(),
            self.ledger.token().clone(),
            self.ledger.module().clone(),
            self.fractions,
            collaborators,
        )
    }

    /// A member with `amount` deposited and approved for staking, and `reputation` in the root skill
    async fn join(&self, seed: u8, amount: Amount, reputation: Amount) -> (Address, MotionLifecycleCoordinator) {
        let signer = member(seed);
        let user = signer.address();
        let coordinator = self.coordinator(signer);

        self.ledger.set_deposit(&user, amount).await;
        self.ledger.set_token_approval(&user, self.ledger.colony(), amount).await;
        self.ledger.set_reputation(1, &user, reputation).await;
        if amount > 0 {
            coordinator.approve_stake(amount, None).await.unwrap();
        }
        (user, coordinator)
    }

    async fn motion(&self) -> u64 {
        self.ledger.create_motion(ROOT_DOMAIN, 1_000 * T, b"mint 100".to_vec()).await.unwrap()
    }
}

#[tokio::test]
async fn test_full_lifecycle_yay_prevails() {
    let org = Org::new();
    let id = org.motion().await;
    let (_, alice) = org.join(1, 1_000 * T, 300 * T).await;
    let (_, bob) = org.join(2, 0, 200 * T).await;
    let (_, carol) = org.join(3, 0, 100 * T).await;

    let (staked, _) = assert_ok!(alice.stake(id, Vote::Yay, 500 * T).await);
    assert!(staked.event_set.is_some());
    assert_eq!(alice.get_motion_state(id).await.unwrap(), MotionState::Submit);

    assert_ok!(alice.submit_vote(id, Vote::Yay).await);
    assert_ok!(bob.submit_vote(id, Vote::Nay).await);
    assert_ok!(carol.submit_vote(id, Vote::Yay).await);

    let motion = alice.get_motion(id).await.unwrap();
    assert_eq!(motion.rep_submitted, 600 * T);
    assert_eq!(motion.votes, [0, 0]);

    org.clock.set(motion.events[1]);
    assert_eq!(alice.get_motion_state(id).await.unwrap(), MotionState::Reveal);

    let (revealed, _) = assert_ok!(alice.reveal_vote(id, Some(Vote::Yay)).await);
    assert_eq!(revealed.vote, Vote::Yay);

    // Side discovery finds the committed side
    let (revealed, _) = assert_ok!(bob.reveal_vote(id, None).await);
    assert_eq!(revealed.vote, Vote::Nay);
    assert_eq!(alice.get_motion_state(id).await.unwrap(), MotionState::Reveal);

    // A fresh coordinator re-derives the same salt
    let carol_again = org.coordinator(member(3));
    drop(carol);
    assert_ok!(carol_again.reveal_vote(id, Some(Vote::Yay)).await);

    // Everyone revealed, so reveal ends early
    assert_eq!(alice.get_motion_state(id).await.unwrap(), MotionState::Finalizable);

    let (finalized, _) = assert_ok!(alice.finalize(id).await);
    assert!(finalized.executed);
    assert_eq!(finalized.action, format!("0x{}", hex::encode(b"mint 100")));
    assert_eq!(org.ledger.executed_actions().await, vec![id]);

    let motion = alice.get_motion(id).await.unwrap();
    assert!(motion.finalized);
    assert_eq!(motion.votes, [200 * T, 400 * T]);

    let err = assert_err!(alice.finalize(id).await);
    assert!(matches!(err, GovernanceError::InvalidPhase { found: MotionState::Finalized, .. }));
}

#[tokio::test]
async fn test_min_stake_reference_scenario() {
    let org = Org::new();
    let id = org.motion().await;
    let (_, alice) = org.join(1, 1_000 * T, 0).await;

    assert_ok!(alice.stake(id, Vote::Nay, 480 * T).await);

    assert_eq!(alice.get_min_stake(id, Vote::Nay).await.unwrap(), 20 * T);
    let remaining = alice.get_remaining_stakes(id).await.unwrap();
    assert_eq!(remaining.nay, 20 * T);
    assert_eq!(remaining.yay, 500 * T);

    let err = assert_err!(alice.stake(id, Vote::Nay, 10 * T).await);
    assert_eq!(err.to_string(), "The staked amount is too small. Please stake at least 20.0");
}

#[tokio::test]
async fn test_yay_activation_skips_rest_of_staking() {
    let org = Org::new();
    let id = org.motion().await;
    let (_, alice) = org.join(1, 1_000 * T, 0).await;

    assert_ok!(alice.stake(id, Vote::Nay, 100 * T).await);
    assert_eq!(alice.get_motion_state(id).await.unwrap(), MotionState::Staking);

    assert_ok!(alice.stake(id, Vote::Yay, 500 * T).await);
    assert!(org.clock.now_secs() < START + WINDOW);
    assert_eq!(alice.get_motion_state(id).await.unwrap(), MotionState::Submit);

    // Staking is over for both sides
    let err = assert_err!(alice.stake(id, Vote::Nay, 50 * T).await);
    assert!(matches!(err, GovernanceError::StakingWindowClosed { .. }));
}

#[tokio::test]
async fn test_nay_only_activation_rejects_without_votes() {
    let org = Org::new();
    let id = org.motion().await;
    let (_, alice) = org.join(1, 1_000 * T, 0).await;

    assert_ok!(alice.stake(id, Vote::Nay, 500 * T).await);
    assert_eq!(alice.get_motion_state(id).await.unwrap(), MotionState::Staking);

    org.clock.set(START + WINDOW);
    assert_eq!(alice.get_motion_state(id).await.unwrap(), MotionState::Submit);

    org.clock.set(START + 2 * WINDOW);
    assert_eq!(alice.get_motion_state(id).await.unwrap(), MotionState::Reveal);

    org.clock.set(START + 3 * WINDOW);
    let (finalized, _) = assert_ok!(alice.finalize(id).await);
    assert!(!finalized.executed);
    assert!(org.ledger.executed_actions().await.is_empty());
}

#[tokio::test]
async fn test_no_contest_motion_fails() {
    let org = Org::new();
    let id = org.motion().await;
    let (_, alice) = org.join(1, 1_000 * T, 0).await;

    assert_ok!(alice.stake(id, Vote::Yay, 100 * T).await);
    let before = alice.get_motion(id).await.unwrap();

    org.clock.set(START + WINDOW);
    assert_eq!(alice.get_motion_state(id).await.unwrap(), MotionState::Failed);

    let err = assert_err!(alice.stake(id, Vote::Yay, 100 * T).await);
    assert!(matches!(err, GovernanceError::StakingWindowClosed { ended_at, .. } if ended_at == START + WINDOW));

    let err = assert_err!(alice.finalize(id).await);
    assert!(matches!(
        err,
        GovernanceError::InvalidPhase { operation: Operation::Finalize, found: MotionState::Failed, .. }
    ));

    // Still queryable and untouched
    assert_eq!(alice.get_motion(id).await.unwrap(), before);
}

#[tokio::test]
async fn test_wrong_side_reveal_and_discovery() {
    let org = Org::new();
    let id = org.motion().await;
    let (_, alice) = org.join(1, 1_000 * T, 300 * T).await;
    let (_, bob) = org.join(2, 0, 200 * T).await;
    let (carol_address, carol) = org.join(3, 0, 100 * T).await;

    assert_ok!(alice.stake(id, Vote::Yay, 500 * T).await);
    assert_ok!(alice.submit_vote(id, Vote::Nay).await);
    assert_ok!(bob.submit_vote(id, Vote::Yay).await);

    org.clock.set(START + WINDOW);

    let err = assert_err!(alice.reveal_vote(id, Some(Vote::Yay)).await);
    assert!(err.is_commitment_mismatch());
    assert!(matches!(err, GovernanceError::RevertedOnChain(RevertReason::CommitmentMismatch)));

    let (revealed, _) = assert_ok!(alice.reveal_vote(id, None).await);
    assert_eq!(revealed.vote, Vote::Nay);

    // Already revealed: neither side opens the commitment any more
    let err = assert_err!(alice.reveal_vote(id, None).await);
    assert!(matches!(err, GovernanceError::VoteNotFound { motion_id, .. } if motion_id == id));

    // Never voted
    let err = assert_err!(carol.reveal_vote(id, None).await);
    match err {
        GovernanceError::VoteNotFound { voter, .. } => assert_eq!(voter, carol_address),
        other => panic!("unexpected error: {:?}", other),
    }

    // Bob has not revealed, so the reveal window is still open
    let err = assert_err!(alice.finalize(id).await);
    assert!(matches!(
        err,
        GovernanceError::InvalidPhase { expected: MotionState::Finalizable, found: MotionState::Reveal, .. }
    ));
}

#[tokio::test]
async fn test_ledger_rejection_after_local_checks() {
    let org = Org::new();
    let id = org.motion().await;
    let (_, alice) = org.join(1, 1_000 * T, 0).await;
    let (bob_address, bob) = org.join(2, 1_000 * T, 0).await;

    assert_ok!(alice.stake(id, Vote::Yay, 450 * T).await);

    // 100 clears the local minimum of 50 but exceeds the 50 Yay still needs
    assert_eq!(bob.get_min_stake(id, Vote::Yay).await.unwrap(), 50 * T);
    let err = assert_err!(bob.stake(id, Vote::Yay, 100 * T).await);
    assert!(matches!(err, GovernanceError::RevertedOnChain(RevertReason::StakeTooLarge)));

    // Nothing was taken from bob
    let deposited = org.ledger.deposited(org.ledger.token(), &bob_address).await.unwrap();
    assert_eq!(deposited, 1_000 * T);
    assert_eq!(org.ledger.user_stake(id, &bob_address, Vote::Yay).await, 0);
}

#[tokio::test]
async fn test_stakes_never_decrease() {
    let org = Org::new();
    let id = org.motion().await;
    let (_, alice) = org.join(1, 1_000 * T, 0).await;
    let (_, bob) = org.join(2, 60 * T, 0).await;

    let attempts = [
        (&alice, Vote::Nay, 100 * T),
        (&bob, Vote::Yay, 60 * T),
        (&bob, Vote::Yay, 60 * T),
        (&alice, Vote::Yay, 10 * T),
        (&alice, Vote::Nay, 400 * T),
        (&alice, Vote::Yay, 440 * T),
    ];

    let mut last = alice.get_motion(id).await.unwrap().stakes;
    for (coordinator, side, amount) in attempts {
        let _ = coordinator.stake(id, side, amount).await;
        let stakes = alice.get_motion(id).await.unwrap().stakes;
        assert!(stakes[0] >= last[0] && stakes[1] >= last[1]);
        last = stakes;
    }

    assert_eq!(last, [500 * T, 500 * T]);
    assert_eq!(alice.get_motion_state(id).await.unwrap(), MotionState::Submit);
}

#[tokio::test]
async fn test_oracle_unavailable() {
    let org = Org::new();
    let id = org.motion().await;
    let (_, alice) = org.join(1, 1_000 * T, 300 * T).await;
    let (_, dave) = org.join(4, 0, 0).await;

    assert_ok!(alice.stake(id, Vote::Yay, 500 * T).await);

    let err = assert_err!(dave.submit_vote(id, Vote::Yay).await);
    assert!(matches!(err, GovernanceError::OracleUnavailable(_)));

    org.ledger.set_oracle_offline(true).await;
    let err = assert_err!(alice.submit_vote(id, Vote::Yay).await);
    assert!(matches!(err, GovernanceError::OracleUnavailable(_)));

    org.ledger.set_oracle_offline(false).await;
    assert_ok!(alice.submit_vote(id, Vote::Yay).await);
}

#[tokio::test]
async fn test_unknown_motion() {
    let org = Org::new();
    let (_, alice) = org.join(1, 1_000 * T, 0).await;

    let err = assert_err!(alice.stake(1, Vote::Yay, 50 * T).await);
    assert!(matches!(err, GovernanceError::NotFound(_)));
    let err = assert_err!(alice.submit_vote(7, Vote::Yay).await);
    assert!(matches!(err, GovernanceError::NotFound(_)));
    let err = assert_err!(alice.get_remaining_stakes(0).await);
    assert!(matches!(err, GovernanceError::NotFound(_)));
}
