//! Motion phases
//!
//! The phase of a motion is never stored. It is derived from the motion's
//! flags, its event timestamps and its stake levels at a given moment.

use std::fmt;

use tracing::debug;

use motions_core::Timestamp;

use crate::error::{GovernanceError, GovernanceResult};
use crate::thresholds::StakeThresholdCalculator;
use crate::types::{Motion, Vote, REVEAL_END, STAKE_END, SUBMIT_END};

/// Operational phase of a motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionState {
    NonExistent,
    Staking,
    Submit,
    Reveal,
    Escalated,
    Finalizable,
    Finalized,
    /// Staking window elapsed without either side activating
    Failed,
}

impl MotionState {
    /// Numeric code the ledger reports this phase with
    pub fn code(self) -> u8 {
        match self {
            MotionState::NonExistent => 0,
            MotionState::Staking => 1,
            MotionState::Submit => 2,
            MotionState::Reveal => 3,
            MotionState::Escalated => 4,
            MotionState::Finalizable => 5,
            MotionState::Finalized => 6,
            MotionState::Failed => 7,
        }
    }

    /// Whether no operation can move the motion any further
    pub fn is_terminal(self) -> bool {
        matches!(self, MotionState::Finalized | MotionState::Failed)
    }
}

impl TryFrom<u8> for MotionState {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(MotionState::NonExistent),
            1 => Ok(MotionState::Staking),
            2 => Ok(MotionState::Submit),
            3 => Ok(MotionState::Reveal),
            4 => Ok(MotionState::Escalated),
            5 => Ok(MotionState::Finalizable),
            6 => Ok(MotionState::Finalized),
            7 => Ok(MotionState::Failed),
            other => Err(format!("unknown motion state code {}", other)),
        }
    }
}

impl From<MotionState> for u8 {
    fn from(state: MotionState) -> Self {
        state.code()
    }
}

/// Mutating operations on a motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Stake,
    SubmitVote,
    RevealVote,
    Finalize,
}

impl Operation {
    /// The only phase the operation is legal in
    pub fn required_state(self) -> MotionState {
        match self {
            Operation::Stake => MotionState::Staking,
            Operation::SubmitVote => MotionState::Submit,
            Operation::RevealVote => MotionState::Reveal,
            Operation::Finalize => MotionState::Finalizable,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Stake => f.write_str("stake on"),
            Operation::SubmitVote => f.write_str("submit a vote for"),
            Operation::RevealVote => f.write_str("reveal a vote for"),
            Operation::Finalize => f.write_str("finalize"),
        }
    }
}

/// Derives motion phases and checks transitions between them
#[derive(Debug, Clone, Copy)]
pub struct MotionStateMachine {
    thresholds: StakeThresholdCalculator,
}

impl MotionStateMachine {
    pub fn new(thresholds: StakeThresholdCalculator) -> Self {
        Self { thresholds }
    }

    /// Phase of `motion` at time `now`
    ///
    /// Staking ends when its window elapses or as soon as Yay activates. A
    /// window that elapses with neither side activated leaves the motion
    /// `Failed`. Reveal ends early once every committed vote is revealed.
    pub fn derive(&self, motion: &Motion, now: Timestamp) -> MotionState {
        if motion.finalized {
            return MotionState::Finalized;
        }
        if motion.escalated {
            return MotionState::Escalated;
        }

        let yay_active = self.thresholds.is_activated(motion, Vote::Yay);
        let nay_active = self.thresholds.is_activated(motion, Vote::Nay);

        if now < motion.events[STAKE_END] && !yay_active {
            return MotionState::Staking;
        }
        if !yay_active && !nay_active {
            return MotionState::Failed;
        }
        if now < motion.events[SUBMIT_END] {
            return MotionState::Submit;
        }

        let all_revealed = motion.rep_submitted > 0 && motion.rep_revealed() >= motion.rep_submitted;
        if now < motion.events[REVEAL_END] && !all_revealed {
            return MotionState::Reveal;
        }

        MotionState::Finalizable
    }

    /// Phases a motion may legally enter `to` from
    pub fn allowed_from(to: MotionState) -> &'static [MotionState] {
        match to {
            MotionState::NonExistent => &[],
            MotionState::Staking => &[MotionState::NonExistent],
            MotionState::Submit => &[MotionState::Staking],
            MotionState::Reveal => &[MotionState::Submit],
            MotionState::Escalated => &[MotionState::Reveal, MotionState::Finalizable],
            MotionState::Finalizable => &[MotionState::Reveal, MotionState::Escalated],
            MotionState::Finalized => &[MotionState::Finalizable],
            MotionState::Failed => &[MotionState::Staking],
        }
    }

    /// Check that a motion may move from `from` to `to`
    pub fn validate_transition(from: MotionState, to: MotionState) -> GovernanceResult<()> {
        let allowed = Self::allowed_from(to);
        if !allowed.contains(&from) {
            return Err(GovernanceError::InvalidTransition { from, to });
        }

        debug!("Motion transition {:?} -> {:?}", from, to);
        Ok(())
    }

    /// Check that `operation` is legal in phase `found`
    pub fn require(operation: Operation, found: MotionState) -> GovernanceResult<()> {
        let expected = operation.required_state();
        if found != expected {
            debug!("Rejecting {:?}: motion is {:?}, expected {:?}", operation, found, expected);
            return Err(GovernanceError::InvalidPhase { operation, expected, found });
        }
        Ok(())
    }
}
