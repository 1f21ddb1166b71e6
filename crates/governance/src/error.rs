use thiserror::Error;

use motions_core::{Address, Amount, ConfigError, CryptoError, Timestamp};
use motions_core::utils::format_amount;

use crate::interfaces::{ChainError, OracleError};
use crate::state_machine::{MotionState, Operation};
use crate::types::MotionId;

fn display_amount(amount: &Amount) -> String {
    format_amount(*amount)
}

/// Result type for governance operations
pub type GovernanceResult<T> = Result<T, GovernanceError>;

/// Why the ledger rejected a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertReason {
    /// The salt and vote do not reproduce the stored commitment
    CommitmentMismatch,
    /// The motion is not accepting stakes
    NotStaking,
    /// The motion is not accepting vote commitments
    NotOpen,
    /// The motion is not accepting reveals
    NotReveal,
    /// The motion cannot be finalized
    NotFinalizable,
    /// The caller has no commitment to reveal
    NothingToReveal,
    /// The stake exceeds what the side needs to activate
    StakeTooLarge,
    /// The reputation proof did not verify
    InvalidProof,
    /// A reason this client does not recognise
    Other(String),
}

impl RevertReason {
    pub const SECRET_NO_MATCH: &'static str = "voting-rep-secret-no-match";
    pub const MOTION_NOT_STAKING: &'static str = "voting-rep-motion-not-staking";
    pub const MOTION_NOT_OPEN: &'static str = "voting-rep-motion-not-open";
    pub const MOTION_NOT_REVEAL: &'static str = "voting-rep-motion-not-reveal";
    pub const MOTION_NOT_FINALIZABLE: &'static str = "voting-rep-motion-not-finalizable";
    pub const NOTHING_TO_REVEAL: &'static str = "voting-rep-nothing-to-reveal";
    pub const STAKE_TOO_LARGE: &'static str = "voting-rep-stake-too-large";
    pub const INVALID_PROOF: &'static str = "colony-reputation-invalid-proof";

    /// Classify a raw revert message
    ///
    /// Ledgers wrap the reason in varying prose, so matching is by substring.
    pub fn parse(message: &str) -> Self {
        let known = [
            (Self::SECRET_NO_MATCH, RevertReason::CommitmentMismatch),
            (Self::MOTION_NOT_STAKING, RevertReason::NotStaking),
            (Self::MOTION_NOT_OPEN, RevertReason::NotOpen),
            (Self::MOTION_NOT_REVEAL, RevertReason::NotReveal),
            (Self::MOTION_NOT_FINALIZABLE, RevertReason::NotFinalizable),
            (Self::NOTHING_TO_REVEAL, RevertReason::NothingToReveal),
            (Self::STAKE_TOO_LARGE, RevertReason::StakeTooLarge),
            (Self::INVALID_PROOF, RevertReason::InvalidProof),
        ];

        known.into_iter()
            .find(|(code, _)| message.contains(code))
            .map(|(_, reason)| reason)
            .unwrap_or_else(|| RevertReason::Other(message.to_string()))
    }
}

impl std::fmt::Display for RevertReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevertReason::CommitmentMismatch => f.write_str("vote commitment does not match"),
            RevertReason::NotStaking => f.write_str("motion is not in staking"),
            RevertReason::NotOpen => f.write_str("motion is not open for votes"),
            RevertReason::NotReveal => f.write_str("motion is not in reveal"),
            RevertReason::NotFinalizable => f.write_str("motion is not finalizable"),
            RevertReason::NothingToReveal => f.write_str("no vote to reveal"),
            RevertReason::StakeTooLarge => f.write_str("stake exceeds remaining activation amount"),
            RevertReason::InvalidProof => f.write_str("invalid reputation proof"),
            RevertReason::Other(message) => f.write_str(message),
        }
    }
}

/// Error types for governance operations
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// Motion or team does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation attempted outside the phase it is legal in
    #[error("Cannot {operation} motion in phase {found:?} (expected {expected:?})")]
    InvalidPhase {
        operation: Operation,
        expected: MotionState,
        found: MotionState,
    },

    /// A motion cannot move between the two phases
    #[error("Invalid motion transition: {from:?} -> {to:?}")]
    InvalidTransition { from: MotionState, to: MotionState },

    /// Not enough tokens deposited to stake
    #[error("Not enough tokens deposited for staking: required {}, deposited {}", display_amount(.required), display_amount(.deposited))]
    InsufficientDeposit { required: Amount, deposited: Amount },

    /// Not enough tokens approved to an obligator
    #[error("Not enough tokens approved for staking by {obligator}: required {}, approved {}", display_amount(.required), display_amount(.approved))]
    InsufficientApproval { obligator: Address, required: Amount, approved: Amount },

    /// The staking window of the motion has passed
    #[error("The staking period for motion {motion_id} ended at {ended_at}")]
    StakingWindowClosed { motion_id: MotionId, ended_at: Timestamp },

    /// Stake below the motion's minimum
    #[error("The staked amount is too small. Please stake at least {}", display_amount(.minimum))]
    StakeTooSmall { minimum: Amount, amount: Amount },

    /// The side a voter committed to could not be discovered
    #[error("Could not find a vote cast by {voter} for motion {motion_id}")]
    VoteNotFound { voter: Address, motion_id: MotionId },

    /// The ledger rejected a call that passed local validation
    #[error("Reverted on chain: {0}")]
    RevertedOnChain(RevertReason),

    /// The reputation oracle could not produce a proof
    #[error("Reputation oracle unavailable: {0}")]
    OracleUnavailable(String),

    /// The ledger could not be reached
    #[error("Transport error: {0}")]
    Transport(String),

    /// The installed motions extension speaks another version
    #[error("The installed version {installed} of the motions extension is not supported (expected {supported})")]
    UnsupportedExtension { installed: u32, supported: u32 },

    /// A receipt lacked an event the operation always emits
    #[error("Event {0} missing from receipt")]
    EventMissing(&'static str),

    /// An event could not be decoded
    #[error("Malformed event {name}: {reason}")]
    EventDecoding { name: &'static str, reason: String },

    /// Signing error
    #[error("Signing error: {0}")]
    Signing(#[from] CryptoError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl GovernanceError {
    /// Whether the ledger rejected a reveal because the commitment did not match
    pub fn is_commitment_mismatch(&self) -> bool {
        matches!(self, GovernanceError::RevertedOnChain(RevertReason::CommitmentMismatch))
    }
}

impl From<ChainError> for GovernanceError {
    fn from(error: ChainError) -> Self {
        match error {
            ChainError::Reverted(message) => GovernanceError::RevertedOnChain(RevertReason::parse(&message)),
            ChainError::Transport(message) => GovernanceError::Transport(message),
        }
    }
}

impl From<OracleError> for GovernanceError {
    fn from(error: OracleError) -> Self {
        GovernanceError::OracleUnavailable(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motions_core::utils::ONE_TOKEN;

    #[test]
    fn test_parse_known_reasons() {
        assert_eq!(
            RevertReason::parse("execution reverted: voting-rep-secret-no-match"),
            RevertReason::CommitmentMismatch
        );
        assert_eq!(RevertReason::parse("voting-rep-motion-not-open"), RevertReason::NotOpen);
        assert_eq!(
            RevertReason::parse("out of gas"),
            RevertReason::Other("out of gas".to_string())
        );
    }

    #[test]
    fn test_chain_error_mapping() {
        let err: GovernanceError = ChainError::Reverted(RevertReason::SECRET_NO_MATCH.to_string()).into();
        assert!(err.is_commitment_mismatch());

        let err: GovernanceError = ChainError::Transport("connection reset".to_string()).into();
        assert!(matches!(err, GovernanceError::Transport(_)));
    }

    #[test]
    fn test_stake_too_small_message() {
        let err = GovernanceError::StakeTooSmall { minimum: 20 * ONE_TOKEN, amount: ONE_TOKEN };
        assert_eq!(err.to_string(), "The staked amount is too small. Please stake at least 20.0");
    }
}
