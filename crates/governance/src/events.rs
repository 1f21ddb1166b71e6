//! Typed events decoded from transaction receipts

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use motions_core::{Address, Amount};

use crate::error::{GovernanceError, GovernanceResult};
use crate::interfaces::{ChainEvent, TransactionReceipt};
use crate::types::{amount_str, DomainId, MotionId, Vote};

/// An event with a fixed name on the ledger
pub trait LedgerEvent: DeserializeOwned {
    const NAME: &'static str;

    /// Decode the arguments of `event`
    fn decode(event: &ChainEvent) -> GovernanceResult<Self> {
        serde_json::from_value(serde_json::Value::Object(event.args.clone()))
            .map_err(|e| GovernanceError::EventDecoding { name: Self::NAME, reason: e.to_string() })
    }
}

/// Tokens were staked on a motion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionStaked {
    pub motion_id: MotionId,
    pub staker: Address,
    pub vote: Vote,
    #[serde(with = "amount_str")]
    pub amount: Amount,
}

impl LedgerEvent for MotionStaked {
    const NAME: &'static str = "MotionStaked";
}

/// One of a motion's window ends was moved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionEventSet {
    pub motion_id: MotionId,
    pub event_index: u64,
}

impl LedgerEvent for MotionEventSet {
    const NAME: &'static str = "MotionEventSet";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionVoteSubmitted {
    pub motion_id: MotionId,
    pub voter: Address,
}

impl LedgerEvent for MotionVoteSubmitted {
    const NAME: &'static str = "MotionVoteSubmitted";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionVoteRevealed {
    pub motion_id: MotionId,
    pub voter: Address,
    pub vote: Vote,
}

impl LedgerEvent for MotionVoteRevealed {
    const NAME: &'static str = "MotionVoteRevealed";
}

/// A motion was finalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionFinalized {
    pub motion_id: MotionId,
    /// Hex-encoded action payload
    pub action: String,
    /// Whether the action ran
    pub executed: bool,
}

impl LedgerEvent for MotionFinalized {
    const NAME: &'static str = "MotionFinalized";
}

/// Deposited tokens were approved to an obligator in a team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTokenApproved {
    pub token: Address,
    pub user: Address,
    pub obligator: Address,
    pub domain_id: DomainId,
    #[serde(with = "amount_str")]
    pub amount: Amount,
}

impl LedgerEvent for UserTokenApproved {
    const NAME: &'static str = "UserTokenApproved";
}

/// First event named `T::NAME` in `receipt`, if any
pub fn find<T: LedgerEvent>(receipt: &TransactionReceipt) -> GovernanceResult<Option<T>> {
    receipt.events.iter()
        .find(|event| event.name == T::NAME)
        .map(T::decode)
        .transpose()
}

/// First event named `T::NAME` in `receipt`
pub fn extract<T: LedgerEvent>(receipt: &TransactionReceipt) -> GovernanceResult<T> {
    find(receipt)?.ok_or(GovernanceError::EventMissing(T::NAME))
}
