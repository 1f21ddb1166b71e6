//! Motion data model
//!
//! Snapshots of motions as reported by the ledger, plus the small value
//! types the lifecycle operations pass around.

use std::fmt;
use serde::{Serialize, Deserialize};

use motions_core::{Address, Amount, Hash, Timestamp};

/// Motion identifier (1-based, assigned by the ledger)
pub type MotionId = u64;

/// Team (domain) identifier
pub type DomainId = u64;

/// Reputation skill identifier
pub type SkillId = u64;

/// The root team every organization has
pub const ROOT_DOMAIN: DomainId = 1;

/// A side of a motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Vote {
    /// Against the motion
    Nay = 0,
    /// For the motion
    Yay = 1,
}

impl Vote {
    /// Both sides, in tag order
    pub const BOTH: [Vote; 2] = [Vote::Nay, Vote::Yay];

    /// Index into per-side arrays
    pub fn index(self) -> usize {
        self as usize
    }

    /// Numeric tag used on the ledger
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// The other side
    pub fn opposite(self) -> Vote {
        match self {
            Vote::Nay => Vote::Yay,
            Vote::Yay => Vote::Nay,
        }
    }
}

impl TryFrom<u8> for Vote {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Vote::Nay),
            1 => Ok(Vote::Yay),
            other => Err(format!("invalid vote tag {}", other)),
        }
    }
}

impl From<Vote> for u8 {
    fn from(vote: Vote) -> Self {
        vote.tag()
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vote::Nay => f.write_str("Nay"),
            Vote::Yay => f.write_str("Yay"),
        }
    }
}

/// Index of a motion event timestamp
pub const STAKE_END: usize = 0;
/// Index of the voting window end
pub const SUBMIT_END: usize = 1;
/// Index of the reveal window end
pub const REVEAL_END: usize = 2;

/// A motion as recorded on the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Motion {
    pub id: MotionId,
    /// Team the motion was created in
    pub domain_id: DomainId,
    /// Skill backing the team's reputation
    pub skill_id: SkillId,
    /// Reputation snapshot the motion is bound to
    pub root_hash: Hash,
    /// Total reputation eligible to vote, fixed at creation
    pub skill_rep: Amount,
    /// Reputation that has committed a vote
    pub rep_submitted: Amount,
    /// Cumulative stake per side, indexed by [`Vote::index`]
    pub stakes: [Amount; 2],
    /// Revealed reputation per side, indexed by [`Vote::index`]
    pub votes: [Amount; 2],
    /// Ends of the staking, voting and reveal windows
    pub events: [Timestamp; 3],
    pub escalated: bool,
    pub finalized: bool,
    /// Contract the action is executed against
    pub alt_target: Address,
    /// Encoded action payload
    pub action: Vec<u8>,
}

impl Motion {
    /// Stake held by `side`
    pub fn stake(&self, side: Vote) -> Amount {
        self.stakes[side.index()]
    }

    /// Total reputation revealed so far
    pub fn rep_revealed(&self) -> Amount {
        self.votes[0].saturating_add(self.votes[1])
    }

    /// Whether any vote has been revealed
    pub fn has_votes(&self) -> bool {
        self.rep_revealed() > 0
    }

    /// The side that wins if the motion is finalized now
    ///
    /// Revealed votes decide when there are any, otherwise stakes do. Yay must
    /// strictly exceed Nay.
    pub fn prevailing_side(&self) -> Vote {
        let weights = if self.has_votes() { &self.votes } else { &self.stakes };
        if weights[Vote::Yay.index()] > weights[Vote::Nay.index()] {
            Vote::Yay
        } else {
            Vote::Nay
        }
    }
}

/// Amounts each side still needs to activate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingStakes {
    pub nay: Amount,
    pub yay: Amount,
}

impl RemainingStakes {
    /// Remaining amount for `side`
    pub fn for_side(&self, side: Vote) -> Amount {
        match side {
            Vote::Nay => self.nay,
            Vote::Yay => self.yay,
        }
    }
}

/// Network-wide stake parameters, 18-decimal fractions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeFractions {
    /// Fraction of skill reputation a side needs to activate
    pub total_stake_fraction: Amount,
    /// Fraction of the activation amount each stake must at least carry
    pub user_min_stake_fraction: Amount,
}

/// A reputation proof as issued by the reputation oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReputationProof {
    /// Opaque proof material the ledger verifies
    pub blob: Vec<u8>,
    /// Reputation the proof attests to
    pub weight: Amount,
}

/// A team of the organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub id: DomainId,
    pub skill_id: SkillId,
}

/// An installed extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionInfo {
    pub address: Address,
    pub version: u32,
}

/// Serde helpers encoding amounts as decimal strings
///
/// JSON numbers cannot carry the full `u128` range.
pub mod amount_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use motions_core::Amount;

    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<Amount>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::motion_with;

    #[test]
    fn test_vote_tags() {
        assert_eq!(Vote::Nay.tag(), 0);
        assert_eq!(Vote::Yay.tag(), 1);
        assert_eq!(Vote::try_from(1).unwrap(), Vote::Yay);
        assert!(Vote::try_from(2).is_err());
        assert_eq!(Vote::Nay.opposite(), Vote::Yay);
        assert_eq!(serde_json::to_string(&Vote::Yay).unwrap(), "1");
    }

    #[test]
    fn test_prevailing_side_uses_votes_when_present() {
        let motion = motion_with([100, 600], [700, 300]);
        assert_eq!(motion.prevailing_side(), Vote::Nay);
    }

    #[test]
    fn test_prevailing_side_falls_back_to_stakes() {
        let motion = motion_with([100, 600], [0, 0]);
        assert_eq!(motion.prevailing_side(), Vote::Yay);
    }

    #[test]
    fn test_tie_does_not_pass() {
        let motion = motion_with([500, 500], [0, 0]);
        assert_eq!(motion.prevailing_side(), Vote::Nay);
    }
}
