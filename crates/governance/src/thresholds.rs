//! Stake thresholds
//!
//! Activation and minimum-stake amounts are derived from a motion's skill
//! reputation and two network fractions, all 18-decimal fixed point.

use motions_core::Amount;

use crate::types::{Motion, RemainingStakes, StakeFractions, Vote};

/// Fixed-point scale of ledger fractions (10^18)
pub const SCALE: Amount = 1_000_000_000_000_000_000;

/// `floor(value * fraction / SCALE)` without a 256-bit intermediate
///
/// Exact whenever `fraction <= SCALE`, which holds for every fraction the
/// ledger accepts. Larger fractions saturate instead of wrapping.
pub fn scale_mul(value: Amount, fraction: Amount) -> Amount {
    let whole = value / SCALE;
    let rest = value % SCALE;
    whole.saturating_mul(fraction)
        .saturating_add(rest.saturating_mul(fraction) / SCALE)
}

/// Computes activation thresholds and minimum stakes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeThresholdCalculator {
    fractions: StakeFractions,
}

impl StakeThresholdCalculator {
    /// Create a calculator from fractions fetched once from the network
    pub fn new(fractions: StakeFractions) -> Self {
        Self { fractions }
    }

    /// The fractions this calculator was built with
    pub fn fractions(&self) -> StakeFractions {
        self.fractions
    }

    /// Stake a side needs in total to activate
    pub fn required_activation(&self, motion: &Motion) -> Amount {
        scale_mul(motion.skill_rep, self.fractions.total_stake_fraction)
    }

    /// Smallest stake a single user may place
    pub fn min_stake_per_user(&self, motion: &Motion) -> Amount {
        scale_mul(self.required_activation(motion), self.fractions.user_min_stake_fraction)
    }

    /// Minimum stake for `side`
    ///
    /// Usually `min_stake_per_user`, unless less than that is missing for
    /// activation. Nay is only considered when the caller stakes Nay and Nay is
    /// still short; every other case is bounded by what Yay is missing.
    pub fn min_stake(&self, motion: &Motion, side: Vote) -> Amount {
        let required = self.required_activation(motion);
        let per_user = self.min_stake_per_user(motion);
        let nay = motion.stake(Vote::Nay);
        let yay = motion.stake(Vote::Yay);

        if side == Vote::Nay && nay < required {
            (required - nay).min(per_user)
        } else if yay < required {
            (required - yay).min(per_user)
        } else {
            per_user
        }
    }

    /// What each side still needs to activate
    pub fn remaining_stakes(&self, motion: &Motion) -> RemainingStakes {
        let required = self.required_activation(motion);
        RemainingStakes {
            nay: required.saturating_sub(motion.stake(Vote::Nay)),
            yay: required.saturating_sub(motion.stake(Vote::Yay)),
        }
    }

    /// Whether `side` has reached activation
    pub fn is_activated(&self, motion: &Motion, side: Vote) -> bool {
        motion.stake(side) >= self.required_activation(motion)
    }
}
