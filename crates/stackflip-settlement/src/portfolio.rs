//! Per-account view across all flips: what is at stake, what was won, and
//! what can still be claimed.

use serde::{Deserialize, Serialize};
use stackflip_ledger::LedgerState;
use stackflip_types::{AccountId, Amount, BlockHeight, FlipId, Result, Side};

use crate::reward;

/// A stake on a flip that has not been resolved yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveStake {
    pub flip_id: FlipId,
    pub question: String,
    pub yes_amount: Amount,
    pub no_amount: Amount,
    /// 0 once the deadline has passed and the flip awaits resolution.
    pub blocks_left: BlockHeight,
}

/// A winning stake on a resolved flip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastWin {
    pub flip_id: FlipId,
    pub question: String,
    pub winning_side: Side,
    /// Amount the account had on the winning side.
    pub stake: Amount,
    pub reward: Amount,
    pub claimed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    pub account: AccountId,
    pub active: Vec<ActiveStake>,
    pub wins: Vec<PastWin>,
}

impl Portfolio {
    /// Build the portfolio of `account` from a ledger snapshot at `now`.
    pub fn build(state: &LedgerState, account: &AccountId, now: BlockHeight) -> Result<Self> {
        let mut active = Vec::new();
        let mut wins = Vec::new();

        for (flip_id, record) in state.stakes_for_account(account) {
            let Some(flip) = state.flip(flip_id) else {
                continue;
            };
            match flip.winning_side() {
                None if !record.is_empty() => active.push(ActiveStake {
                    flip_id,
                    question: flip.question.clone(),
                    yes_amount: record.yes_amount,
                    no_amount: record.no_amount,
                    blocks_left: flip.blocks_left(now),
                }),
                Some(side) if record.amount_on(side) > 0 => wins.push(PastWin {
                    flip_id,
                    question: flip.question.clone(),
                    winning_side: side,
                    stake: record.amount_on(side),
                    reward: reward::entitlement(flip, record)?,
                    claimed: record.claimed,
                }),
                _ => {}
            }
        }

        Ok(Self {
            account: account.clone(),
            active,
            wins,
        })
    }

    /// Wins with a positive reward that has not been claimed yet.
    pub fn claimable(&self) -> impl Iterator<Item = &PastWin> {
        self.wins.iter().filter(|w| !w.claimed && w.reward > 0)
    }

    #[must_use]
    pub fn total_claimable(&self) -> u128 {
        self.claimable().map(|w| u128::from(w.reward)).sum()
    }

    /// Sum of everything still locked in unresolved flips.
    #[must_use]
    pub fn total_at_stake(&self) -> u128 {
        self.active
            .iter()
            .map(|s| u128::from(s.yes_amount) + u128::from(s.no_amount))
            .sum()
    }
}
