//! Claim processor — pays winners their share of the distributable pool.
//!
//! The `claimed` flag is committed before the payout is attempted, so a
//! concurrent or repeated claim sees `AlreadyClaimed` instead of being paid
//! twice. If the payout fails, the flag is cleared again and the claimant
//! can retry. The whole claim holds the flip's lock; the payout runs
//! outside the ledger mutex.
//!
//! A reward that truncates to 0 still counts as a claim: the flag is set
//! and nothing reaches the rail.
//!
//! Accounts with nothing on the winning side (losers and non-stakers) are
//! refused with `NoStake`. [`ClaimProcessor::claimable_reward`] reports 0 for
//! them.

use stackflip_ledger::{Escrow, Ledger};
use stackflip_types::{AccountId, Amount, FlipError, FlipId, Result};

use crate::reward;

pub struct ClaimProcessor<'a> {
    ledger: &'a Ledger,
}

impl<'a> ClaimProcessor<'a> {
    #[must_use]
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    /// Claim the reward for `account` on a resolved flip. Returns the
    /// amount paid, which may be 0.
    ///
    /// # Errors
    /// Checked in this order:
    /// - `NotFound` if the flip does not exist
    /// - `NotResolved` if the flip is unresolved
    /// - `NoStake` if the account holds nothing on the winning side
    /// - `AlreadyClaimed` if the account already claimed
    /// - `TransferFailed` if the payout failed (claim flag restored)
    pub fn claim(&self, flip_id: FlipId, account: &AccountId, escrow: &Escrow<'_>) -> Result<Amount> {
        self.ledger.with_flip(flip_id, || {
            let reward = self.ledger.transact(|txn| {
                let flip = txn.require_flip(flip_id)?;
                let side = flip.winning_side().ok_or(FlipError::NotResolved(flip_id))?;
                let mut record = txn.stake(flip_id, account);
                if record.amount_on(side) == 0 {
                    return Err(FlipError::NoStake {
                        flip_id,
                        account: account.clone(),
                    });
                }
                if record.claimed {
                    return Err(FlipError::AlreadyClaimed {
                        flip_id,
                        account: account.clone(),
                    });
                }
                let reward = reward::entitlement(&flip, &record)?;
                record.claimed = true;
                txn.put_stake(flip_id, account.clone(), record);
                Ok(reward)
            })?;

            if let Err(e) = escrow.pay_out(account, reward) {
                self.release_claim(flip_id, account)?;
                tracing::warn!(
                    flip = %flip_id,
                    account = %account,
                    reward,
                    error = %e,
                    "Reward payout failed; claim rolled back"
                );
                return Err(e);
            }

            tracing::info!(flip = %flip_id, account = %account, reward, "Reward claimed");
            Ok(reward)
        })
    }

    /// What [`claim`](Self::claim) would pay right now. 0 if the flip is
    /// unresolved, the account has no winning stake, or it already claimed.
    ///
    /// # Errors
    /// `NotFound` if the flip does not exist.
    pub fn claimable_reward(&self, flip_id: FlipId, account: &AccountId) -> Result<Amount> {
        self.ledger.read(|s| -> Result<Amount> {
            let flip = s.flip(flip_id).ok_or(FlipError::NotFound(flip_id))?;
            match s.stake(flip_id, account) {
                Some(record) if !record.claimed => reward::entitlement(flip, record),
                _ => Ok(0),
            }
        })?
    }

    fn release_claim(&self, flip_id: FlipId, account: &AccountId) -> Result<()> {
        self.ledger.transact(|txn| {
            let mut record = txn.stake(flip_id, account);
            record.claimed = false;
            txn.put_stake(flip_id, account.clone(), record);
            Ok(())
        })
    }
}
