//! Stake book — accumulates stakes and pool totals while a flip is open.
//!
//! A stake touches three things: the account's stake record, the flip's
//! pool total for that side, and the value held in escrow. All three
//! change together, or none do. The stake is validated and the escrow
//! collected while holding the flip's lock, then record and pool are
//! committed in one transaction. A slow rail delays only that flip.

use stackflip_types::{
    AccountId, Amount, BlockHeight, Flip, FlipError, FlipId, Result, Side, StakeRecord,
};

use crate::{escrow::Escrow, store::Ledger};

/// Records stakes against open flips.
pub struct StakeBook<'l> {
    ledger: &'l Ledger,
}

impl<'l> StakeBook<'l> {
    #[must_use]
    pub fn new(ledger: &'l Ledger) -> Self {
        Self { ledger }
    }

    /// Stake `amount` on `side` of a flip, collecting it into escrow.
    ///
    /// Returns the account's stake record after the increment.
    ///
    /// # Errors
    /// Checked in this order:
    /// - `NotFound` if the flip does not exist
    /// - `ZeroAmount` if `amount == 0`
    /// - `DeadlinePassed` if `now >= deadline`
    /// - `AlreadyResolved` if the flip is resolved
    /// - `ArithmeticOverflow` if a stake or pool total would not fit
    /// - `TransferFailed` if escrow could not collect the amount
    pub fn stake(
        &self,
        flip_id: FlipId,
        account: &AccountId,
        side: Side,
        amount: Amount,
        now: BlockHeight,
        escrow: &Escrow<'_>,
    ) -> Result<StakeRecord> {
        let record = self.ledger.with_flip(flip_id, || {
            let (flip, record) = self.ledger.read(|s| -> Result<(Flip, StakeRecord)> {
                let mut flip = s.flip(flip_id).cloned().ok_or(FlipError::NotFound(flip_id))?;
                if amount == 0 {
                    return Err(FlipError::ZeroAmount { flip_id });
                }
                if now >= flip.deadline {
                    return Err(FlipError::DeadlinePassed {
                        flip_id,
                        deadline: flip.deadline,
                        now,
                    });
                }
                if flip.is_resolved() {
                    return Err(FlipError::AlreadyResolved(flip_id));
                }

                let mut record = s.stake(flip_id, account).cloned().unwrap_or_default();
                record.add(flip_id, side, amount)?;
                flip.credit_pool(side, amount)?;
                Ok((flip, record))
            })??;

            escrow.collect(account, amount)?;

            self.ledger.transact(|txn| {
                txn.put_stake(flip_id, account.clone(), record.clone());
                txn.put_flip(flip);
                Ok(record)
            })
        })?;

        tracing::debug!(
            flip = %flip_id,
            account = %account,
            %side,
            amount,
            "Stake placed"
        );
        Ok(record)
    }

    /// The account's stake record, or [`StakeRecord::EMPTY`] if it never
    /// staked. Absence is not an error.
    pub fn get_stake(&self, flip_id: FlipId, account: &AccountId) -> Result<StakeRecord> {
        self.ledger
            .read(|s| s.stake(flip_id, account).cloned().unwrap_or_default())
    }

    /// Every stake on one flip, in account order.
    pub fn stakes_for_flip(&self, flip_id: FlipId) -> Result<Vec<(AccountId, StakeRecord)>> {
        self.ledger.read(|s| {
            s.stakes_for_flip(flip_id)
                .map(|(account, record)| (account.clone(), record.clone()))
                .collect()
        })
    }

    /// Every stake held by one account, in flip order.
    pub fn stakes_for_account(&self, account: &AccountId) -> Result<Vec<(FlipId, StakeRecord)>> {
        self.ledger.read(|s| {
            s.stakes_for_account(account)
                .map(|(flip_id, record)| (flip_id, record.clone()))
                .collect()
        })
    }
}
