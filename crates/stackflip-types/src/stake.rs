//! Per-(flip, account) stake records.
//!
//! An account may hold both sides of the same flip. Amounts only
//! accumulate; the `claimed` flag flips to `true` once.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, FlipError, FlipId, Result, Side};

/// Key of a stake record in the ledger.
pub type StakeKey = (FlipId, AccountId);

/// One account's committed amounts on one flip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    pub yes_amount: Amount,
    pub no_amount: Amount,
    pub claimed: bool,
}

impl StakeRecord {
    /// The record returned for accounts that never staked.
    pub const EMPTY: Self = Self {
        yes_amount: 0,
        no_amount: 0,
        claimed: false,
    };

    /// Amount held on one side.
    #[must_use]
    pub fn amount_on(&self, side: Side) -> Amount {
        match side {
            Side::Yes => self.yes_amount,
            Side::No => self.no_amount,
        }
    }

    /// Add `amount` to one side.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the side total would not fit. The record is
    /// unchanged on error.
    pub fn add(&mut self, flip_id: FlipId, side: Side, amount: Amount) -> Result<()> {
        let slot = match side {
            Side::Yes => &mut self.yes_amount,
            Side::No => &mut self.no_amount,
        };
        *slot = slot
            .checked_add(amount)
            .ok_or_else(|| FlipError::overflow(format!("{side} stake on {flip_id}")))?;
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.yes_amount == 0 && self.no_amount == 0
    }
}
