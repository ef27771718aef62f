//! Escrow — the pool account and the rail that moves value through it.
//!
//! Stakes flow from the staker into the pool account; fees and rewards
//! flow out of it. The pool account holds exactly the sum of all
//! unsettled pools plus any fee whose payout is still pending.

use stackflip_types::{AccountId, Amount, Result, ValueTransfer};

/// Moves value into and out of the pool account.
#[derive(Clone, Copy)]
pub struct Escrow<'a> {
    rail: &'a dyn ValueTransfer,
    pool_account: &'a AccountId,
}

impl<'a> Escrow<'a> {
    #[must_use]
    pub fn new(rail: &'a dyn ValueTransfer, pool_account: &'a AccountId) -> Self {
        Self { rail, pool_account }
    }

    #[must_use]
    pub fn pool_account(&self) -> &AccountId {
        self.pool_account
    }

    /// Move `amount` from `from` into the pool account.
    ///
    /// # Errors
    /// `TransferFailed` if the rail refuses the movement. Nothing moved.
    pub fn collect(&self, from: &AccountId, amount: Amount) -> Result<()> {
        self.move_value(from, self.pool_account, amount)
    }

    /// Move `amount` from the pool account to `to`. A zero amount is a
    /// no-op and never reaches the rail.
    ///
    /// # Errors
    /// `TransferFailed` if the rail refuses the movement. Nothing moved.
    pub fn pay_out(&self, to: &AccountId, amount: Amount) -> Result<()> {
        self.move_value(self.pool_account, to, amount)
    }

    fn move_value(&self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        self.rail.transfer(from, to, amount).map_err(|e| {
            tracing::warn!(%from, %to, amount, error = %e, "Value transfer failed");
            e.into_flip_error(from, to, amount)
        })
    }
}
