//! In-memory value-transfer rail.
//!
//! [`InMemoryBank`] keeps one balance per account and implements
//! [`ValueTransfer`] on top of it. Deposits and withdrawals are the only
//! ways value enters or leaves; transfers move it around. Supply
//! conservation holds at all times:
//!
//! ```text
//! Σ balance == Σ deposits - Σ withdrawals
//! ```

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use stackflip_types::{AccountId, Amount, FlipError, Result, TransferError, ValueTransfer};

#[derive(Debug, Default)]
struct BankState {
    balances: HashMap<AccountId, Amount>,
    deposited: u128,
    withdrawn: u128,
}

impl BankState {
    fn balance(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

/// Account balances behind a single lock.
#[derive(Debug, Default)]
pub struct InMemoryBank {
    state: Mutex<BankState>,
}

impl InMemoryBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of new value to `account`.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the balance would not fit.
    pub fn deposit(&self, account: &AccountId, amount: Amount) -> Result<()> {
        let mut state = self.lock()?;
        let balance = state
            .balance(account)
            .checked_add(amount)
            .ok_or_else(|| FlipError::overflow(format!("balance of {account}")))?;
        state.balances.insert(account.clone(), balance);
        state.deposited += u128::from(amount);
        tracing::debug!(account = %account, amount, "Deposit");
        Ok(())
    }

    /// Remove `amount` of value from `account`.
    ///
    /// # Errors
    /// `TransferFailed` if the balance cannot cover it.
    pub fn withdraw(&self, account: &AccountId, amount: Amount) -> Result<()> {
        let mut state = self.lock()?;
        let available = state.balance(account);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                needed: amount,
                available,
            }
            .into_flip_error(account, account, amount));
        }
        state.balances.insert(account.clone(), available - amount);
        state.withdrawn += u128::from(amount);
        tracing::debug!(account = %account, amount, "Withdrawal");
        Ok(())
    }

    /// Current balance, 0 for unknown accounts.
    pub fn balance(&self, account: &AccountId) -> Result<Amount> {
        Ok(self.lock()?.balance(account))
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> Result<u128> {
        Ok(self.lock()?.balances.values().map(|b| u128::from(*b)).sum())
    }

    /// Deposits minus withdrawals since creation.
    pub fn expected_supply(&self) -> Result<u128> {
        let state = self.lock()?;
        Ok(state.deposited - state.withdrawn)
    }

    /// Check that transfers neither created nor destroyed value.
    ///
    /// # Errors
    /// `Internal` if the balances no longer sum to the expected supply.
    pub fn verify_supply(&self) -> Result<()> {
        let state = self.lock()?;
        let actual: u128 = state.balances.values().map(|b| u128::from(*b)).sum();
        let expected = state.deposited - state.withdrawn;
        if actual != expected {
            return Err(FlipError::Internal(format!(
                "bank supply {actual} != expected {expected} (deposits={}, withdrawals={})",
                state.deposited, state.withdrawn
            )));
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BankState>> {
        self.state
            .lock()
            .map_err(|_| FlipError::Internal("bank lock poisoned".into()))
    }
}

impl ValueTransfer for InMemoryBank {
    fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> std::result::Result<(), TransferError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| TransferError::Unavailable("bank lock poisoned".into()))?;

        let available = state.balance(from);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = state
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected(format!("balance of {to} would overflow")))?;

        state.balances.insert(from.clone(), available - amount);
        state.balances.insert(to.clone(), credited);
        Ok(())
    }
}
