//! External collaborators the settlement engine drives but does not
//! implement: the chain clock, the value-transfer rail, and the wallet.

use std::sync::Arc;

use crate::{AccountId, Amount, BlockHeight, TransferError};

/// Source of the current block height.
///
/// Must be non-decreasing across calls within one session. The engine never
/// reads wall-clock time for deadline decisions.
pub trait ChainClock: Send + Sync {
    fn current_height(&self) -> BlockHeight;
}

/// Moves value between accounts (stake escrow, fee payout, reward payout).
///
/// Implementations must make a failed call a no-op so the engine can retry
/// or roll back its own state around it.
pub trait ValueTransfer: Send + Sync {
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: Amount)
    -> Result<(), TransferError>;
}

/// Supplies the account the current session acts as.
pub trait WalletProvider {
    /// `None` when no wallet is connected.
    fn account_identity(&self) -> Option<AccountId>;
}

impl<T: ChainClock + ?Sized> ChainClock for Arc<T> {
    fn current_height(&self) -> BlockHeight {
        (**self).current_height()
    }
}

impl<T: ValueTransfer + ?Sized> ValueTransfer for Arc<T> {
    fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TransferError> {
        (**self).transfer(from, to, amount)
    }
}

/// A session with a fixed (or no) connected account.
impl WalletProvider for Option<AccountId> {
    fn account_identity(&self) -> Option<AccountId> {
        self.clone()
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
pub use helpers::{FailingTransfer, GatedTransfer, RecordingTransfer};

#[cfg(any(test, feature = "test-helpers"))]
mod helpers {
    use std::sync::{
        Barrier, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };

    use crate::{AccountId, Amount, TransferError, ValueTransfer};

    /// Accepts every movement and remembers it.
    #[derive(Default)]
    pub struct RecordingTransfer {
        moves: Mutex<Vec<(AccountId, AccountId, Amount)>>,
    }

    impl RecordingTransfer {
        /// Every accepted movement as `(from, to, amount)`, oldest first.
        pub fn moves(&self) -> Vec<(AccountId, AccountId, Amount)> {
            self.moves
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Total moved into `account`.
        pub fn received_by(&self, account: &AccountId) -> Amount {
            self.moves
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .filter(|(_, to, _)| to == account)
                .map(|(_, _, amount)| amount)
                .sum()
        }
    }

    impl ValueTransfer for RecordingTransfer {
        fn transfer(
            &self,
            from: &AccountId,
            to: &AccountId,
            amount: Amount,
        ) -> Result<(), TransferError> {
            self.moves
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((from.clone(), to.clone(), amount));
            Ok(())
        }
    }

    /// Holds the first movement paying `to` until the test releases it, so
    /// other calls can be made while that transfer is in flight.
    pub struct GatedTransfer<T> {
        inner: T,
        to: AccountId,
        armed: AtomicBool,
        held: Barrier,
        released: Barrier,
    }

    impl<T: ValueTransfer> GatedTransfer<T> {
        pub fn new(inner: T, to: AccountId) -> Self {
            Self {
                inner,
                to,
                armed: AtomicBool::new(true),
                held: Barrier::new(2),
                released: Barrier::new(2),
            }
        }

        /// Block until the gated movement has reached the rail.
        pub fn wait_until_held(&self) {
            self.held.wait();
        }

        /// Let the held movement complete.
        pub fn release(&self) {
            self.released.wait();
        }

        pub fn inner(&self) -> &T {
            &self.inner
        }
    }

    impl<T: ValueTransfer> ValueTransfer for GatedTransfer<T> {
        fn transfer(
            &self,
            from: &AccountId,
            to: &AccountId,
            amount: Amount,
        ) -> Result<(), TransferError> {
            if to == &self.to && self.armed.swap(false, Ordering::SeqCst) {
                self.held.wait();
                self.released.wait();
            }
            self.inner.transfer(from, to, amount)
        }
    }

    /// Wraps a transfer rail and rejects the next `n` movements, optionally
    /// only those paying a given account.
    pub struct FailingTransfer<T> {
        inner: T,
        failures_left: AtomicUsize,
        only_to: Option<AccountId>,
    }

    impl<T: ValueTransfer> FailingTransfer<T> {
        /// Pass-through until [`fail_next`](Self::fail_next) is called.
        pub fn new(inner: T) -> Self {
            Self {
                inner,
                failures_left: AtomicUsize::new(0),
                only_to: None,
            }
        }

        /// Only fail movements whose destination is `to`.
        #[must_use]
        pub fn only_to(mut self, to: AccountId) -> Self {
            self.only_to = Some(to);
            self
        }

        /// Reject the next `n` matching movements.
        pub fn fail_next(&self, n: usize) {
            self.failures_left.store(n, Ordering::SeqCst);
        }

        pub fn inner(&self) -> &T {
            &self.inner
        }
    }

    impl<T: ValueTransfer> ValueTransfer for FailingTransfer<T> {
        fn transfer(
            &self,
            from: &AccountId,
            to: &AccountId,
            amount: Amount,
        ) -> Result<(), TransferError> {
            let targeted = self.only_to.as_ref().is_none_or(|only| only == to);
            if targeted
                && self
                    .failures_left
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok()
            {
                return Err(TransferError::Unavailable("injected failure".into()));
            }
            self.inner.transfer(from, to, amount)
        }
    }
}
