//! Ledger store — the keyed tables behind every flip and stake.
//!
//! All mutations are atomic: a [`LedgerTxn`] stages writes against a
//! read-only view of the committed state, and [`Ledger::transact`] applies
//! them only if the closure returns `Ok`. On error the committed state is
//! exactly what it was before the call.
//!
//! Transactions are serialized by a single mutex, so the id counter, pool
//! totals and claim flags are linearizable under concurrent callers. That
//! mutex is only held for in-memory work; it is never held across a call to
//! the value-transfer rail.
//!
//! Operations that move value hold their flip's lock instead
//! ([`Ledger::with_flip`]). Calls on the same flip run one at a time, calls
//! on different flips never wait for each other. Lock order is always flip
//! lock first, then the ledger mutex.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use stackflip_types::{
    AccountId, Flip, FlipError, FlipId, Result, StakeKey, StakeRecord, constants,
};

/// Committed ledger contents.
#[derive(Debug, Clone)]
pub struct LedgerState {
    /// Id the next created flip receives.
    next_flip_id: FlipId,
    /// `propositions` table.
    flips: BTreeMap<FlipId, Flip>,
    /// `stakes` table.
    stakes: BTreeMap<StakeKey, StakeRecord>,
}

impl LedgerState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_flip_id: FlipId(constants::FIRST_FLIP_ID),
            flips: BTreeMap::new(),
            stakes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn flip(&self, flip_id: FlipId) -> Option<&Flip> {
        self.flips.get(&flip_id)
    }

    #[must_use]
    pub fn stake(&self, flip_id: FlipId, account: &AccountId) -> Option<&StakeRecord> {
        self.stakes.get(&(flip_id, account.clone()))
    }

    /// Number of flips ever created. Never decreases.
    #[must_use]
    pub fn flip_count(&self) -> u64 {
        self.next_flip_id.0 - constants::FIRST_FLIP_ID
    }

    /// All flips in id order.
    pub fn flips(&self) -> impl Iterator<Item = &Flip> {
        self.flips.values()
    }

    /// All stake records of one flip, in account order.
    pub fn stakes_for_flip(
        &self,
        flip_id: FlipId,
    ) -> impl Iterator<Item = (&AccountId, &StakeRecord)> {
        self.stakes
            .range((flip_id, AccountId::new(String::new()))..)
            .take_while(move |((id, _), _)| *id == flip_id)
            .map(|((_, account), record)| (account, record))
    }

    /// All stake records held by one account, in flip order.
    pub fn stakes_for_account<'a>(
        &'a self,
        account: &'a AccountId,
    ) -> impl Iterator<Item = (FlipId, &'a StakeRecord)> + 'a {
        self.stakes
            .iter()
            .filter(move |((_, holder), _)| holder == account)
            .map(|((id, _), record)| (*id, record))
    }

    fn apply(&mut self, writes: StagedWrites) {
        self.next_flip_id = writes.next_flip_id;
        self.flips.extend(writes.flips);
        self.stakes.extend(writes.stakes);
    }
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new()
    }
}

struct StagedWrites {
    next_flip_id: FlipId,
    flips: BTreeMap<FlipId, Flip>,
    stakes: BTreeMap<StakeKey, StakeRecord>,
}

/// A read-modify-write view over the ledger.
///
/// Reads see this transaction's own staged writes first, then the
/// committed state. Nothing is visible to other callers until commit.
pub struct LedgerTxn<'a> {
    base: &'a LedgerState,
    staged: StagedWrites,
}

impl<'a> LedgerTxn<'a> {
    fn new(base: &'a LedgerState) -> Self {
        Self {
            base,
            staged: StagedWrites {
                next_flip_id: base.next_flip_id,
                flips: BTreeMap::new(),
                stakes: BTreeMap::new(),
            },
        }
    }

    #[must_use]
    pub fn flip(&self, flip_id: FlipId) -> Option<&Flip> {
        self.staged
            .flips
            .get(&flip_id)
            .or_else(|| self.base.flip(flip_id))
    }

    /// Owned copy of a flip, for modification.
    ///
    /// # Errors
    /// `NotFound` if no such flip exists.
    pub fn require_flip(&self, flip_id: FlipId) -> Result<Flip> {
        self.flip(flip_id)
            .cloned()
            .ok_or(FlipError::NotFound(flip_id))
    }

    /// Whether a stake record exists for this pair.
    #[must_use]
    pub fn has_stake(&self, flip_id: FlipId, account: &AccountId) -> bool {
        let key = (flip_id, account.clone());
        self.staged.stakes.contains_key(&key) || self.base.stakes.contains_key(&key)
    }

    /// Owned copy of a stake record, or the empty record if none exists.
    #[must_use]
    pub fn stake(&self, flip_id: FlipId, account: &AccountId) -> StakeRecord {
        let key = (flip_id, account.clone());
        self.staged
            .stakes
            .get(&key)
            .or_else(|| self.base.stakes.get(&key))
            .cloned()
            .unwrap_or_default()
    }

    /// Reserve the next flip id.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the id space is exhausted.
    pub fn allocate_flip_id(&mut self) -> Result<FlipId> {
        let id = self.staged.next_flip_id;
        let next = id
            .0
            .checked_add(1)
            .ok_or_else(|| FlipError::overflow("flip id counter"))?;
        self.staged.next_flip_id = FlipId(next);
        Ok(id)
    }

    pub fn put_flip(&mut self, flip: Flip) {
        self.staged.flips.insert(flip.id, flip);
    }

    pub fn put_stake(&mut self, flip_id: FlipId, account: AccountId, record: StakeRecord) {
        self.staged.stakes.insert((flip_id, account), record);
    }

    fn into_writes(self) -> StagedWrites {
        self.staged
    }
}

/// The in-process ledger store.
pub struct Ledger {
    state: Mutex<LedgerState>,
    flip_locks: Mutex<HashMap<FlipId, Arc<Mutex<()>>>>,
}

impl Ledger {
    /// Create an empty ledger. The first flip will get id 1.
    #[must_use]
    pub fn new() -> Self {
        Self::from_state(LedgerState::new())
    }

    /// Restore a ledger from a previously taken [`snapshot`](Self::snapshot).
    #[must_use]
    pub fn from_state(state: LedgerState) -> Self {
        Self {
            state: Mutex::new(state),
            flip_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` as one all-or-nothing unit.
    ///
    /// # Errors
    /// Whatever `f` returns, or `Internal` if the ledger lock is poisoned.
    pub fn transact<T>(&self, f: impl FnOnce(&mut LedgerTxn<'_>) -> Result<T>) -> Result<T> {
        let mut state = self.lock()?;
        let mut txn = LedgerTxn::new(&state);
        let out = f(&mut txn)?;
        let writes = txn.into_writes();
        state.apply(writes);
        Ok(out)
    }

    /// Read the committed state.
    ///
    /// # Errors
    /// `Internal` if the ledger lock is poisoned.
    pub fn read<T>(&self, f: impl FnOnce(&LedgerState) -> T) -> Result<T> {
        let state = self.lock()?;
        Ok(f(&state))
    }

    /// Clone of the committed state.
    pub fn snapshot(&self) -> Result<LedgerState> {
        self.read(LedgerState::clone)
    }

    /// Run `f` holding the lock of one flip.
    ///
    /// `f` may call [`transact`](Self::transact) and [`read`](Self::read)
    /// any number of times and may move value in between. It must not call
    /// `with_flip` for the same flip again.
    ///
    /// # Errors
    /// Whatever `f` returns, or `Internal` if the lock table is poisoned.
    pub fn with_flip<T>(&self, flip_id: FlipId, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = self.flip_lock(flip_id)?;
        // Guards no data of its own; ledger state stays consistent after a panic.
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    fn flip_lock(&self, flip_id: FlipId) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .flip_locks
            .lock()
            .map_err(|_| FlipError::Internal("flip lock table poisoned".into()))?;
        Ok(Arc::clone(locks.entry(flip_id).or_default()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>> {
        self.state
            .lock()
            .map_err(|_| FlipError::Internal("ledger lock poisoned".into()))
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
