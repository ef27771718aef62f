//! The StackFlip engine: one ledger, one configuration, and the external
//! clock and value-transfer rail, behind a single handle.
//!
//! Every state-changing call reads the current height from the clock,
//! runs the matching component, and appends a [`Receipt`] to the journal.
//!
//! The journal is an audit trail, not the source of truth. A receipt is
//! appended after its operation commits, so concurrent operations are
//! journaled in completion order, which may differ from commit order. The
//! ledger is authoritative. Appending never fails an operation that has
//! already committed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use stackflip_ledger::{Escrow, FlipRegistry, Ledger, LedgerState, StakeBook};
use stackflip_types::{
    AccountId, Amount, BlockHeight, ChainClock, EngineConfig, Flip, FlipError, FlipId, FlipStatus,
    PoolSplit, Receipt, ReceiptType, Result, Side, StakeRecord, ValueTransfer, WalletProvider,
};

use crate::{
    claim::ClaimProcessor,
    conservation::{self, AuditReport},
    portfolio::Portfolio,
    resolution::{ResolutionEngine, ResolveOutcome},
    reward,
};

/// Settlement engine facade.
pub struct StackFlip {
    config: EngineConfig,
    ledger: Ledger,
    clock: Arc<dyn ChainClock>,
    rail: Arc<dyn ValueTransfer>,
    journal: Mutex<Vec<Receipt>>,
}

impl StackFlip {
    /// Start an engine over an empty ledger.
    ///
    /// # Errors
    /// `Configuration` if `config` does not validate.
    pub fn new(
        config: EngineConfig,
        clock: Arc<dyn ChainClock>,
        rail: Arc<dyn ValueTransfer>,
    ) -> Result<Self> {
        Self::with_ledger(config, Ledger::new(), clock, rail)
    }

    /// Start an engine over an existing ledger.
    pub fn with_ledger(
        config: EngineConfig,
        ledger: Ledger,
        clock: Arc<dyn ChainClock>,
        rail: Arc<dyn ValueTransfer>,
    ) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            engine = stackflip_types::constants::ENGINE_NAME,
            version = stackflip_types::constants::VERSION,
            owner = %config.owner,
            pool = %config.pool_account,
            fee_bps = config.fee_bps,
            "Engine started"
        );
        Ok(Self {
            config,
            ledger,
            clock,
            rail,
            journal: Mutex::new(Vec::new()),
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn current_height(&self) -> BlockHeight {
        self.clock.current_height()
    }

    /// The account behind `wallet`.
    ///
    /// # Errors
    /// `WalletNotConnected` if the wallet has no account.
    pub fn require_account(wallet: &dyn WalletProvider) -> Result<AccountId> {
        wallet
            .account_identity()
            .ok_or(FlipError::WalletNotConnected)
    }

    // =================================================================
    // State-changing operations
    // =================================================================

    pub fn create_flip(
        &self,
        creator: &AccountId,
        question: impl Into<String>,
        deadline: BlockHeight,
    ) -> Result<Flip> {
        let now = self.current_height();
        let flip = FlipRegistry::new(&self.ledger).create_flip(
            creator.clone(),
            question,
            deadline,
            now,
        )?;
        self.record(ReceiptType::FlipCreated, flip.id, creator, 0, now);
        Ok(flip)
    }

    pub fn stake(
        &self,
        flip_id: FlipId,
        account: &AccountId,
        side: Side,
        amount: Amount,
    ) -> Result<StakeRecord> {
        let now = self.current_height();
        let record =
            StakeBook::new(&self.ledger).stake(flip_id, account, side, amount, now, &self.escrow())?;
        self.record(ReceiptType::StakePlaced(side), flip_id, account, amount, now);
        Ok(record)
    }

    pub fn resolve(
        &self,
        flip_id: FlipId,
        caller: &AccountId,
        winning_side: Side,
    ) -> Result<ResolveOutcome> {
        let now = self.current_height();
        let outcome = self.resolution().resolve(flip_id, caller, winning_side, now, &self.escrow())?;
        let pool = outcome.flip.total_pool()?;
        self.record(ReceiptType::FlipResolved(winning_side), flip_id, caller, pool, now);
        if let Some(fee) = outcome.flip.platform_fee().filter(|f| *f > 0 && outcome.fee_paid()) {
            self.record(ReceiptType::FeePaid, flip_id, self.config.fee_recipient(), fee, now);
        }
        Ok(outcome)
    }

    pub fn retry_fee_payout(&self, flip_id: FlipId) -> Result<Amount> {
        let now = self.current_height();
        let fee = self.resolution().retry_fee_payout(flip_id, &self.escrow())?;
        self.record(ReceiptType::FeePaid, flip_id, self.config.fee_recipient(), fee, now);
        Ok(fee)
    }

    pub fn claim(&self, flip_id: FlipId, account: &AccountId) -> Result<Amount> {
        let now = self.current_height();
        let reward = ClaimProcessor::new(&self.ledger).claim(flip_id, account, &self.escrow())?;
        self.record(ReceiptType::RewardClaimed, flip_id, account, reward, now);
        Ok(reward)
    }

    // =================================================================
    // Queries
    // =================================================================

    pub fn get_flip(&self, flip_id: FlipId) -> Result<Flip> {
        FlipRegistry::new(&self.ledger).get_flip(flip_id)
    }

    pub fn flip_count(&self) -> Result<u64> {
        FlipRegistry::new(&self.ledger).count()
    }

    pub fn list_flips(&self) -> Result<Vec<Flip>> {
        FlipRegistry::new(&self.ledger).list()
    }

    pub fn flips_by_creator(&self, creator: &AccountId) -> Result<Vec<Flip>> {
        FlipRegistry::new(&self.ledger).by_creator(creator)
    }

    pub fn get_stake(&self, flip_id: FlipId, account: &AccountId) -> Result<StakeRecord> {
        StakeBook::new(&self.ledger).get_stake(flip_id, account)
    }

    pub fn stakes_for_flip(&self, flip_id: FlipId) -> Result<Vec<(AccountId, StakeRecord)>> {
        StakeBook::new(&self.ledger).stakes_for_flip(flip_id)
    }

    pub fn claimable_reward(&self, flip_id: FlipId, account: &AccountId) -> Result<Amount> {
        ClaimProcessor::new(&self.ledger).claimable_reward(flip_id, account)
    }

    pub fn flip_status(&self, flip_id: FlipId) -> Result<FlipStatus> {
        Ok(self.get_flip(flip_id)?.status(self.current_height()))
    }

    pub fn blocks_left(&self, flip_id: FlipId) -> Result<BlockHeight> {
        Ok(self.get_flip(flip_id)?.blocks_left(self.current_height()))
    }

    /// Display split of a flip's pools. Multipliers use the recorded
    /// distributable once resolved, or what it would be if resolved now.
    pub fn pool_split(&self, flip_id: FlipId) -> Result<PoolSplit> {
        let flip = self.get_flip(flip_id)?;
        let distributable = match flip.distributable() {
            Some(d) => d,
            None => reward::split_pool(flip.total_pool()?, &self.config)?.1,
        };
        Ok(PoolSplit::new(
            flip.total_yes_stake,
            flip.total_no_stake,
            distributable,
        ))
    }

    pub fn portfolio(&self, account: &AccountId) -> Result<Portfolio> {
        let now = self.current_height();
        self.ledger
            .read(|s| Portfolio::build(s, account, now))?
    }

    /// Recheck the value invariants of one flip.
    ///
    /// # Errors
    /// `NotFound` for an unknown flip, `ConservationViolation` on a breach.
    pub fn audit(&self, flip_id: FlipId) -> Result<AuditReport> {
        let (flip, stakes) = self.ledger.read(|s| {
            let flip = s.flip(flip_id).cloned();
            let stakes: Vec<(AccountId, StakeRecord)> = s
                .stakes_for_flip(flip_id)
                .map(|(a, r)| (a.clone(), r.clone()))
                .collect();
            (flip, stakes)
        })?;
        let flip = flip.ok_or(FlipError::NotFound(flip_id))?;
        let report = conservation::audit_flip(&flip, &stakes, &self.config).inspect_err(|e| {
            tracing::error!(flip = %flip_id, error = %e, "Conservation audit failed");
        })?;
        tracing::debug!(
            flip = %flip_id,
            entitled = report.entitled,
            stranded = report.stranded,
            "Audit passed"
        );
        Ok(report)
    }

    /// All receipts issued so far, in the order they were appended.
    #[must_use]
    pub fn receipts(&self) -> Vec<Receipt> {
        self.journal().clone()
    }

    #[must_use]
    pub fn receipts_for(&self, flip_id: FlipId) -> Vec<Receipt> {
        self.journal()
            .iter()
            .filter(|r| r.flip_id == flip_id)
            .cloned()
            .collect()
    }

    /// Clone of the committed ledger, e.g. for persistence.
    pub fn snapshot(&self) -> Result<LedgerState> {
        self.ledger.snapshot()
    }

    // -----------------------------------------------------------------

    fn escrow(&self) -> Escrow<'_> {
        Escrow::new(self.rail.as_ref(), &self.config.pool_account)
    }

    fn resolution(&self) -> ResolutionEngine<'_> {
        ResolutionEngine::new(&self.ledger, &self.config)
    }

    // Appends are single pushes, so a poisoned journal is still whole.
    fn journal(&self) -> MutexGuard<'_, Vec<Receipt>> {
        self.journal.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(
        &self,
        receipt_type: ReceiptType,
        flip_id: FlipId,
        account: &AccountId,
        amount: Amount,
        height: BlockHeight,
    ) {
        let receipt = Receipt::issue(receipt_type, flip_id, account.clone(), amount, height);
        tracing::debug!(
            receipt = %receipt.id,
            kind = %receipt.receipt_type,
            hash = %receipt.payload_hash_hex(),
            "Receipt issued"
        );
        self.journal().push(receipt);
    }
}
