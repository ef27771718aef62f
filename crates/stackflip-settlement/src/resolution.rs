//! Resolution engine — fixes the outcome of a flip and pays the platform fee.
//!
//! Resolution runs in two ledger transactions:
//!
//! 1. Validate and set all resolution fields at once. The fee is recorded
//!    as [`FeePayout::Pending`] (or `Paid` if it is zero).
//! 2. Move the fee from escrow to the fee recipient and mark it `Paid`.
//!
//! A failure in step 2 never undoes step 1. The fee stays in escrow and
//! [`ResolutionEngine::retry_fee_payout`] can move it later.
//!
//! Both steps, and every retry, hold the flip's lock, so the fee is paid at
//! most once and a retry can never slip in between them. The transfer
//! itself runs outside the ledger mutex; a slow fee recipient delays only
//! this flip.

use stackflip_ledger::{Escrow, Ledger};
use stackflip_types::{
    AccountId, Amount, BlockHeight, EngineConfig, FeePayout, Flip, FlipError, FlipId, Resolution,
    Result, Side,
};

use crate::reward;

/// Result of a successful [`ResolutionEngine::resolve`].
#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    /// The flip as committed, including the final fee payout state.
    pub flip: Flip,
    /// Why the fee payout was deferred, if it was.
    pub fee_error: Option<FlipError>,
}

impl ResolveOutcome {
    #[must_use]
    pub fn fee_paid(&self) -> bool {
        self.flip
            .resolution
            .as_ref()
            .is_some_and(|r| r.fee_payout == FeePayout::Paid)
    }
}

/// Resolves flips on behalf of their creator or the engine owner.
pub struct ResolutionEngine<'a> {
    ledger: &'a Ledger,
    config: &'a EngineConfig,
}

impl<'a> ResolutionEngine<'a> {
    #[must_use]
    pub fn new(ledger: &'a Ledger, config: &'a EngineConfig) -> Self {
        Self { ledger, config }
    }

    /// Resolve a flip with `winning_side`.
    ///
    /// # Errors
    /// Checked in this order:
    /// - `NotFound` if the flip does not exist
    /// - `NotAuthorized` unless `caller` is the creator or the owner
    /// - `DeadlineNotReached` if `now < deadline`
    /// - `AlreadyResolved` if the flip was resolved before
    ///
    /// A failed fee transfer is not an error here; see
    /// [`ResolveOutcome::fee_error`].
    pub fn resolve(
        &self,
        flip_id: FlipId,
        caller: &AccountId,
        winning_side: Side,
        now: BlockHeight,
        escrow: &Escrow<'_>,
    ) -> Result<ResolveOutcome> {
        self.ledger.with_flip(flip_id, || {
            let flip = self.ledger.transact(|txn| {
                let mut flip = txn.require_flip(flip_id)?;
                if caller != &flip.creator && caller != &self.config.owner {
                    return Err(FlipError::NotAuthorized {
                        flip_id,
                        caller: caller.clone(),
                    });
                }
                if now < flip.deadline {
                    return Err(FlipError::DeadlineNotReached {
                        flip_id,
                        deadline: flip.deadline,
                        now,
                    });
                }
                if flip.is_resolved() {
                    return Err(FlipError::AlreadyResolved(flip_id));
                }

                let (platform_fee, distributable) =
                    reward::split_pool(flip.total_pool()?, self.config)?;
                flip.resolution = Some(Resolution {
                    winning_side,
                    platform_fee,
                    distributable,
                    resolved_at: now,
                    fee_payout: if platform_fee == 0 {
                        FeePayout::Paid
                    } else {
                        FeePayout::Pending
                    },
                });
                txn.put_flip(flip.clone());
                Ok(flip)
            })?;

            tracing::info!(
                flip = %flip_id,
                caller = %caller,
                winning_side = %winning_side,
                total_yes = flip.total_yes_stake,
                total_no = flip.total_no_stake,
                platform_fee = flip.platform_fee().unwrap_or_default(),
                distributable = flip.distributable().unwrap_or_default(),
                "Flip resolved"
            );

            if flip.platform_fee().unwrap_or_default() == 0 {
                return Ok(ResolveOutcome {
                    flip,
                    fee_error: None,
                });
            }

            match self.pay_fee(flip_id, escrow) {
                Ok((flip, _)) => Ok(ResolveOutcome {
                    flip,
                    fee_error: None,
                }),
                Err(e) => {
                    tracing::warn!(
                        flip = %flip_id,
                        error = %e,
                        "Fee payout deferred; fee held in escrow"
                    );
                    Ok(ResolveOutcome {
                        flip,
                        fee_error: Some(e),
                    })
                }
            }
        })
    }

    /// Pay a fee that was deferred at resolution. Returns the amount paid.
    ///
    /// # Errors
    /// - `NotFound` if the flip does not exist
    /// - `NotResolved` if the flip has not been resolved
    /// - `FeeAlreadyPaid` if the fee already left escrow
    /// - `TransferFailed` if the rail refused again (state unchanged)
    pub fn retry_fee_payout(&self, flip_id: FlipId, escrow: &Escrow<'_>) -> Result<Amount> {
        let (_, fee) = self.ledger.with_flip(flip_id, || self.pay_fee(flip_id, escrow))?;
        Ok(fee)
    }

    /// Caller holds the flip's lock.
    fn pay_fee(&self, flip_id: FlipId, escrow: &Escrow<'_>) -> Result<(Flip, Amount)> {
        let recipient = self.config.fee_recipient();
        let fee = self.ledger.read(|s| -> Result<Amount> {
            let flip = s.flip(flip_id).ok_or(FlipError::NotFound(flip_id))?;
            let resolution = flip
                .resolution
                .as_ref()
                .ok_or(FlipError::NotResolved(flip_id))?;
            if resolution.fee_payout == FeePayout::Paid {
                return Err(FlipError::FeeAlreadyPaid(flip_id));
            }
            Ok(resolution.platform_fee)
        })??;

        escrow.pay_out(recipient, fee)?;

        let flip = self.ledger.transact(|txn| {
            let mut flip = txn.require_flip(flip_id)?;
            if let Some(resolution) = flip.resolution.as_mut() {
                resolution.fee_payout = FeePayout::Paid;
            }
            txn.put_flip(flip.clone());
            Ok(flip)
        })?;

        tracing::info!(flip = %flip_id, recipient = %recipient, fee, "Platform fee paid");
        Ok((flip, fee))
    }
}

#[cfg(test)]
mod tests {
    use stackflip_ledger::{FlipRegistry, StakeBook};
    use stackflip_types::{FailingTransfer, GatedTransfer, RecordingTransfer, ValueTransfer};

    use super::*;

    fn owner() -> AccountId {
        AccountId::from("ST_OWNER")
    }

    fn config() -> EngineConfig {
        EngineConfig::new(owner(), AccountId::from("ST_POOL"))
    }

    /// Flip 1, created by fixture 1 at height 100 with deadline 200,
    /// holding 3M YES and 1M NO.
    fn staked_flip(ledger: &Ledger, config: &EngineConfig, rail: &dyn ValueTransfer) -> FlipId {
        let id = FlipRegistry::new(ledger)
            .create_flip(AccountId::fixture(1), "Will BTC hit 100k?", 200, 100)
            .unwrap()
            .id;
        let escrow = Escrow::new(rail, &config.pool_account);
        let book = StakeBook::new(ledger);
        book.stake(id, &AccountId::fixture(2), Side::Yes, 2_000_000, 120, &escrow)
            .unwrap();
        book.stake(id, &AccountId::fixture(3), Side::Yes, 1_000_000, 130, &escrow)
            .unwrap();
        book.stake(id, &AccountId::fixture(4), Side::No, 1_000_000, 140, &escrow)
            .unwrap();
        id
    }

    #[test]
    fn creator_resolves_and_fee_is_paid() {
        let (ledger, config, rail) = (Ledger::new(), config(), RecordingTransfer::default());
        let id = staked_flip(&ledger, &config, &rail);
        let escrow = Escrow::new(&rail, &config.pool_account);
        let engine = ResolutionEngine::new(&ledger, &config);

        let out = engine
            .resolve(id, &AccountId::fixture(1), Side::Yes, 200, &escrow)
            .unwrap();
        assert!(out.fee_paid());
        assert!(out.fee_error.is_none());
        let r = out.flip.resolution.unwrap();
        assert_eq!(r.winning_side, Side::Yes);
        assert_eq!(r.platform_fee, 80_000);
        assert_eq!(r.distributable, 3_920_000);
        assert_eq!(r.resolved_at, 200);
        assert_eq!(rail.received_by(&owner()), 80_000);
    }

    #[test]
    fn owner_may_resolve_any_flip() {
        let (ledger, config, rail) = (Ledger::new(), config(), RecordingTransfer::default());
        let id = staked_flip(&ledger, &config, &rail);
        let escrow = Escrow::new(&rail, &config.pool_account);
        let out = ResolutionEngine::new(&ledger, &config)
            .resolve(id, &owner(), Side::No, 250, &escrow)
            .unwrap();
        assert_eq!(out.flip.winning_side(), Some(Side::No));
    }

    #[test]
    fn stranger_is_not_authorized_even_before_deadline() {
        let (ledger, config, rail) = (Ledger::new(), config(), RecordingTransfer::default());
        let id = staked_flip(&ledger, &config, &rail);
        let escrow = Escrow::new(&rail, &config.pool_account);
        let engine = ResolutionEngine::new(&ledger, &config);
        let stranger = AccountId::fixture(9);
        for now in [150, 250] {
            let err = engine
                .resolve(id, &stranger, Side::Yes, now, &escrow)
                .unwrap_err();
            assert_eq!(
                err,
                FlipError::NotAuthorized {
                    flip_id: id,
                    caller: stranger.clone()
                }
            );
        }
    }

    #[test]
    fn early_and_repeated_resolution_rejected() {
        let (ledger, config, rail) = (Ledger::new(), config(), RecordingTransfer::default());
        let id = staked_flip(&ledger, &config, &rail);
        let escrow = Escrow::new(&rail, &config.pool_account);
        let engine = ResolutionEngine::new(&ledger, &config);
        let creator = AccountId::fixture(1);

        let err = engine
            .resolve(id, &creator, Side::Yes, 199, &escrow)
            .unwrap_err();
        assert!(matches!(err, FlipError::DeadlineNotReached { deadline: 200, now: 199, .. }));

        engine.resolve(id, &creator, Side::Yes, 200, &escrow).unwrap();
        let err = engine
            .resolve(id, &creator, Side::No, 201, &escrow)
            .unwrap_err();
        assert_eq!(err, FlipError::AlreadyResolved(id));
        // Outcome unchanged by the rejected call.
        let flip = FlipRegistry::new(&ledger).get_flip(id).unwrap();
        assert_eq!(flip.winning_side(), Some(Side::Yes));
        assert_eq!(rail.received_by(&owner()), 80_000);
    }

    #[test]
    fn missing_flip_not_found() {
        let (ledger, config, rail) = (Ledger::new(), config(), RecordingTransfer::default());
        let escrow = Escrow::new(&rail, &config.pool_account);
        let err = ResolutionEngine::new(&ledger, &config)
            .resolve(FlipId(5), &owner(), Side::Yes, 1_000, &escrow)
            .unwrap_err();
        assert_eq!(err, FlipError::NotFound(FlipId(5)));
    }

    #[test]
    fn failed_fee_payout_is_deferred_then_retried() {
        let (ledger, config) = (Ledger::new(), config());
        let rail = FailingTransfer::new(RecordingTransfer::default()).only_to(owner());
        let id = staked_flip(&ledger, &config, &rail);
        let escrow = Escrow::new(&rail, &config.pool_account);
        let engine = ResolutionEngine::new(&ledger, &config);

        rail.fail_next(2);
        let out = engine
            .resolve(id, &AccountId::fixture(1), Side::Yes, 200, &escrow)
            .unwrap();
        assert!(!out.fee_paid());
        assert!(matches!(out.fee_error, Some(FlipError::TransferFailed { .. })));
        // Resolution is committed regardless.
        let flip = FlipRegistry::new(&ledger).get_flip(id).unwrap();
        assert!(flip.is_resolved());
        assert_eq!(flip.resolution.as_ref().unwrap().fee_payout, FeePayout::Pending);

        assert!(matches!(
            engine.retry_fee_payout(id, &escrow),
            Err(FlipError::TransferFailed { .. })
        ));
        assert_eq!(engine.retry_fee_payout(id, &escrow).unwrap(), 80_000);
        assert_eq!(
            engine.retry_fee_payout(id, &escrow).unwrap_err(),
            FlipError::FeeAlreadyPaid(id)
        );
        assert_eq!(rail.inner().received_by(&owner()), 80_000);
    }

    #[test]
    fn retry_on_unresolved_flip_rejected() {
        let (ledger, config, rail) = (Ledger::new(), config(), RecordingTransfer::default());
        let id = staked_flip(&ledger, &config, &rail);
        let escrow = Escrow::new(&rail, &config.pool_account);
        assert_eq!(
            ResolutionEngine::new(&ledger, &config)
                .retry_fee_payout(id, &escrow)
                .unwrap_err(),
            FlipError::NotResolved(id)
        );
    }

    #[test]
    fn empty_flip_resolves_with_zero_fee() {
        let (ledger, config, rail) = (Ledger::new(), config(), RecordingTransfer::default());
        let id = FlipRegistry::new(&ledger)
            .create_flip(AccountId::fixture(1), "Nobody cares?", 200, 100)
            .unwrap()
            .id;
        let escrow = Escrow::new(&rail, &config.pool_account);
        let out = ResolutionEngine::new(&ledger, &config)
            .resolve(id, &owner(), Side::No, 300, &escrow)
            .unwrap();
        assert!(out.fee_paid());
        assert_eq!(out.flip.platform_fee(), Some(0));
        assert_eq!(out.flip.distributable(), Some(0));
        assert!(rail.moves().is_empty());
    }

    #[test]
    fn slow_fee_recipient_blocks_only_its_own_flip() {
        let (ledger, config) = (Ledger::new(), config());
        let rail = GatedTransfer::new(RecordingTransfer::default(), owner());
        let slow = staked_flip(&ledger, &config, &rail);
        let other = FlipRegistry::new(&ledger)
            .create_flip(AccountId::fixture(5), "Will ETH flip BTC?", 400, 100)
            .unwrap()
            .id;
        let escrow = Escrow::new(&rail, &config.pool_account);
        let engine = ResolutionEngine::new(&ledger, &config);

        let (outcome, retried) = std::thread::scope(|s| {
            let resolving =
                s.spawn(|| engine.resolve(slow, &AccountId::fixture(1), Side::Yes, 200, &escrow));
            rail.wait_until_held();

            // The fee transfer is in flight. Unrelated flips stay usable.
            assert!(FlipRegistry::new(&ledger).get_flip(other).is_ok());
            StakeBook::new(&ledger)
                .stake(other, &AccountId::fixture(6), Side::No, 500, 250, &escrow)
                .unwrap();
            // Resolution itself is already visible, fee still pending.
            let flip = FlipRegistry::new(&ledger).get_flip(slow).unwrap();
            assert_eq!(flip.resolution.unwrap().fee_payout, FeePayout::Pending);

            // A retry racing the resolve waits for it instead of paying again.
            let retrying = s.spawn(|| engine.retry_fee_payout(slow, &escrow));
            rail.release();
            (resolving.join().unwrap(), retrying.join().unwrap())
        });

        let outcome = outcome.unwrap();
        assert!(outcome.fee_paid());
        assert!(outcome.fee_error.is_none());
        assert_eq!(retried.unwrap_err(), FlipError::FeeAlreadyPaid(slow));
        assert_eq!(rail.inner().received_by(&owner()), 80_000);
        assert_eq!(
            FlipRegistry::new(&ledger).get_flip(other).unwrap().total_no_stake,
            500
        );
    }
}
