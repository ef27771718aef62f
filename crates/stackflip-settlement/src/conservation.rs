//! Per-flip value conservation audit.
//!
//! Invariants checked for one flip:
//! ```text
//! Σ stake.yes_amount == total_yes_stake
//! Σ stake.no_amount  == total_no_stake
//! platform_fee + distributable == total_yes_stake + total_no_stake   (resolved)
//! platform_fee == floor(total_pool * fee_bps / bps_denominator)       (resolved)
//! Σ entitlement <= distributable                                      (resolved)
//! distributable - Σ entitlement < winning_pool                       (resolved, winning_pool > 0)
//! ```
//!
//! A breach means the ledger was corrupted; nothing in normal operation
//! can produce one.

use serde::{Deserialize, Serialize};
use stackflip_types::{AccountId, Amount, EngineConfig, Flip, FlipError, FlipId, Result, StakeRecord};

use crate::reward;

/// Figures recomputed by [`audit_flip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub flip_id: FlipId,
    pub total_pool: Amount,
    /// `None` while unresolved.
    pub platform_fee: Option<Amount>,
    /// `None` while unresolved.
    pub distributable: Option<Amount>,
    /// Sum of all winners' rewards, claimed or not.
    pub entitled: Amount,
    /// Part of `entitled` already claimed.
    pub claimed: Amount,
    /// Truncation remainder left in escrow for good.
    pub stranded: Amount,
}

/// Audit `flip` against the full set of its stake records.
///
/// # Errors
/// `ConservationViolation` naming the first invariant that fails.
pub fn audit_flip(
    flip: &Flip,
    stakes: &[(AccountId, StakeRecord)],
    config: &EngineConfig,
) -> Result<AuditReport> {
    let violation = |reason: String| FlipError::ConservationViolation {
        flip_id: flip.id,
        reason,
    };

    let yes_sum: u128 = stakes.iter().map(|(_, r)| u128::from(r.yes_amount)).sum();
    let no_sum: u128 = stakes.iter().map(|(_, r)| u128::from(r.no_amount)).sum();
    if yes_sum != u128::from(flip.total_yes_stake) {
        return Err(violation(format!(
            "YES stakes sum to {yes_sum}, pool records {}",
            flip.total_yes_stake
        )));
    }
    if no_sum != u128::from(flip.total_no_stake) {
        return Err(violation(format!(
            "NO stakes sum to {no_sum}, pool records {}",
            flip.total_no_stake
        )));
    }
    let total_pool = flip
        .total_pool()
        .map_err(|_| violation("pool total overflows".into()))?;

    let Some(resolution) = &flip.resolution else {
        return Ok(AuditReport {
            flip_id: flip.id,
            total_pool,
            platform_fee: None,
            distributable: None,
            entitled: 0,
            claimed: 0,
            stranded: 0,
        });
    };

    let (fee, distributable) = (resolution.platform_fee, resolution.distributable);
    if u128::from(fee) + u128::from(distributable) != u128::from(total_pool) {
        return Err(violation(format!(
            "fee {fee} + distributable {distributable} != pool {total_pool}"
        )));
    }
    let expected_fee = reward::platform_fee(total_pool, config)?;
    if fee != expected_fee {
        return Err(violation(format!(
            "recorded fee {fee}, expected {expected_fee}"
        )));
    }

    let mut entitled: u128 = 0;
    let mut claimed: u128 = 0;
    for (_, record) in stakes {
        let share = u128::from(reward::entitlement(flip, record)?);
        entitled += share;
        if record.claimed {
            claimed += share;
        }
    }
    if entitled > u128::from(distributable) {
        return Err(violation(format!(
            "entitlements {entitled} exceed distributable {distributable}"
        )));
    }
    let winning_pool = flip.side_pool(resolution.winning_side);
    let stranded = u128::from(distributable) - entitled;
    if winning_pool > 0 && stranded >= u128::from(winning_pool) {
        return Err(violation(format!(
            "remainder {stranded} not below winning pool {winning_pool}"
        )));
    }

    let narrow = |v: u128| Amount::try_from(v).map_err(|_| FlipError::overflow("audit total"));
    Ok(AuditReport {
        flip_id: flip.id,
        total_pool,
        platform_fee: Some(fee),
        distributable: Some(distributable),
        entitled: narrow(entitled)?,
        claimed: narrow(claimed)?,
        stranded: narrow(stranded)?,
    })
}

#[cfg(test)]
mod tests {
    use stackflip_types::{FeePayout, Resolution, Side};

    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::new(AccountId::from("ST_OWNER"), AccountId::from("ST_POOL"))
    }

    fn stakes() -> Vec<(AccountId, StakeRecord)> {
        vec![
            (
                AccountId::fixture(2),
                StakeRecord {
                    yes_amount: 2_000_000,
                    ..StakeRecord::default()
                },
            ),
            (
                AccountId::fixture(3),
                StakeRecord {
                    yes_amount: 1_000_000,
                    claimed: true,
                    ..StakeRecord::default()
                },
            ),
            (
                AccountId::fixture(4),
                StakeRecord {
                    no_amount: 1_000_000,
                    ..StakeRecord::default()
                },
            ),
        ]
    }

    fn flip(resolution: Option<Resolution>) -> Flip {
        let mut f = Flip::new(FlipId(1), AccountId::fixture(1), "q?".into(), 200, 100);
        f.total_yes_stake = 3_000_000;
        f.total_no_stake = 1_000_000;
        f.resolution = resolution;
        f
    }

    fn resolved_yes(fee: Amount, distributable: Amount) -> Option<Resolution> {
        Some(Resolution {
            winning_side: Side::Yes,
            platform_fee: fee,
            distributable,
            resolved_at: 200,
            fee_payout: FeePayout::Paid,
        })
    }

    #[test]
    fn open_flip_balances() {
        let report = audit_flip(&flip(None), &stakes(), &config()).unwrap();
        assert_eq!(report.total_pool, 4_000_000);
        assert_eq!(report.platform_fee, None);
        assert_eq!(report.entitled, 0);
    }

    #[test]
    fn resolved_flip_reports_remainder() {
        let report = audit_flip(&flip(resolved_yes(80_000, 3_920_000)), &stakes(), &config())
            .unwrap();
        assert_eq!(report.entitled, 3_919_999);
        assert_eq!(report.claimed, 1_306_666);
        assert_eq!(report.stranded, 1);
    }

    #[test]
    fn pool_mismatch_detected() {
        let mut f = flip(None);
        f.total_no_stake += 1;
        let err = audit_flip(&f, &stakes(), &config()).unwrap_err();
        assert!(matches!(err, FlipError::ConservationViolation { .. }));
        assert_eq!(err.code(), 801);
    }

    #[test]
    fn fee_split_mismatch_detected() {
        let err = audit_flip(&flip(resolved_yes(80_000, 3_920_001)), &stakes(), &config())
            .unwrap_err();
        assert!(err.to_string().contains("distributable"));

        let err = audit_flip(&flip(resolved_yes(79_999, 3_920_001)), &stakes(), &config())
            .unwrap_err();
        assert!(err.to_string().contains("expected 80000"));
    }

    #[test]
    fn winning_side_with_no_backers_strands_everything() {
        let mut f = flip(None);
        f.total_no_stake = 0;
        f.resolution = Some(Resolution {
            winning_side: Side::No,
            platform_fee: 60_000,
            distributable: 2_940_000,
            resolved_at: 200,
            fee_payout: FeePayout::Paid,
        });
        let report = audit_flip(&f, &stakes()[..2], &config()).unwrap();
        assert_eq!(report.entitled, 0);
        assert_eq!(report.stranded, 2_940_000);
    }
}
