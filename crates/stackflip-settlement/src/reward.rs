//! Reward calculator — the pure payout arithmetic.
//!
//! ```text
//! platform_fee  = floor(total_pool * fee_bps / bps_denominator)
//! distributable = total_pool - platform_fee
//! reward        = floor(stake_on_winning_side * distributable / winning_pool)
//! ```
//!
//! Products are formed in `u128`, so no realistic stake size can overflow
//! them. Division truncates; the remainder of each reward is left in the
//! pool and never redistributed. Summed over all winners it stays below
//! the size of the winning pool.

use stackflip_types::{Amount, EngineConfig, Flip, FlipError, Result, StakeRecord};

/// Platform fee taken from a pool of `total_pool`.
///
/// # Errors
/// `Configuration` if the denominator is zero.
pub fn platform_fee(total_pool: Amount, config: &EngineConfig) -> Result<Amount> {
    if config.bps_denominator == 0 {
        return Err(FlipError::Configuration(
            "bps_denominator must be > 0".into(),
        ));
    }
    let fee = u128::from(total_pool) * u128::from(config.fee_bps)
        / u128::from(config.bps_denominator);
    Amount::try_from(fee).map_err(|_| FlipError::overflow(format!("fee on pool {total_pool}")))
}

/// Split a pool into `(platform_fee, distributable)`. The two always sum
/// to `total_pool`.
///
/// # Errors
/// `Configuration` for an unusable fee rate, `ArithmeticOverflow` if the
/// fee would exceed the pool.
pub fn split_pool(total_pool: Amount, config: &EngineConfig) -> Result<(Amount, Amount)> {
    let fee = platform_fee(total_pool, config)?;
    let distributable = total_pool.checked_sub(fee).ok_or_else(|| {
        FlipError::overflow(format!("fee {fee} exceeds pool {total_pool}"))
    })?;
    Ok((fee, distributable))
}

/// A winner's share of `distributable`.
///
/// Returns 0 when `winning_pool` is 0: nobody backed the winning side and
/// the distributable amount stays unclaimed.
///
/// # Errors
/// `ArithmeticOverflow` if the quotient does not fit an [`Amount`], which
/// only happens when `staker_winning_amount > winning_pool`.
pub fn compute_reward(
    staker_winning_amount: Amount,
    winning_pool: Amount,
    distributable: Amount,
) -> Result<Amount> {
    if winning_pool == 0 {
        return Ok(0);
    }
    let reward = u128::from(staker_winning_amount) * u128::from(distributable)
        / u128::from(winning_pool);
    Amount::try_from(reward).map_err(|_| {
        FlipError::overflow(format!(
            "reward for {staker_winning_amount} of {winning_pool} over {distributable}"
        ))
    })
}

/// What `record` is entitled to from `flip`, ignoring the claimed flag.
///
/// 0 for unresolved flips and for accounts with nothing on the winning side.
pub fn entitlement(flip: &Flip, record: &StakeRecord) -> Result<Amount> {
    let Some(resolution) = &flip.resolution else {
        return Ok(0);
    };
    let side = resolution.winning_side;
    compute_reward(
        record.amount_on(side),
        flip.side_pool(side),
        resolution.distributable,
    )
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use stackflip_types::AccountId;

    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::new(AccountId::from("ST_OWNER"), AccountId::from("ST_POOL"))
    }

    #[test]
    fn fee_is_two_percent_truncated() {
        let c = config();
        assert_eq!(platform_fee(4_000_000, &c).unwrap(), 80_000);
        assert_eq!(platform_fee(3_000_000, &c).unwrap(), 60_000);
        assert_eq!(platform_fee(1_000_000, &c).unwrap(), 20_000);
        assert_eq!(platform_fee(49, &c).unwrap(), 0);
        assert_eq!(platform_fee(99, &c).unwrap(), 1);
        assert_eq!(platform_fee(0, &c).unwrap(), 0);
    }

    #[test]
    fn fee_on_large_pools_does_not_overflow() {
        let c = config();
        assert_eq!(
            platform_fee(2_000_000_000_000, &c).unwrap(),
            40_000_000_000
        );
        assert_eq!(platform_fee(Amount::MAX, &c).unwrap(), Amount::MAX / 50);
    }

    #[test]
    fn split_sums_to_pool() {
        let c = config();
        let (fee, distributable) = split_pool(4_000_000, &c).unwrap();
        assert_eq!((fee, distributable), (80_000, 3_920_000));
        let (fee, distributable) = split_pool(Amount::MAX, &c).unwrap();
        assert_eq!(fee + distributable, Amount::MAX);
    }

    #[test]
    fn zero_denominator_is_config_error() {
        let c = EngineConfig {
            bps_denominator: 0,
            ..config()
        };
        assert!(matches!(
            platform_fee(100, &c),
            Err(FlipError::Configuration(_))
        ));
    }

    #[test]
    fn rewards_for_three_staker_scenario() {
        assert_eq!(compute_reward(1_000_000, 3_000_000, 3_920_000).unwrap(), 1_306_666);
        assert_eq!(compute_reward(2_000_000, 3_000_000, 3_920_000).unwrap(), 2_613_333);
    }

    #[test]
    fn sole_winner_takes_everything() {
        assert_eq!(compute_reward(1_000_000, 1_000_000, 980_000).unwrap(), 980_000);
    }

    #[test]
    fn empty_winning_pool_pays_nothing() {
        assert_eq!(compute_reward(0, 0, 1_000).unwrap(), 0);
        assert_eq!(compute_reward(500, 0, 1_000).unwrap(), 0);
    }

    #[test]
    fn large_products_use_wide_intermediate() {
        let big = Amount::MAX / 2;
        assert_eq!(compute_reward(big, big, big).unwrap(), big);
    }

    #[test]
    fn truncation_remainder_is_below_winning_pool() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let stakes: Vec<Amount> = (0..rng.gen_range(1..20))
                .map(|_| rng.gen_range(1..5_000_000))
                .collect();
            let winning_pool: Amount = stakes.iter().sum();
            let losing_pool: Amount = rng.gen_range(0..10_000_000);
            let (_, distributable) = split_pool(winning_pool + losing_pool, &config()).unwrap();

            let paid: Amount = stakes
                .iter()
                .map(|s| compute_reward(*s, winning_pool, distributable).unwrap())
                .sum();
            assert!(paid <= distributable);
            assert!(distributable - paid < winning_pool);
        }
    }
}
