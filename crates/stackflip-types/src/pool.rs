//! Display-only view of a flip's pools.
//!
//! Settlement never reads these numbers. They exist so a front-end can show
//! the YES/NO split and the payout multiplier without redoing the math.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Amount, Side};

/// Decimal places kept for percentages and multipliers.
const DISPLAY_SCALE: u32 = 2;

/// YES/NO shares of the pool and the implied payout multiplier per side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSplit {
    pub yes_amount: Amount,
    pub no_amount: Amount,
    /// Share of the pool on YES, in percent. 50 for an empty pool.
    pub yes_percent: Decimal,
    /// Share of the pool on NO, in percent. 50 for an empty pool.
    pub no_percent: Decimal,
    /// Payout per unit staked if YES won now. `None` if nobody backs YES.
    pub yes_multiplier: Option<Decimal>,
    /// Payout per unit staked if NO won now. `None` if nobody backs NO.
    pub no_multiplier: Option<Decimal>,
}

impl PoolSplit {
    /// Build the split from the two pool totals and the amount that would
    /// be distributable if the flip resolved now.
    #[must_use]
    pub fn new(yes_amount: Amount, no_amount: Amount, distributable: Amount) -> Self {
        let yes = Decimal::from(yes_amount);
        let no = Decimal::from(no_amount);
        let total = yes + no;
        let hundred = Decimal::ONE_HUNDRED;

        let (yes_percent, no_percent) = if total.is_zero() {
            (Decimal::new(50, 0), Decimal::new(50, 0))
        } else {
            (
                (yes * hundred / total).round_dp(DISPLAY_SCALE),
                (no * hundred / total).round_dp(DISPLAY_SCALE),
            )
        };

        let multiplier = |side: Decimal| {
            (!side.is_zero()).then(|| (Decimal::from(distributable) / side).round_dp(DISPLAY_SCALE))
        };

        Self {
            yes_amount,
            no_amount,
            yes_percent,
            no_percent,
            yes_multiplier: multiplier(yes),
            no_multiplier: multiplier(no),
        }
    }

    #[must_use]
    pub fn percent(&self, side: Side) -> Decimal {
        match side {
            Side::Yes => self.yes_percent,
            Side::No => self.no_percent,
        }
    }

    #[must_use]
    pub fn multiplier(&self, side: Side) -> Option<Decimal> {
        match side {
            Side::Yes => self.yes_multiplier,
            Side::No => self.no_multiplier,
        }
    }
}
