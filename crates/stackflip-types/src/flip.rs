//! # Flip — the binary-outcome proposition
//!
//! ## Lifecycle
//!
//! ```text
//!   ┌────────┐  now >= deadline  ┌─────────────────────┐  resolve  ┌──────────┐
//!   │ ACTIVE ├──────────────────▶│ AWAITING_RESOLUTION ├──────────▶│ RESOLVED │
//!   └────────┘                   └─────────────────────┘           └──────────┘
//! ```
//!
//! - Stakes are accepted only while ACTIVE; pool totals only ever grow.
//! - Resolution fixes the winning side, the platform fee and the
//!   distributable amount in one step. They never change afterwards.
//! - Flips are never destroyed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, BlockHeight, FlipError, FlipId, Result};

/// One of the two mutually exclusive outcomes of a flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Yes,
    No,
}

impl Side {
    /// `true` maps to YES, matching the contract's boolean encoding.
    #[must_use]
    pub fn from_bool(yes: bool) -> Self {
        if yes { Self::Yes } else { Self::No }
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
        }
    }
}

/// Whether the platform fee has left the pool yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeePayout {
    /// The fee was transferred to the fee recipient (or was zero).
    Paid,
    /// The transfer failed; the fee is still held by the pool account.
    Pending,
}

/// Outcome fields fixed at resolution time.
///
/// Invariant: `platform_fee + distributable == total_yes_stake + total_no_stake`
/// of the owning flip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub winning_side: Side,
    pub platform_fee: Amount,
    pub distributable: Amount,
    /// Block height at which the flip was resolved.
    pub resolved_at: BlockHeight,
    /// Payout state of `platform_fee`. The only field that may change
    /// after resolution, and only from `Pending` to `Paid`.
    pub fee_payout: FeePayout,
}

/// A binary-outcome proposition with a resolution deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flip {
    pub id: FlipId,
    pub creator: AccountId,
    pub question: String,
    /// Staking closes and resolution opens at this height.
    pub deadline: BlockHeight,
    /// Chain height when the flip was created.
    pub created_at: BlockHeight,
    pub total_yes_stake: Amount,
    pub total_no_stake: Amount,
    /// `None` until the flip is resolved.
    pub resolution: Option<Resolution>,
}

impl Flip {
    /// A fresh, unresolved flip with empty pools.
    #[must_use]
    pub fn new(
        id: FlipId,
        creator: AccountId,
        question: String,
        deadline: BlockHeight,
        created_at: BlockHeight,
    ) -> Self {
        Self {
            id,
            creator,
            question,
            deadline,
            created_at,
            total_yes_stake: 0,
            total_no_stake: 0,
            resolution: None,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    #[must_use]
    pub fn winning_side(&self) -> Option<Side> {
        self.resolution.as_ref().map(|r| r.winning_side)
    }

    #[must_use]
    pub fn platform_fee(&self) -> Option<Amount> {
        self.resolution.as_ref().map(|r| r.platform_fee)
    }

    #[must_use]
    pub fn distributable(&self) -> Option<Amount> {
        self.resolution.as_ref().map(|r| r.distributable)
    }

    /// Pool total on one side.
    #[must_use]
    pub fn side_pool(&self, side: Side) -> Amount {
        match side {
            Side::Yes => self.total_yes_stake,
            Side::No => self.total_no_stake,
        }
    }

    /// Sum of both pools.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the sum does not fit an [`Amount`]. The stake
    /// book refuses any stake that would make this happen.
    pub fn total_pool(&self) -> Result<Amount> {
        self.total_yes_stake
            .checked_add(self.total_no_stake)
            .ok_or_else(|| FlipError::overflow(format!("total pool of {}", self.id)))
    }

    /// Add `amount` to one side's pool.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if either the side pool or the total pool would
    /// overflow. The flip is unchanged on error.
    pub fn credit_pool(&mut self, side: Side, amount: Amount) -> Result<()> {
        self.total_pool()?
            .checked_add(amount)
            .ok_or_else(|| FlipError::overflow(format!("total pool of {}", self.id)))?;
        let pool = match side {
            Side::Yes => &mut self.total_yes_stake,
            Side::No => &mut self.total_no_stake,
        };
        *pool = pool
            .checked_add(amount)
            .ok_or_else(|| FlipError::overflow(format!("{side} pool of {}", self.id)))?;
        Ok(())
    }

    /// Blocks remaining until the deadline, saturating at zero.
    #[must_use]
    pub fn blocks_left(&self, now: BlockHeight) -> BlockHeight {
        self.deadline.saturating_sub(now)
    }

    /// Lifecycle status at `now`.
    #[must_use]
    pub fn status(&self, now: BlockHeight) -> FlipStatus {
        match &self.resolution {
            Some(r) => FlipStatus::Resolved(r.winning_side),
            None if now < self.deadline => FlipStatus::Active,
            None => FlipStatus::AwaitingResolution,
        }
    }
}

/// Lifecycle status of a flip at a given block height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipStatus {
    /// Before the deadline, accepting stakes.
    Active,
    /// Deadline reached, waiting for the creator or owner to resolve.
    AwaitingResolution,
    /// Resolved with the given winning side.
    Resolved(Side),
}

impl fmt::Display for FlipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::AwaitingResolution => write!(f, "AWAITING_RESOLUTION"),
            Self::Resolved(side) => write!(f, "RESOLVED({side})"),
        }
    }
}
