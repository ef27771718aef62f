//! # stackflip-settlement
//!
//! **Settlement plane**: resolution, fee payout, reward claims, and the
//! audit that proves no value was created or lost.
//!
//! ## Architecture
//!
//! Once a flip's deadline has passed:
//! 1. [`ResolutionEngine`] fixes the winning side and splits the pool into
//!    platform fee and distributable amount
//! 2. The fee moves from escrow to the fee recipient (deferred on failure)
//! 3. [`ClaimProcessor`] pays each winner `floor(stake * distributable / W)`
//! 4. [`conservation::audit_flip`] rechecks the value invariants
//!
//! [`StackFlip`] wires these together with the ledger, a [`ChainClock`] and a
//! [`ValueTransfer`] rail, and keeps a journal of receipts.
//!
//! [`ChainClock`]: stackflip_types::ChainClock
//! [`ValueTransfer`]: stackflip_types::ValueTransfer

pub mod bank;
pub mod claim;
pub mod clock;
pub mod conservation;
pub mod engine;
pub mod portfolio;
pub mod resolution;
pub mod reward;

pub use bank::InMemoryBank;
pub use claim::ClaimProcessor;
pub use clock::ManualClock;
pub use conservation::AuditReport;
pub use engine::StackFlip;
pub use portfolio::{ActiveStake, PastWin, Portfolio};
pub use resolution::{ResolutionEngine, ResolveOutcome};
