//! # stackflip-ledger
//!
//! **Record plane**: the durable keyed store and the two components that
//! write proposition and stake records into it.
//!
//! ## Architecture
//!
//! 1. **Ledger**: `propositions` keyed by id, `stakes` keyed by
//!    `(flip_id, account)`, and the `next_flip_id` counter. Every write goes
//!    through [`Ledger::transact`], which commits all staged writes or none.
//!    Value-moving operations hold a per-flip lock ([`Ledger::with_flip`])
//!    so the rail is never called under the ledger mutex.
//! 2. **FlipRegistry**: assigns sequential ids and stores new flips.
//! 3. **StakeBook**: accumulates stakes and pool totals before the deadline.
//! 4. **Escrow**: the pool account plus the value-transfer rail that moves
//!    stakes in and payouts out.
//!
//! ## Stake Flow
//!
//! ```text
//! caller → StakeBook.stake() → [flip lock: validate → Escrow.collect() → commit record + pool]
//! ```

pub mod escrow;
pub mod registry;
pub mod stake_book;
pub mod store;

pub use escrow::Escrow;
pub use registry::FlipRegistry;
pub use stake_book::StakeBook;
pub use store::{Ledger, LedgerState, LedgerTxn};
