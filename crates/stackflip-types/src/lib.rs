//! # stackflip-types
//!
//! Shared types, errors, and configuration for the **StackFlip** settlement
//! engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`FlipId`], [`AccountId`], [`ReceiptId`]
//! - **Flip model**: [`Flip`], [`Resolution`], [`Side`], [`FlipStatus`], [`FeePayout`]
//! - **Stake model**: [`StakeRecord`], [`StakeKey`]
//! - **Pool display**: [`PoolSplit`]
//! - **Receipts**: [`Receipt`], [`ReceiptType`]
//! - **Configuration**: [`EngineConfig`]
//! - **Collaborators**: [`ChainClock`], [`ValueTransfer`], [`WalletProvider`]
//! - **Errors**: [`FlipError`] with `SF_ERR_` prefix codes
//! - **Constants**: fee rate and limits

pub mod collaborators;
pub mod config;
pub mod constants;
pub mod error;
pub mod flip;
pub mod ids;
pub mod pool;
pub mod receipt;
pub mod stake;

// Re-export all primary types at crate root for ergonomic imports:
//   use stackflip_types::{Flip, Side, StakeRecord, FlipError, ...};

pub use collaborators::*;
pub use config::*;
pub use error::*;
pub use flip::*;
pub use ids::*;
pub use pool::*;
pub use receipt::*;
pub use stake::*;

// Constants are accessed via `stackflip_types::constants::FOO`
// (not re-exported to avoid name collisions).

/// Staked value in the smallest indivisible unit (e.g. micro-STX).
pub type Amount = u64;

/// Chain block height, used for every deadline comparison.
pub type BlockHeight = u64;
