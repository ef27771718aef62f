//! System-wide constants for the StackFlip settlement engine.

/// Platform fee in basis points (200 bps = 2.00%).
pub const FEE_BPS: u32 = 200;

/// Basis point denominator (10 000 bps = 100%).
pub const BPS_DENOMINATOR: u32 = 10_000;

/// The first id handed out by the flip registry. Ids are never reused.
pub const FIRST_FLIP_ID: u64 = 1;

/// Maximum length of a flip question in bytes.
pub const MAX_QUESTION_LEN: usize = 256;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "StackFlip";
