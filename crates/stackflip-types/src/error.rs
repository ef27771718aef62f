//! Error types for the StackFlip settlement engine.
//!
//! All errors use the `SF_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Flip lifecycle errors (create, stake, resolve, claim)
//! - 8xx: Invariant / audit errors
//! - 9xx: General / internal errors
//!
//! Codes 100–110 keep the numbering of the on-chain contract so that
//! front-ends can map them one-to-one.

use thiserror::Error;

use crate::{AccountId, Amount, BlockHeight, FlipId};

/// Central error enum for all StackFlip operations.
///
/// Every variant is an expected, caller-recoverable condition. None of them
/// is process-fatal, and each one carries the entity id and the offending
/// value so the caller can decide whether to retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlipError {
    // =================================================================
    // Flip lifecycle (1xx)
    // =================================================================
    /// The requested flip does not exist.
    #[error("SF_ERR_100: Flip not found: {0}")]
    NotFound(FlipId),

    /// The flip has already been resolved; its pools are frozen.
    #[error("SF_ERR_101: Flip already resolved: {0}")]
    AlreadyResolved(FlipId),

    /// The flip has not been resolved yet.
    #[error("SF_ERR_102: Flip not resolved: {0}")]
    NotResolved(FlipId),

    /// Staking closed at the deadline.
    #[error("SF_ERR_103: Deadline passed for {flip_id}: deadline {deadline}, now {now}")]
    DeadlinePassed {
        flip_id: FlipId,
        deadline: BlockHeight,
        now: BlockHeight,
    },

    /// Resolution opens at the deadline.
    #[error("SF_ERR_104: Deadline not reached for {flip_id}: deadline {deadline}, now {now}")]
    DeadlineNotReached {
        flip_id: FlipId,
        deadline: BlockHeight,
        now: BlockHeight,
    },

    /// Only the flip creator or the engine owner may resolve.
    #[error("SF_ERR_105: {caller} is not authorized to resolve {flip_id}")]
    NotAuthorized { flip_id: FlipId, caller: AccountId },

    /// The account already claimed its reward for this flip.
    #[error("SF_ERR_106: {account} already claimed on {flip_id}")]
    AlreadyClaimed { flip_id: FlipId, account: AccountId },

    /// The account holds nothing on the winning side of this flip.
    #[error("SF_ERR_107: {account} has no winning stake on {flip_id}")]
    NoStake { flip_id: FlipId, account: AccountId },

    /// Stakes must be strictly positive.
    #[error("SF_ERR_109: Zero stake amount on {flip_id}")]
    ZeroAmount { flip_id: FlipId },

    /// The value-transfer collaborator refused or failed a movement.
    #[error("SF_ERR_110: Transfer of {amount} from {from} to {to} failed: {reason}")]
    TransferFailed {
        from: AccountId,
        to: AccountId,
        amount: Amount,
        reason: String,
    },

    /// A new flip's deadline must lie strictly in the future.
    #[error("SF_ERR_111: Invalid deadline {deadline}: must be after current height {now}")]
    InvalidDeadline { deadline: BlockHeight, now: BlockHeight },

    /// An accumulator or intermediate product would exceed its integer width.
    #[error("SF_ERR_112: Arithmetic overflow: {context}")]
    ArithmeticOverflow { context: String },

    /// The platform fee for this flip has already been paid out.
    #[error("SF_ERR_113: Fee already paid for {0}")]
    FeeAlreadyPaid(FlipId),

    /// The wallet provider has no connected account.
    #[error("SF_ERR_114: No wallet connected")]
    WalletNotConnected,

    /// The question is empty or too long.
    #[error("SF_ERR_115: Invalid question: {reason}")]
    InvalidQuestion { reason: String },

    // =================================================================
    // Invariant / audit (8xx)
    // =================================================================
    /// Value conservation check failed — critical safety alert.
    #[error("SF_ERR_801: Conservation violation on {flip_id}: {reason}")]
    ConservationViolation { flip_id: FlipId, reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SF_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Configuration error (invalid config document, bad fee rate, etc.).
    #[error("SF_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl FlipError {
    /// Numeric code, matching the `SF_ERR_nnn` prefix.
    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 100,
            Self::AlreadyResolved(_) => 101,
            Self::NotResolved(_) => 102,
            Self::DeadlinePassed { .. } => 103,
            Self::DeadlineNotReached { .. } => 104,
            Self::NotAuthorized { .. } => 105,
            Self::AlreadyClaimed { .. } => 106,
            Self::NoStake { .. } => 107,
            Self::ZeroAmount { .. } => 109,
            Self::TransferFailed { .. } => 110,
            Self::InvalidDeadline { .. } => 111,
            Self::ArithmeticOverflow { .. } => 112,
            Self::FeeAlreadyPaid(_) => 113,
            Self::WalletNotConnected => 114,
            Self::InvalidQuestion { .. } => 115,
            Self::ConservationViolation { .. } => 801,
            Self::Internal(_) => 900,
            Self::Configuration(_) => 902,
        }
    }

    /// Whether retrying the same call later could succeed without the
    /// caller changing anything.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransferFailed { .. } | Self::DeadlineNotReached { .. }
        )
    }

    /// Shorthand for [`FlipError::ArithmeticOverflow`].
    #[must_use]
    pub fn overflow(context: impl Into<String>) -> Self {
        Self::ArithmeticOverflow {
            context: context.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, FlipError>;

/// Failure reported by a [`ValueTransfer`](crate::ValueTransfer) collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The source account cannot cover the amount.
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    /// The payment rail rejected the movement.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The payment rail could not be reached.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl TransferError {
    /// Wrap into the engine error, keeping the movement's endpoints.
    #[must_use]
    pub fn into_flip_error(self, from: &AccountId, to: &AccountId, amount: Amount) -> FlipError {
        FlipError::TransferFailed {
            from: from.clone(),
            to: to.clone(),
            amount,
            reason: self.to_string(),
        }
    }
}
