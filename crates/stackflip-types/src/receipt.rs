//! Receipt types for the StackFlip audit trail.
//!
//! Every committed state transition (flip created, stake placed, flip
//! resolved, fee paid, reward claimed) produces a [`Receipt`] whose
//! `payload_hash` commits to the exact values that moved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AccountId, Amount, BlockHeight, FlipId, ReceiptId, Side};

/// The type of action this receipt proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptType {
    /// A flip was registered.
    FlipCreated,
    /// Value was staked on one side of a flip.
    StakePlaced(Side),
    /// A flip was resolved with the given winning side.
    FlipResolved(Side),
    /// The platform fee left the pool.
    FeePaid,
    /// A winner claimed their reward.
    RewardClaimed,
}

impl std::fmt::Display for ReceiptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FlipCreated => write!(f, "FLIP_CREATED"),
            Self::StakePlaced(side) => write!(f, "STAKE_PLACED_{side}"),
            Self::FlipResolved(side) => write!(f, "FLIP_RESOLVED_{side}"),
            Self::FeePaid => write!(f, "FEE_PAID"),
            Self::RewardClaimed => write!(f, "REWARD_CLAIMED"),
        }
    }
}

/// Proof that an action was committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub receipt_type: ReceiptType,
    pub flip_id: FlipId,
    /// The acting account (creator, staker, resolver, fee recipient, claimant).
    pub account: AccountId,
    /// Value moved by the action; 0 for actions that move nothing.
    pub amount: Amount,
    /// Chain height the action was evaluated at.
    pub height: BlockHeight,
    /// SHA-256 over [`Receipt::canonical_payload`].
    pub payload_hash: [u8; 32],
    pub issued_at: DateTime<Utc>,
}

impl Receipt {
    /// Issue a receipt, hashing its canonical payload.
    #[must_use]
    pub fn issue(
        receipt_type: ReceiptType,
        flip_id: FlipId,
        account: AccountId,
        amount: Amount,
        height: BlockHeight,
    ) -> Self {
        let payload = Self::canonical_payload(receipt_type, flip_id, &account, amount, height);
        let payload_hash = hash_payload(&payload);
        Self {
            id: ReceiptId::new(),
            receipt_type,
            flip_id,
            account,
            amount,
            height,
            payload_hash,
            issued_at: Utc::now(),
        }
    }

    /// Format: `"stackflip:receipt:v1:" || type || flip_id || account || amount || height`
    #[must_use]
    pub fn canonical_payload(
        receipt_type: ReceiptType,
        flip_id: FlipId,
        account: &AccountId,
        amount: Amount,
        height: BlockHeight,
    ) -> Vec<u8> {
        let mut payload = Vec::with_capacity(128);
        payload.extend_from_slice(b"stackflip:receipt:v1:");
        payload.extend_from_slice(receipt_type.to_string().as_bytes());
        payload.extend_from_slice(&flip_id.0.to_le_bytes());
        payload.extend_from_slice(account.as_str().as_bytes());
        payload.extend_from_slice(&amount.to_le_bytes());
        payload.extend_from_slice(&height.to_le_bytes());
        payload
    }

    /// Recompute the hash and compare.
    #[must_use]
    pub fn verify(&self) -> bool {
        let payload = Self::canonical_payload(
            self.receipt_type,
            self.flip_id,
            &self.account,
            self.amount,
            self.height,
        );
        hash_payload(&payload) == self.payload_hash
    }

    #[must_use]
    pub fn payload_hash_hex(&self) -> String {
        hex::encode(self.payload_hash)
    }
}

fn hash_payload(payload: &[u8]) -> [u8; 32] {
    let digest = Sha256::digest(payload);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&digest);
    hash
}
