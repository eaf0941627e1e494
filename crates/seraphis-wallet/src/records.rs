//! Enote records and their chain contexts.
//!
//! Recovery runs in three tiers of increasing key authority:
//!
//! * **basic** — findable with `xk_fr` alone (view-tag pass);
//! * **intermediate** — adds `xk_ua`, `s_ga` and `s_ct`: address index,
//!   amount and blinding factor, but no spend authority;
//! * **full** — adds `k_vb`: the enote view privkey and the key image.
//!
//! A full record plus its origin and spent contexts is what the enote
//! store holds.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};

use seraphis_crypto::address::AddressIndex;
use seraphis_crypto::address_tag::AddressTag;
use seraphis_crypto::{Enote, EnoteType, KeyImage};

use crate::TxId;

/// Where an enote's origin was last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OriginStatus {
    Offchain,
    Unconfirmed,
    Onchain,
}

impl OriginStatus {
    /// Rank in the "more confirmed" partial order.
    pub fn confirmation_rank(self) -> u8 {
        match self {
            OriginStatus::Offchain => 0,
            OriginStatus::Unconfirmed => 1,
            OriginStatus::Onchain => 2,
        }
    }
}

/// Where an enote's spending was last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpentStatus {
    Unspent,
    SpentOffchain,
    SpentUnconfirmed,
    SpentOnchain,
}

impl SpentStatus {
    pub fn confirmation_rank(self) -> u8 {
        match self {
            SpentStatus::Unspent => 0,
            SpentStatus::SpentOffchain => 1,
            SpentStatus::SpentUnconfirmed => 2,
            SpentStatus::SpentOnchain => 3,
        }
    }
}

/// Origin context of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginContext {
    pub status: OriginStatus,
    /// Only meaningful for `Onchain`.
    pub block_index: Option<u64>,
    pub block_timestamp: Option<u64>,
    pub tx_id: TxId,
}

impl OriginContext {
    pub fn onchain(block_index: u64, block_timestamp: u64, tx_id: TxId) -> OriginContext {
        OriginContext {
            status: OriginStatus::Onchain,
            block_index: Some(block_index),
            block_timestamp: Some(block_timestamp),
            tx_id,
        }
    }

    pub fn unconfirmed(tx_id: TxId) -> OriginContext {
        OriginContext {
            status: OriginStatus::Unconfirmed,
            block_index: None,
            block_timestamp: None,
            tx_id,
        }
    }

    pub fn offchain(tx_id: TxId) -> OriginContext {
        OriginContext {
            status: OriginStatus::Offchain,
            block_index: None,
            block_timestamp: None,
            tx_id,
        }
    }
}

/// Spent context of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpentContext {
    pub status: SpentStatus,
    /// Only meaningful for `SpentOnchain`.
    pub block_index: Option<u64>,
    pub tx_id: Option<TxId>,
}

impl SpentContext {
    pub fn unspent() -> SpentContext {
        SpentContext {
            status: SpentStatus::Unspent,
            block_index: None,
            tx_id: None,
        }
    }

    pub fn spent_onchain(block_index: u64, tx_id: TxId) -> SpentContext {
        SpentContext {
            status: SpentStatus::SpentOnchain,
            block_index: Some(block_index),
            tx_id: Some(tx_id),
        }
    }

    pub fn spent_unconfirmed(tx_id: TxId) -> SpentContext {
        SpentContext {
            status: SpentStatus::SpentUnconfirmed,
            block_index: None,
            tx_id: Some(tx_id),
        }
    }

    pub fn spent_offchain(tx_id: TxId) -> SpentContext {
        SpentContext {
            status: SpentStatus::SpentOffchain,
            block_index: None,
            tx_id: Some(tx_id),
        }
    }
}

/// Tier 1: view-tag pass under `xk_fr`.
#[derive(Debug, Clone, Copy)]
pub struct BasicEnoteRecord {
    pub enote: Enote,
    pub enote_ephemeral_pubkey: MontgomeryPoint,
    pub input_context: [u8; 32],
    /// `q'` — nominal sender-receiver secret.
    pub nominal_sender_receiver_secret: [u8; 32],
    /// `K'_1 = Ko - H_n(q') X`.
    pub nominal_spend_key: EdwardsPoint,
    /// Decrypted (but not yet deciphered) address tag.
    pub nominal_address_tag: AddressTag,
}

/// Tier 2: plain-enote info without spend authority.
#[derive(Debug, Clone, Copy)]
pub struct IntermediateEnoteRecord {
    pub enote: Enote,
    pub enote_ephemeral_pubkey: MontgomeryPoint,
    pub input_context: [u8; 32],
    pub sender_receiver_secret: [u8; 32],
    pub address_index: AddressIndex,
    pub amount: u64,
    pub amount_blinding_factor: Scalar,
}

/// Tier 3: full record with spend data.
#[derive(Debug, Clone, Copy)]
pub struct EnoteRecord {
    pub enote: Enote,
    pub enote_ephemeral_pubkey: MontgomeryPoint,
    pub input_context: [u8; 32],
    pub address_index: AddressIndex,
    pub amount: u64,
    pub amount_blinding_factor: Scalar,
    /// `k_a = H_n(q) + k^j_x + k_vb`.
    pub enote_view_privkey: Scalar,
    pub key_image: KeyImage,
    pub enote_type: EnoteType,
}

/// A full record with its chain contexts, as held by the enote store.
#[derive(Debug, Clone, Copy)]
pub struct ContextualEnoteRecord {
    pub record: EnoteRecord,
    pub origin: OriginContext,
    pub spent: SpentContext,
}

impl ContextualEnoteRecord {
    pub fn amount(&self) -> u64 {
        self.record.amount
    }

    pub fn key_image(&self) -> KeyImage {
        self.record.key_image
    }
}
