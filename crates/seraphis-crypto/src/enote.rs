//! Enote and enote-image wire types.
//!
//! An enote is the on-chain representation of an output; an enote image is
//! the masked form a spent enote takes inside a new transaction. Both have
//! bit-exact wire layouts; points are kept compressed here and only
//! decompressed inside the derivation code that consumes them.

use thiserror::Error;

use crate::address_tag::{AddressTag, ADDRESS_TAG_BYTES};

/// Serialized enote width: Ko || C || enc_a || addr_tag_enc || view_tag.
pub const ENOTE_BYTES: usize = 32 + 32 + 8 + ADDRESS_TAG_BYTES + 1;

/// Serialized enote image width: Ko' || C' || KI.
pub const ENOTE_IMAGE_BYTES: usize = 32 + 32 + 32;

/// Key image bytes; one per wallet per enote, used for double-spend
/// detection.
pub type KeyImage = [u8; 32];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Recovered enote flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnoteType {
    Plain,
    Dummy,
    Change,
    SelfSpend,
}

/// Self-send flavors; selects the sender-receiver-secret domain separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfSendType {
    Dummy,
    Change,
    SelfSpend,
}

impl SelfSendType {
    /// Scan order: change and self-spends dominate a wallet's own enotes.
    pub const ALL: [SelfSendType; 3] =
        [SelfSendType::Change, SelfSendType::SelfSpend, SelfSendType::Dummy];

    pub fn enote_type(self) -> EnoteType {
        match self {
            SelfSendType::Dummy => EnoteType::Dummy,
            SelfSendType::Change => EnoteType::Change,
            SelfSendType::SelfSpend => EnoteType::SelfSpend,
        }
    }
}

impl EnoteType {
    pub fn self_send_type(self) -> Option<SelfSendType> {
        match self {
            EnoteType::Plain => None,
            EnoteType::Dummy => Some(SelfSendType::Dummy),
            EnoteType::Change => Some(SelfSendType::Change),
            EnoteType::SelfSpend => Some(SelfSendType::SelfSpend),
        }
    }
}

/// On-chain enote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enote {
    /// One-time address `Ko` (compressed Ed25519).
    pub onetime_address: [u8; 32],
    /// Amount commitment `C = x G + a H` (compressed).
    pub amount_commitment: [u8; 32],
    /// XOR-encoded amount, little-endian.
    pub encoded_amount: [u8; 8],
    /// Encrypted address tag.
    pub addr_tag_enc: AddressTag,
    /// 1-byte view tag.
    pub view_tag: u8,
}

impl Enote {
    pub fn append_to_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.onetime_address);
        out.extend_from_slice(&self.amount_commitment);
        out.extend_from_slice(&self.encoded_amount);
        out.extend_from_slice(&self.addr_tag_enc.0);
        out.push(self.view_tag);
    }

    pub fn to_bytes(&self) -> [u8; ENOTE_BYTES] {
        let mut out = Vec::with_capacity(ENOTE_BYTES);
        self.append_to_bytes(&mut out);
        let mut bytes = [0u8; ENOTE_BYTES];
        bytes.copy_from_slice(&out);
        bytes
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Enote, WireError> {
        if bytes.len() != ENOTE_BYTES {
            return Err(WireError::InvalidLength {
                expected: ENOTE_BYTES,
                actual: bytes.len(),
            });
        }

        let mut onetime_address = [0u8; 32];
        onetime_address.copy_from_slice(&bytes[..32]);
        let mut amount_commitment = [0u8; 32];
        amount_commitment.copy_from_slice(&bytes[32..64]);
        let mut encoded_amount = [0u8; 8];
        encoded_amount.copy_from_slice(&bytes[64..72]);
        let mut addr_tag_enc = [0u8; ADDRESS_TAG_BYTES];
        addr_tag_enc.copy_from_slice(&bytes[72..72 + ADDRESS_TAG_BYTES]);

        Ok(Enote {
            onetime_address,
            amount_commitment,
            encoded_amount,
            addr_tag_enc: AddressTag(addr_tag_enc),
            view_tag: bytes[ENOTE_BYTES - 1],
        })
    }
}

/// Enote image: the spent form of an enote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnoteImage {
    /// `Ko' = t_k G + H_sq(Ko, C) Ko` — masked squashed address.
    pub masked_address: [u8; 32],
    /// `C' = t_c G + C` — mask-added commitment.
    pub masked_commitment: [u8; 32],
    /// `KI = (k_m / k_a) U`.
    pub key_image: KeyImage,
}

impl EnoteImage {
    pub fn to_bytes(&self) -> [u8; ENOTE_IMAGE_BYTES] {
        let mut out = [0u8; ENOTE_IMAGE_BYTES];
        out[..32].copy_from_slice(&self.masked_address);
        out[32..64].copy_from_slice(&self.masked_commitment);
        out[64..].copy_from_slice(&self.key_image);
        out
    }

    pub fn from_slice(bytes: &[u8]) -> Result<EnoteImage, WireError> {
        if bytes.len() != ENOTE_IMAGE_BYTES {
            return Err(WireError::InvalidLength {
                expected: ENOTE_IMAGE_BYTES,
                actual: bytes.len(),
            });
        }

        let mut image = EnoteImage {
            masked_address: [0u8; 32],
            masked_commitment: [0u8; 32],
            key_image: [0u8; 32],
        };
        image.masked_address.copy_from_slice(&bytes[..32]);
        image.masked_commitment.copy_from_slice(&bytes[32..64]);
        image.key_image.copy_from_slice(&bytes[64..]);
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_enote() -> Enote {
        Enote {
            onetime_address: [1u8; 32],
            amount_commitment: [2u8; 32],
            encoded_amount: [3u8; 8],
            addr_tag_enc: AddressTag([4u8; ADDRESS_TAG_BYTES]),
            view_tag: 5,
        }
    }

    #[test]
    fn enote_wire_round_trip() {
        let enote = sample_enote();
        let bytes = enote.to_bytes();
        assert_eq!(bytes.len(), 91);
        assert_eq!(Enote::from_slice(&bytes), Ok(enote));
    }

    #[test]
    fn enote_wrong_length_rejected() {
        let err = Enote::from_slice(&[0u8; 90]).unwrap_err();
        assert_eq!(err, WireError::InvalidLength { expected: 91, actual: 90 });
    }

    #[test]
    fn image_wire_round_trip() {
        let image = EnoteImage {
            masked_address: [7u8; 32],
            masked_commitment: [8u8; 32],
            key_image: [9u8; 32],
        };
        assert_eq!(EnoteImage::from_slice(&image.to_bytes()), Ok(image));
    }

    #[test]
    fn enote_and_self_send_types_convert() {
        for self_send in SelfSendType::ALL {
            assert_eq!(self_send.enote_type().self_send_type(), Some(self_send));
        }
        assert_eq!(EnoteType::Plain.self_send_type(), None);
    }
}
