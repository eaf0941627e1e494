//! Jamtis/Seraphis enote cryptography core.
//!
//! Layer map, leaves first:
//!
//! * [`hash`] — domain-separated Keccak digests (1/8/16/32 bytes, scalars,
//!   and the pad-136 keyed variant).
//! * [`keys`] — deterministic derivation of the wallet key hierarchy from a
//!   master scalar.
//! * [`address`] / [`address_tag`] — per-index destinations and the
//!   Twofish-ciphered address tags that act as self-recognition tokens.
//! * [`enote`] / [`enote_utils`] — enote wire types and every per-enote
//!   derivation used by senders and by the three recovery tiers.
//! * [`sp_core`] — Seraphis spendkey composition, squashing, key images and
//!   enote images.
//!
//! Curve arithmetic is `curve25519-dalek`; nothing in this crate rolls its
//! own field math.

pub mod address;
pub mod address_tag;
pub mod enote;
pub mod enote_utils;
pub mod generators;
pub mod hash;
pub mod keys;
pub mod sp_core;
pub mod x25519;

use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, RngCore};
use thiserror::Error;

pub use address::{AddressIndex, Destination};
pub use address_tag::{AddressTag, CipherContext};
pub use enote::{Enote, EnoteImage, EnoteType, KeyImage, SelfSendType};
pub use keys::JamtisKeys;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("scalar must be nonzero")]
    ZeroScalar,

    #[error("point does not decompress onto the curve")]
    InvalidPoint,
}

/// Uniformly random nonzero scalar.
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    loop {
        let mut wide = [0u8; 64];
        rng.fill_bytes(&mut wide);
        let scalar = Scalar::from_bytes_mod_order_wide(&wide);
        if scalar != Scalar::ZERO {
            return scalar;
        }
    }
}
