//! Per-index destinations.
//!
//! A destination is what a recipient hands out for one of their 2^128
//! addresses: the address spend key `K_1 = k^j_x * X + K_s`, the two
//! Montgomery DH pubkeys `xK_2 = xk^j_a * xK_fr` and `xK_3 = xk^j_a *
//! xK_ua`, and the ciphered address tag. From `(K_s, xK_ua, xK_fr, s_ga,
//! j)` the destination is uniquely determined.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, RngCore};
use seraphis_types::{address as address_strings, Network};

use crate::address_tag::{AddressTag, CipherContext, ADDRESS_TAG_BYTES};
use crate::generators::x_gen;
use crate::hash::derive_key;
use crate::CryptoError;

/// Address index width; little-endian on the wire.
pub const ADDRESS_INDEX_BYTES: usize = 16;

const DOMAIN_SPENDKEY_EXTENSION: &str = "jamtis_address_spendkey_extension";
const DOMAIN_ADDRESS_PRIVKEY: &str = "jamtis_address_privkey";

/// Address index `j`: 16 raw little-endian bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressIndex(pub [u8; ADDRESS_INDEX_BYTES]);

impl AddressIndex {
    pub fn from_u128(j: u128) -> AddressIndex {
        AddressIndex(j.to_le_bytes())
    }

    pub fn to_u128(self) -> u128 {
        u128::from_le_bytes(self.0)
    }

    /// Random index.
    pub fn gen<R: RngCore + CryptoRng>(rng: &mut R) -> AddressIndex {
        let mut bytes = [0u8; ADDRESS_INDEX_BYTES];
        rng.fill_bytes(&mut bytes);
        AddressIndex(bytes)
    }
}

/// `k^j_x = H_n(Pad136(s_ga), j)` — address spendkey extension.
pub fn make_spendkey_extension(s_generate_address: &[u8; 32], j: AddressIndex) -> Scalar {
    derive_key(DOMAIN_SPENDKEY_EXTENSION, s_generate_address, &[&j.0])
}

/// `xk^j_a = H_n_x25519(Pad136(s_ga), j)` — address DH privkey.
pub fn make_address_privkey(s_generate_address: &[u8; 32], j: AddressIndex) -> Scalar {
    derive_key(DOMAIN_ADDRESS_PRIVKEY, s_generate_address, &[&j.0])
}

/// `K_1 = k^j_x * X + K_s` — address spend key.
pub fn make_address_spend_key(
    spend_pubkey: &EdwardsPoint,
    s_generate_address: &[u8; 32],
    j: AddressIndex,
) -> EdwardsPoint {
    let extension = make_spendkey_extension(s_generate_address, j);
    extension * x_gen() + spend_pubkey
}

/// A recipient destination `(K_1, xK_2, xK_3, addr_tag)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    /// `K_1 = k^j_x * X + K_s`.
    pub spend_pubkey: EdwardsPoint,
    /// `xK_2 = xk^j_a * xK_fr` — DH base for view tags and nominal keys.
    pub view_pubkey: MontgomeryPoint,
    /// `xK_3 = xk^j_a * xK_ua` — DH base for enote ephemeral pubkeys.
    pub base_pubkey: MontgomeryPoint,
    /// `addr_tag = cipher[s_ct](j || 0)`.
    pub addr_tag: AddressTag,
}

impl Destination {
    /// Serialize as the 114-byte address payload.
    pub fn to_bytes(&self) -> [u8; address_strings::DESTINATION_BYTES] {
        let mut out = [0u8; address_strings::DESTINATION_BYTES];
        out[..32].copy_from_slice(self.spend_pubkey.compress().as_bytes());
        out[32..64].copy_from_slice(self.view_pubkey.as_bytes());
        out[64..96].copy_from_slice(self.base_pubkey.as_bytes());
        out[96..].copy_from_slice(&self.addr_tag.0);
        out
    }

    pub fn from_bytes(bytes: &[u8; address_strings::DESTINATION_BYTES]) -> Result<Destination, CryptoError> {
        let mut spend_pubkey = [0u8; 32];
        spend_pubkey.copy_from_slice(&bytes[..32]);
        let spend_pubkey = CompressedEdwardsY(spend_pubkey)
            .decompress()
            .ok_or(CryptoError::InvalidPoint)?;

        let mut view_pubkey = [0u8; 32];
        view_pubkey.copy_from_slice(&bytes[32..64]);
        let mut base_pubkey = [0u8; 32];
        base_pubkey.copy_from_slice(&bytes[64..96]);
        let mut addr_tag = [0u8; ADDRESS_TAG_BYTES];
        addr_tag.copy_from_slice(&bytes[96..]);

        Ok(Destination {
            spend_pubkey,
            view_pubkey: MontgomeryPoint(view_pubkey),
            base_pubkey: MontgomeryPoint(base_pubkey),
            addr_tag: AddressTag(addr_tag),
        })
    }

    /// Encode as a user-facing address string.
    pub fn to_address_string(&self, network: Network) -> String {
        address_strings::write_address(network, &self.to_bytes())
    }

    /// Parse a user-facing address string.
    pub fn from_address_string(
        address: &str,
    ) -> Result<(Network, Destination), DestinationParseError> {
        let (network, payload) = address_strings::parse_address(address)?;
        let destination = Destination::from_bytes(&payload)?;
        Ok((network, destination))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DestinationParseError {
    #[error("address string error: {0}")]
    Address(#[from] address_strings::AddressError),

    #[error("destination payload error: {0}")]
    Payload(#[from] CryptoError),
}

/// Build the destination at index `j` from the wallet's public base keys
/// and the generate-address secret.
pub fn make_destination(
    spend_pubkey: &EdwardsPoint,
    unlockamounts_pubkey: &MontgomeryPoint,
    findreceived_pubkey: &MontgomeryPoint,
    s_generate_address: &[u8; 32],
    cipher_context: &CipherContext,
    j: AddressIndex,
) -> Destination {
    let address_privkey = make_address_privkey(s_generate_address, j);

    Destination {
        spend_pubkey: make_address_spend_key(spend_pubkey, s_generate_address, j),
        view_pubkey: crate::x25519::scmul_key(&address_privkey, findreceived_pubkey),
        base_pubkey: crate::x25519::scmul_key(&address_privkey, unlockamounts_pubkey),
        addr_tag: cipher_context.cipher(j),
    }
}

/// Recover the index of a destination owned by this wallet, verifying that
/// the whole destination re-derives from it.
pub fn try_destination_index(
    destination: &Destination,
    spend_pubkey: &EdwardsPoint,
    unlockamounts_pubkey: &MontgomeryPoint,
    findreceived_pubkey: &MontgomeryPoint,
    s_generate_address: &[u8; 32],
    cipher_context: &CipherContext,
) -> Option<AddressIndex> {
    let j = cipher_context.try_decipher(destination.addr_tag)?;

    let expected = make_destination(
        spend_pubkey,
        unlockamounts_pubkey,
        findreceived_pubkey,
        s_generate_address,
        cipher_context,
        j,
    );
    if expected != *destination {
        return None;
    }

    Some(j)
}
