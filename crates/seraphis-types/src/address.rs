//! Encoded address strings.
//!
//! An address carries a serialized destination (two Ed25519/X25519 DH
//! pubkeys, the address spend pubkey, and the ciphered address tag) as
//! `"xmra" || version || network || base32(payload) || checksum`.
//! The checksum is the first eight base32 symbols of a domain-prefixed
//! Keccak-256 over the address body characters, so a single corrupted
//! symbol is caught before any payload is handed to the crypto layer.

use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

use crate::base32;
use crate::network::Network;

/// Address prefix shared by every network.
pub const ADDRESS_PREFIX: &str = "xmra";

/// Current address format version character.
pub const ADDRESS_VERSION: char = '1';

/// Serialized destination size: K_1 (32) || xK_2 (32) || xK_3 (32) || addr_tag (18).
pub const DESTINATION_BYTES: usize = 114;

/// Number of base32 symbols in the checksum.
pub const CHECKSUM_SYMBOLS: usize = 8;

const CHECKSUM_DOMAIN: &[u8] = b"jamtis_address_checksum";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address does not start with {ADDRESS_PREFIX:?}")]
    MissingPrefix,

    #[error("unsupported address version {0:?}")]
    UnsupportedVersion(char),

    #[error("unknown network code {0:?}")]
    UnknownNetwork(char),

    #[error("invalid address length ({0})")]
    InvalidLength(usize),

    #[error("base32 decode error: {0}")]
    Base32(#[from] base32::Base32Error),

    #[error("invalid payload length: expected {expected} bytes, got {actual}")]
    InvalidPayloadLength { expected: usize, actual: usize },

    #[error("checksum mismatch")]
    ChecksumMismatch,
}

fn checksum(body: &str) -> String {
    let mut keccak = Keccak::v256();
    let mut digest = [0u8; 32];
    keccak.update(CHECKSUM_DOMAIN);
    keccak.update(body.as_bytes());
    keccak.finalize(&mut digest);

    base32::encode(&digest)[..CHECKSUM_SYMBOLS].to_string()
}

/// Encode a serialized destination as an address string.
pub fn write_address(network: Network, destination: &[u8; DESTINATION_BYTES]) -> String {
    let mut body = String::with_capacity(6 + (DESTINATION_BYTES * 8 + 4) / 5);
    body.push_str(ADDRESS_PREFIX);
    body.push(ADDRESS_VERSION);
    body.push(network.code());
    body.push_str(&base32::encode(destination));

    let checksum = checksum(&body);
    body.push_str(&checksum);
    body
}

/// Parse and validate an address string, returning the network and the raw
/// destination bytes.
pub fn parse_address(address: &str) -> Result<(Network, [u8; DESTINATION_BYTES]), AddressError> {
    let rest = address
        .strip_prefix(ADDRESS_PREFIX)
        .ok_or(AddressError::MissingPrefix)?;

    let mut chars = rest.chars();
    let version = chars.next().ok_or(AddressError::InvalidLength(address.len()))?;
    if version != ADDRESS_VERSION {
        return Err(AddressError::UnsupportedVersion(version));
    }
    let network_code = chars.next().ok_or(AddressError::InvalidLength(address.len()))?;
    let network = Network::from_code(network_code).ok_or(AddressError::UnknownNetwork(network_code))?;

    let data: &str = chars.as_str();
    if data.len() < CHECKSUM_SYMBOLS {
        return Err(AddressError::InvalidLength(address.len()));
    }
    let (payload_symbols, checksum_symbols) = data.split_at(data.len() - CHECKSUM_SYMBOLS);

    let body = &address[..address.len() - CHECKSUM_SYMBOLS];
    if checksum(body) != checksum_symbols {
        return Err(AddressError::ChecksumMismatch);
    }

    let payload = base32::decode(payload_symbols)?;
    if payload.len() != DESTINATION_BYTES {
        return Err(AddressError::InvalidPayloadLength {
            expected: DESTINATION_BYTES,
            actual: payload.len(),
        });
    }

    let mut destination = [0u8; DESTINATION_BYTES];
    destination.copy_from_slice(&payload);
    Ok((network, destination))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_destination() -> [u8; DESTINATION_BYTES] {
        let mut dest = [0u8; DESTINATION_BYTES];
        for (i, byte) in dest.iter_mut().enumerate() {
            *byte = (i * 31 + 7) as u8;
        }
        dest
    }

    #[test]
    fn round_trip() {
        let dest = sample_destination();
        let addr = write_address(Network::Mainnet, &dest);
        assert!(addr.starts_with("xmra1m"));

        let (network, parsed) = parse_address(&addr).unwrap();
        assert_eq!(network, Network::Mainnet);
        assert_eq!(parsed, dest);
    }

    #[test]
    fn corrupted_symbol_fails_checksum() {
        let addr = write_address(Network::Testnet, &sample_destination());

        // flip one payload symbol to a different alphabet symbol
        let mut bytes = addr.into_bytes();
        let pos = 10;
        bytes[pos] = if bytes[pos] == b'y' { b'b' } else { b'y' };
        let corrupted = String::from_utf8(bytes).unwrap();

        assert_eq!(parse_address(&corrupted), Err(AddressError::ChecksumMismatch));
    }

    #[test]
    fn wrong_network_code_rejected() {
        let addr = write_address(Network::Stagenet, &sample_destination());
        let swapped = addr.replacen("xmra1s", "xmra1q", 1);
        assert_eq!(parse_address(&swapped), Err(AddressError::UnknownNetwork('q')));
    }

    #[test]
    fn truncated_address_rejected() {
        assert!(matches!(parse_address("xmra"), Err(AddressError::InvalidLength(_))));
        assert!(matches!(parse_address("monero"), Err(AddressError::MissingPrefix)));
    }
}
