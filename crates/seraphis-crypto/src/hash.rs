//! Domain-separated hash layer.
//!
//! Every digest in the protocol is one Keccak-256 sponge invocation
//! (legacy 0x01 padding, rate 136) over `input || domain-separator`,
//! truncated to the requested width. The keyed variants prepend the
//! 32-byte key padded to exactly one sponge rate block, so the key always
//! occupies the first permutation regardless of the input length.
//!
//! Domain separators are fixed ASCII strings, one per call site; they live
//! next to their call sites in the other modules. No two call sites may
//! share one.

use curve25519_dalek::scalar::Scalar;
use tiny_keccak::{Hasher, Keccak};

/// Keccak-f[1600] rate for 256-bit output.
pub const KECCAK_RATE_BYTES: usize = 136;

/// `Pad136(k) = k || 104 * 0x00` — fills exactly one rate block.
pub fn pad_136(key: &[u8; 32]) -> [u8; KECCAK_RATE_BYTES] {
    let mut padded = [0u8; KECCAK_RATE_BYTES];
    padded[..32].copy_from_slice(key);
    padded
}

fn hash_simple(domain_separator: &str, input: &[&[u8]]) -> [u8; 32] {
    let mut keccak = Keccak::v256();
    let mut digest = [0u8; 32];
    for part in input {
        keccak.update(part);
    }
    keccak.update(domain_separator.as_bytes());
    keccak.finalize(&mut digest);
    digest
}

fn hash_padded(domain_separator: &str, key: &[u8; 32], input: &[&[u8]]) -> [u8; 32] {
    let mut keccak = Keccak::v256();
    let mut digest = [0u8; 32];
    keccak.update(&pad_136(key));
    for part in input {
        keccak.update(part);
    }
    keccak.update(domain_separator.as_bytes());
    keccak.finalize(&mut digest);
    digest
}

/// `H_1(x)`: 1-byte output.
pub fn hash1(domain_separator: &str, input: &[&[u8]]) -> u8 {
    hash_simple(domain_separator, input)[0]
}

/// `H_8(x)`: 8-byte output.
pub fn hash8(domain_separator: &str, input: &[&[u8]]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash_simple(domain_separator, input)[..8]);
    out
}

/// `H_16(x)`: 16-byte output.
pub fn hash16(domain_separator: &str, input: &[&[u8]]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out.copy_from_slice(&hash_simple(domain_separator, input)[..16]);
    out
}

/// `H_32(x)`: 32-byte output.
pub fn hash32(domain_separator: &str, input: &[&[u8]]) -> [u8; 32] {
    hash_simple(domain_separator, input)
}

/// `H_n(x)`: Ed25519 scalar output (32-byte digest reduced mod l).
pub fn hash_scalar(domain_separator: &str, input: &[&[u8]]) -> Scalar {
    Scalar::from_bytes_mod_order(hash_simple(domain_separator, input))
}

/// `H_n(Pad136(k), x)`: keyed scalar output.
pub fn derive_key(domain_separator: &str, key: &[u8; 32], input: &[&[u8]]) -> Scalar {
    Scalar::from_bytes_mod_order(hash_padded(domain_separator, key, input))
}

/// `H_32(Pad136(k), x)`: keyed 32-byte output, not reduced.
pub fn derive_secret(domain_separator: &str, key: &[u8; 32], input: &[&[u8]]) -> [u8; 32] {
    hash_padded(domain_separator, key, input)
}

/// Plain Keccak-256 over concatenated parts (no domain separator); used for
/// block-id style hashes where the input is already self-describing.
pub fn keccak256(parts: &[&[u8]]) -> [u8; 32] {
    let mut keccak = Keccak::v256();
    let mut digest = [0u8; 32];
    for part in parts {
        keccak.update(part);
    }
    keccak.finalize(&mut digest);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak256_matches_known_vector() {
        // legacy Keccak (0x01 padding), not SHA3
        assert_eq!(
            keccak256(&[]).to_vec(),
            hex::decode("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
                .unwrap()
        );
    }

    #[test]
    fn pad_136_fills_one_rate_block() {
        let key = [0xabu8; 32];
        let padded = pad_136(&key);
        assert_eq!(padded.len(), KECCAK_RATE_BYTES);
        assert_eq!(&padded[..32], &key);
        assert!(padded[32..].iter().all(|&b| b == 0));
    }

    #[test]
    fn truncations_agree_with_full_digest() {
        let input: &[&[u8]] = &[b"some input", b"parts"];
        let full = hash32("test_dsep", input);
        assert_eq!(hash1("test_dsep", input), full[0]);
        assert_eq!(hash8("test_dsep", input), full[..8]);
        assert_eq!(hash16("test_dsep", input), full[..16]);
    }

    #[test]
    fn domain_separators_change_output() {
        let input: &[&[u8]] = &[b"payload"];
        assert_ne!(hash32("dsep_a", input), hash32("dsep_b", input));
    }

    #[test]
    fn keyed_hash_differs_from_simple() {
        let key = [7u8; 32];
        let input: &[&[u8]] = &[b"payload"];
        assert_ne!(derive_secret("dsep", &key, input), hash32("dsep", input));
        // the padding is load-bearing: keyed hash equals the simple hash of
        // the padded key followed by the input
        let padded = pad_136(&key);
        assert_eq!(
            derive_secret("dsep", &key, input),
            hash32("dsep", &[&padded, b"payload".as_slice()])
        );
    }

    #[test]
    fn derive_key_is_reduced() {
        let key = [9u8; 32];
        let scalar = derive_key("dsep", &key, &[b"x"]);
        assert_eq!(
            Scalar::from_bytes_mod_order(scalar.to_bytes()).to_bytes(),
            scalar.to_bytes()
        );
    }
}
