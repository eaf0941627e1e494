//! Address tags: ciphered address indices with a short MAC.
//!
//! A tag is `ENC[s_ct](j || MAC)` where the MAC is two constant-zero bytes
//! and the encryption is an overlapping chained Twofish construction over
//! the 18-byte plaintext (16-byte block, so the middle 14 bytes overlap):
//! encrypt bytes[0..16], XOR the first two ciphered bytes onto bytes
//! [16..18], encrypt bytes[2..18]. Anyone can produce a tag for any index;
//! only the holder of `s_ct` can invert one, and a failed MAC rejects
//! foreign tags with probability 1 - 2^-16.
//!
//! On an enote the tag is additionally XOR-masked with a secret derived
//! from the sender-receiver secret `q`; integrity comes transitively from
//! `q` itself, a corrupted tag simply fails the MAC.

use std::ops::BitXor;

use twofish::cipher::array::Array as GenericArray;
use twofish::cipher::{BlockCipherDecrypt, BlockCipherEncrypt, KeyInit};
use twofish::Twofish;

use crate::address::{AddressIndex, ADDRESS_INDEX_BYTES};
use crate::hash::hash32;

/// MAC width appended to the 16-byte index.
pub const ADDRESS_TAG_MAC_BYTES: usize = 2;

/// Ciphered tag width on the wire.
pub const ADDRESS_TAG_BYTES: usize = ADDRESS_INDEX_BYTES + ADDRESS_TAG_MAC_BYTES;

const TWOFISH_BLOCK_BYTES: usize = 16;
const NONOVERLAPPING_WIDTH: usize = ADDRESS_TAG_BYTES - TWOFISH_BLOCK_BYTES;

const DOMAIN_ENCRYPTED_ADDRESS_TAG: &str = "jamtis_encrypted_address_tag";

/// An address index ciphered under the wallet's cipher-tag secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressTag(pub [u8; ADDRESS_TAG_BYTES]);

impl BitXor for AddressTag {
    type Output = AddressTag;

    fn bitxor(self, other: AddressTag) -> AddressTag {
        let mut out = self.0;
        for (byte, other_byte) in out.iter_mut().zip(other.0.iter()) {
            *byte ^= other_byte;
        }
        AddressTag(out)
    }
}

/// Twofish key schedule for ciphering address tags.
///
/// Built once per wallet from `s_ct`. Deliberately not `Clone`: the key
/// schedule must not be duplicated outside the owning wallet context.
pub struct CipherContext {
    cipher: Twofish,
}

impl CipherContext {
    pub fn new(cipher_key: &[u8; 32]) -> CipherContext {
        CipherContext {
            cipher: Twofish::new(GenericArray::from_slice(cipher_key)),
        }
    }

    /// `cipher(j) -> t`: encipher an index with an all-zero MAC.
    pub fn cipher(&self, j: AddressIndex) -> AddressTag {
        let mut tag = [0u8; ADDRESS_TAG_BYTES];
        tag[..ADDRESS_INDEX_BYTES].copy_from_slice(&j.0);

        // first block
        let mut block = GenericArray::clone_from_slice(&tag[..TWOFISH_BLOCK_BYTES]);
        self.cipher.encrypt_block(&mut block);
        tag[..TWOFISH_BLOCK_BYTES].copy_from_slice(&block);

        // XOR the non-overlapping pieces
        for offset in 0..NONOVERLAPPING_WIDTH {
            tag[offset + TWOFISH_BLOCK_BYTES] ^= tag[offset];
        }

        // second, overlapping block
        let mut block = GenericArray::clone_from_slice(&tag[NONOVERLAPPING_WIDTH..]);
        self.cipher.encrypt_block(&mut block);
        tag[NONOVERLAPPING_WIDTH..].copy_from_slice(&block);

        AddressTag(tag)
    }

    /// `try_decipher(t) -> Option<j>`: invert the tag, `None` if the MAC is
    /// not all-zero.
    pub fn try_decipher(&self, tag: AddressTag) -> Option<AddressIndex> {
        let mut tag = tag.0;

        // second block first
        let mut block = GenericArray::clone_from_slice(&tag[NONOVERLAPPING_WIDTH..]);
        self.cipher.decrypt_block(&mut block);
        tag[NONOVERLAPPING_WIDTH..].copy_from_slice(&block);

        // undo the XOR; this exposes the MAC before the first block is touched
        for offset in 0..NONOVERLAPPING_WIDTH {
            tag[offset + TWOFISH_BLOCK_BYTES] ^= tag[offset];
        }

        if tag[ADDRESS_INDEX_BYTES..].iter().any(|&byte| byte != 0) {
            return None;
        }

        // first block
        let mut block = GenericArray::clone_from_slice(&tag[..TWOFISH_BLOCK_BYTES]);
        self.cipher.decrypt_block(&mut block);
        tag[..TWOFISH_BLOCK_BYTES].copy_from_slice(&block);

        let mut index = [0u8; ADDRESS_INDEX_BYTES];
        index.copy_from_slice(&tag[..ADDRESS_INDEX_BYTES]);
        Some(AddressIndex(index))
    }
}

fn encrypted_address_tag_secret(sender_receiver_secret: &[u8; 32]) -> AddressTag {
    let digest = hash32(DOMAIN_ENCRYPTED_ADDRESS_TAG, &[sender_receiver_secret]);
    let mut secret = [0u8; ADDRESS_TAG_BYTES];
    secret.copy_from_slice(&digest[..ADDRESS_TAG_BYTES]);
    AddressTag(secret)
}

/// `t_enc = t XOR trunc_18(H_32(q))`.
pub fn encrypt_address_tag(sender_receiver_secret: &[u8; 32], tag: AddressTag) -> AddressTag {
    tag ^ encrypted_address_tag_secret(sender_receiver_secret)
}

/// Inverse of [`encrypt_address_tag`].
pub fn decrypt_address_tag(sender_receiver_secret: &[u8; 32], tag_enc: AddressTag) -> AddressTag {
    tag_enc ^ encrypted_address_tag_secret(sender_receiver_secret)
}
