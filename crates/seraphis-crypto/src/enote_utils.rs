//! Per-enote derivations for senders and the recovery tiers.
//!
//! Everything flows from the sender-receiver secret `q`. For plain enotes
//! `q` comes out of an X25519 DH exchange bound to the input context; for
//! self-sends the author derives `q` directly from the view-balance key, so
//! recovery needs no DH and no view tag.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::VartimeMultiscalarMul;

use crate::enote::{KeyImage, SelfSendType};
use crate::generators::{g_gen, h_gen, x_gen};
use crate::hash::{hash1, hash32, hash8, hash_scalar, derive_secret};
use crate::x25519;

const DOMAIN_VIEW_TAG: &str = "jamtis_view_tag";
const DOMAIN_SENDER_RECEIVER_SECRET_PLAIN: &str = "jamtis_sender_receiver_secret_plain";
const DOMAIN_SENDER_RECEIVER_SECRET_DUMMY: &str = "jamtis_sender_receiver_secret_selfsend_dummy";
const DOMAIN_SENDER_RECEIVER_SECRET_CHANGE: &str = "jamtis_sender_receiver_secret_selfsend_change";
const DOMAIN_SENDER_RECEIVER_SECRET_SELF_SPEND: &str =
    "jamtis_sender_receiver_secret_selfsend_self_spend";
const DOMAIN_ONETIME_ADDRESS_EXTENSION: &str = "jamtis_onetime_address_extension";
const DOMAIN_AMOUNT_BLINDING_FACTOR_PLAIN: &str = "jamtis_amount_blinding_factor_plain";
const DOMAIN_AMOUNT_BLINDING_FACTOR_SELFSEND: &str = "jamtis_amount_blinding_factor_selfsend";
const DOMAIN_ENCODED_AMOUNT_PLAIN: &str = "jamtis_encoded_amount_plain";
const DOMAIN_ENCODED_AMOUNT_SELFSEND: &str = "jamtis_encoded_amount_selfsend";
const DOMAIN_INPUT_CONTEXT_COINBASE: &str = "jamtis_input_context_coinbase";
const DOMAIN_INPUT_CONTEXT_STANDARD: &str = "jamtis_input_context_standard";

fn self_send_domain_separator(self_send_type: SelfSendType) -> &'static str {
    match self_send_type {
        SelfSendType::Dummy => DOMAIN_SENDER_RECEIVER_SECRET_DUMMY,
        SelfSendType::Change => DOMAIN_SENDER_RECEIVER_SECRET_CHANGE,
        SelfSendType::SelfSpend => DOMAIN_SENDER_RECEIVER_SECRET_SELF_SPEND,
    }
}

// ─── Input contexts ─────────────────────────────────────────────────────────

/// Input context of a coinbase transaction: `H_32(block height)`.
pub fn make_input_context_coinbase(block_height: u64) -> [u8; 32] {
    hash32(DOMAIN_INPUT_CONTEXT_COINBASE, &[&block_height.to_le_bytes()])
}

/// Input context of a normal transaction: `H_32(sorted input key images)`.
pub fn make_input_context_standard(input_key_images: &[KeyImage]) -> [u8; 32] {
    let mut sorted: Vec<KeyImage> = input_key_images.to_vec();
    sorted.sort_unstable();

    let parts: Vec<&[u8]> = sorted.iter().map(|ki| ki.as_slice()).collect();
    hash32(DOMAIN_INPUT_CONTEXT_STANDARD, &parts)
}

// ─── DH and sender-receiver secrets ─────────────────────────────────────────

/// `K_e = r * xK_3`.
pub fn make_enote_ephemeral_pubkey(
    enote_ephemeral_privkey: &Scalar,
    dh_base: &MontgomeryPoint,
) -> MontgomeryPoint {
    x25519::scmul_key(enote_ephemeral_privkey, dh_base)
}

/// `K_d = 8 * privkey * DH_key` — sender uses `(r, xK_2)`, recipient uses
/// `(xk_fr, K_e)`.
pub fn make_sender_receiver_derivation(
    privkey: &Scalar,
    dh_key: &MontgomeryPoint,
) -> MontgomeryPoint {
    x25519::scmul_key(&(Scalar::from(8u8) * privkey), dh_key)
}

/// `q = H_32(K_d, input_context)` for a plain enote.
pub fn make_sender_receiver_secret_plain(
    derivation: &MontgomeryPoint,
    input_context: &[u8; 32],
) -> [u8; 32] {
    hash32(
        DOMAIN_SENDER_RECEIVER_SECRET_PLAIN,
        &[derivation.as_bytes(), input_context],
    )
}

/// `q = H_32(Pad136(k_vb), K_e, input_context)` for a self-send enote; the
/// domain separator selects the self-send flavor.
pub fn make_sender_receiver_secret_selfsend(
    k_view_balance: &Scalar,
    enote_ephemeral_pubkey: &MontgomeryPoint,
    input_context: &[u8; 32],
    self_send_type: SelfSendType,
) -> [u8; 32] {
    derive_secret(
        self_send_domain_separator(self_send_type),
        k_view_balance.as_bytes(),
        &[enote_ephemeral_pubkey.as_bytes(), input_context],
    )
}

// ─── View tags and one-time addresses ───────────────────────────────────────

/// `view_tag = H_1(K_d, Ko)`.
pub fn make_view_tag(derivation: &MontgomeryPoint, onetime_address: &[u8; 32]) -> u8 {
    hash1(DOMAIN_VIEW_TAG, &[derivation.as_bytes(), onetime_address])
}

/// `k_{a,sender} = H_n(q)`.
pub fn make_onetime_address_extension(sender_receiver_secret: &[u8; 32]) -> Scalar {
    hash_scalar(DOMAIN_ONETIME_ADDRESS_EXTENSION, &[sender_receiver_secret])
}

/// `Ko = H_n(q) X + K_1`.
pub fn make_onetime_address(
    sender_receiver_secret: &[u8; 32],
    recipient_spend_key: &EdwardsPoint,
) -> EdwardsPoint {
    make_onetime_address_extension(sender_receiver_secret) * x_gen() + recipient_spend_key
}

/// `K'_1 = Ko - H_n(q) X` — nominal spend key.
pub fn make_nominal_spend_key(
    sender_receiver_secret: &[u8; 32],
    onetime_address: &EdwardsPoint,
) -> EdwardsPoint {
    onetime_address - make_onetime_address_extension(sender_receiver_secret) * x_gen()
}

// ─── Amount commitments and encodings ───────────────────────────────────────

/// Sender-side plain amount baked key: `8 r xG`.
pub fn make_amount_baked_key_plain_sender(enote_ephemeral_privkey: &Scalar) -> MontgomeryPoint {
    x25519::scmul_base(&(Scalar::from(8u8) * enote_ephemeral_privkey))
}

/// Recipient-side plain amount baked key: `8 (1/(xk_ua * xk^j_a)) K_e`.
pub fn make_amount_baked_key_plain_recipient(
    xk_unlock_amounts: &Scalar,
    address_privkey: &Scalar,
    enote_ephemeral_pubkey: &MontgomeryPoint,
) -> MontgomeryPoint {
    x25519::scmul_key(
        &Scalar::from(8u8),
        &x25519::invmul_key(&[xk_unlock_amounts, address_privkey], enote_ephemeral_pubkey),
    )
}

/// `x = H_n(q, baked_key)` — plain commitment blinding factor.
pub fn make_amount_blinding_factor_plain(
    sender_receiver_secret: &[u8; 32],
    baked_key: &MontgomeryPoint,
) -> Scalar {
    hash_scalar(
        DOMAIN_AMOUNT_BLINDING_FACTOR_PLAIN,
        &[sender_receiver_secret, baked_key.as_bytes()],
    )
}

/// `x = H_n(q)` — self-send commitment blinding factor.
pub fn make_amount_blinding_factor_selfsend(sender_receiver_secret: &[u8; 32]) -> Scalar {
    hash_scalar(DOMAIN_AMOUNT_BLINDING_FACTOR_SELFSEND, &[sender_receiver_secret])
}

/// `C = x G + a H`.
pub fn make_amount_commitment(amount: u64, blinding_factor: &Scalar) -> EdwardsPoint {
    EdwardsPoint::vartime_multiscalar_mul(
        &[*blinding_factor, Scalar::from(amount)],
        &[g_gen(), h_gen()],
    )
}

fn xor_amount(amount: u64, mask: [u8; 8]) -> [u8; 8] {
    let mut out = amount.to_le_bytes();
    for (byte, mask_byte) in out.iter_mut().zip(mask.iter()) {
        *byte ^= mask_byte;
    }
    out
}

/// `enc_a = a XOR H_8(q, baked_key)`.
pub fn encode_amount_plain(
    amount: u64,
    sender_receiver_secret: &[u8; 32],
    baked_key: &MontgomeryPoint,
) -> [u8; 8] {
    xor_amount(
        amount,
        hash8(DOMAIN_ENCODED_AMOUNT_PLAIN, &[sender_receiver_secret, baked_key.as_bytes()]),
    )
}

/// Inverse of [`encode_amount_plain`].
pub fn decode_amount_plain(
    encoded_amount: [u8; 8],
    sender_receiver_secret: &[u8; 32],
    baked_key: &MontgomeryPoint,
) -> u64 {
    u64::from_le_bytes(xor_amount(
        u64::from_le_bytes(encoded_amount),
        hash8(DOMAIN_ENCODED_AMOUNT_PLAIN, &[sender_receiver_secret, baked_key.as_bytes()]),
    ))
}

/// `enc_a = a XOR H_8(q)` for self-sends.
pub fn encode_amount_selfsend(amount: u64, sender_receiver_secret: &[u8; 32]) -> [u8; 8] {
    xor_amount(amount, hash8(DOMAIN_ENCODED_AMOUNT_SELFSEND, &[sender_receiver_secret]))
}

/// Inverse of [`encode_amount_selfsend`].
pub fn decode_amount_selfsend(encoded_amount: [u8; 8], sender_receiver_secret: &[u8; 32]) -> u64 {
    u64::from_le_bytes(xor_amount(
        u64::from_le_bytes(encoded_amount),
        hash8(DOMAIN_ENCODED_AMOUNT_SELFSEND, &[sender_receiver_secret]),
    ))
}

// ─── Recovery filters ───────────────────────────────────────────────────────

/// Test the view tag; on a pass, return the sender-receiver secret and the
/// nominal spend key (plain enotes).
pub fn try_get_nominal_spend_key_plain(
    derivation: &MontgomeryPoint,
    input_context: &[u8; 32],
    onetime_address: &[u8; 32],
    view_tag: u8,
) -> Option<([u8; 32], EdwardsPoint)> {
    if make_view_tag(derivation, onetime_address) != view_tag {
        return None;
    }

    let onetime_address = CompressedEdwardsY(*onetime_address).decompress()?;
    let sender_receiver_secret = make_sender_receiver_secret_plain(derivation, input_context);
    let nominal_spend_key = make_nominal_spend_key(&sender_receiver_secret, &onetime_address);
    Some((sender_receiver_secret, nominal_spend_key))
}

/// Recompute the amount commitment from a candidate decode; on a match,
/// return the amount and its blinding factor (plain enotes).
pub fn try_get_amount_plain(
    sender_receiver_secret: &[u8; 32],
    baked_key: &MontgomeryPoint,
    amount_commitment: &[u8; 32],
    encoded_amount: [u8; 8],
) -> Option<(u64, Scalar)> {
    let amount = decode_amount_plain(encoded_amount, sender_receiver_secret, baked_key);
    let blinding_factor = make_amount_blinding_factor_plain(sender_receiver_secret, baked_key);

    if make_amount_commitment(amount, &blinding_factor).compress().as_bytes() != amount_commitment {
        return None;
    }
    Some((amount, blinding_factor))
}

/// Self-send variant of [`try_get_amount_plain`].
pub fn try_get_amount_selfsend(
    sender_receiver_secret: &[u8; 32],
    amount_commitment: &[u8; 32],
    encoded_amount: [u8; 8],
) -> Option<(u64, Scalar)> {
    let amount = decode_amount_selfsend(encoded_amount, sender_receiver_secret);
    let blinding_factor = make_amount_blinding_factor_selfsend(sender_receiver_secret);

    if make_amount_commitment(amount, &blinding_factor).compress().as_bytes() != amount_commitment {
        return None;
    }
    Some((amount, blinding_factor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_and_recipient_derivations_agree() {
        // r on one side, xk_fr on the other, through the pubkey chain
        let r = Scalar::from(12345u64);
        let xk_ua = Scalar::from(222u64);
        let xk_fr = Scalar::from(333u64);
        let xk_a = Scalar::from(444u64);

        let xk_ua_pubkey = x25519::scmul_base(&xk_ua);
        let xk_fr_pubkey = x25519::scmul_key(&xk_fr, &xk_ua_pubkey);
        let view_pubkey = x25519::scmul_key(&xk_a, &xk_fr_pubkey); // xK_2
        let base_pubkey = x25519::scmul_key(&xk_a, &xk_ua_pubkey); // xK_3

        let ephemeral_pubkey = make_enote_ephemeral_pubkey(&r, &base_pubkey);

        let sender = make_sender_receiver_derivation(&r, &view_pubkey);
        let recipient = make_sender_receiver_derivation(&xk_fr, &ephemeral_pubkey);
        assert_eq!(sender, recipient);
    }

    #[test]
    fn baked_keys_agree() {
        let r = Scalar::from(5550123u64);
        let xk_ua = Scalar::from(77u64);
        let xk_a = Scalar::from(88u64);

        let base_pubkey = x25519::scmul_base(&(xk_a * xk_ua)); // xK_3
        let ephemeral_pubkey = make_enote_ephemeral_pubkey(&r, &base_pubkey);

        let sender = make_amount_baked_key_plain_sender(&r);
        let recipient = make_amount_baked_key_plain_recipient(&xk_ua, &xk_a, &ephemeral_pubkey);
        assert_eq!(sender, recipient);
    }

    #[test]
    fn onetime_address_round_trip() {
        let q = [0x17u8; 32];
        let spend_key = Scalar::from(9u64) * x_gen() + Scalar::from(4u64) * crate::generators::u_gen();

        let onetime_address = make_onetime_address(&q, &spend_key);
        assert_eq!(make_nominal_spend_key(&q, &onetime_address), spend_key);
    }

    #[test]
    fn amount_codec_round_trip() {
        let q = [0x2au8; 32];
        let baked = x25519::scmul_base(&Scalar::from(3u64));

        for amount in [0u64, 1, 1_000_000_000, u64::MAX] {
            let enc = encode_amount_plain(amount, &q, &baked);
            assert_eq!(decode_amount_plain(enc, &q, &baked), amount);

            let enc = encode_amount_selfsend(amount, &q);
            assert_eq!(decode_amount_selfsend(enc, &q), amount);
        }
    }

    #[test]
    fn zero_amount_commitment_is_blinding_only() {
        let blinding = Scalar::from(31u64);
        assert_eq!(make_amount_commitment(0, &blinding), blinding * g_gen());
    }

    #[test]
    fn amount_recovery_checks_commitment() {
        let q = [0x61u8; 32];
        let baked = x25519::scmul_base(&Scalar::from(13u64));
        let amount = 987_654u64;

        let blinding = make_amount_blinding_factor_plain(&q, &baked);
        let commitment = make_amount_commitment(amount, &blinding).compress().to_bytes();
        let encoded = encode_amount_plain(amount, &q, &baked);

        assert_eq!(try_get_amount_plain(&q, &baked, &commitment, encoded), Some((amount, blinding)));

        // wrong commitment is rejected
        let bad_commitment = make_amount_commitment(amount + 1, &blinding).compress().to_bytes();
        assert_eq!(try_get_amount_plain(&q, &baked, &bad_commitment, encoded), None);
    }

    #[test]
    fn input_context_sorts_key_images() {
        let ki_a = [1u8; 32];
        let ki_b = [2u8; 32];
        assert_eq!(
            make_input_context_standard(&[ki_a, ki_b]),
            make_input_context_standard(&[ki_b, ki_a])
        );
        assert_ne!(
            make_input_context_standard(&[ki_a]),
            make_input_context_coinbase(1)
        );
    }

    #[test]
    fn view_tags_spread_over_the_byte_range() {
        let mut seen = [false; 256];
        for i in 0..512u64 {
            let derivation = x25519::scmul_base(&Scalar::from(i + 1));
            seen[make_view_tag(&derivation, &[7u8; 32]) as usize] = true;
        }
        let distinct = seen.iter().filter(|&&hit| hit).count();
        // 512 samples over 256 buckets land on ~220 distinct values
        assert!(distinct > 150, "only {distinct} distinct view tags");
    }

    #[test]
    fn self_send_types_use_distinct_secrets() {
        let k_vb = Scalar::from(41u64);
        let ephemeral = x25519::scmul_base(&Scalar::from(6u64));
        let input_context = [0u8; 32];

        let secrets: Vec<[u8; 32]> = SelfSendType::ALL
            .iter()
            .map(|&t| make_sender_receiver_secret_selfsend(&k_vb, &ephemeral, &input_context, t))
            .collect();
        assert_ne!(secrets[0], secrets[1]);
        assert_ne!(secrets[0], secrets[2]);
        assert_ne!(secrets[1], secrets[2]);
    }
}
