//! Three-tier enote record extraction.
//!
//! Plain enotes go basic → intermediate → full, each tier a stricter
//! filter; the failures (view-tag mismatch, bad MAC, spend-key or
//! commitment mismatch) are the normal case for foreign enotes and come
//! back as `None`. Self-sends have no view tag: the scanner tries each
//! self-send secret in turn, at most three hash-and-compare rounds.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;

use seraphis_crypto::address::{
    make_address_privkey, make_address_spend_key, make_spendkey_extension, AddressIndex,
};
use seraphis_crypto::address_tag::{decrypt_address_tag, CipherContext};
use seraphis_crypto::enote::SelfSendType;
use seraphis_crypto::{enote_utils, sp_core, Enote, JamtisKeys};

use crate::records::{BasicEnoteRecord, EnoteRecord, IntermediateEnoteRecord};

/// `k_a = H_n(q) + k^j_x + k_vb` — enote view privkey.
pub fn make_enote_view_privkey(
    k_view_balance: &Scalar,
    s_generate_address: &[u8; 32],
    j: AddressIndex,
    sender_receiver_secret: &[u8; 32],
) -> Scalar {
    let spendkey_extension = make_spendkey_extension(s_generate_address, j);
    let sender_extension = enote_utils::make_onetime_address_extension(sender_receiver_secret);
    sender_extension + spendkey_extension + k_view_balance
}

/// `KI = (k_m / k_a) U`, formed from the view-balance key and the public
/// spend base (`k_m U = K_s - k_vb X`).
fn make_key_image(
    spend_pubkey: &EdwardsPoint,
    k_view_balance: &Scalar,
    enote_view_privkey: &Scalar,
) -> Option<EdwardsPoint> {
    let spendbase = sp_core::reduce_seraphis_spendkey(k_view_balance, spend_pubkey);
    sp_core::make_seraphis_key_image(enote_view_privkey, &spendbase).ok()
}

/// Tier 1: test the view tag and assemble a basic record (plain enotes).
pub fn try_get_basic_enote_record(
    enote: &Enote,
    enote_ephemeral_pubkey: &MontgomeryPoint,
    input_context: &[u8; 32],
    xk_find_received: &Scalar,
) -> Option<BasicEnoteRecord> {
    let derivation =
        enote_utils::make_sender_receiver_derivation(xk_find_received, enote_ephemeral_pubkey);

    let (nominal_sender_receiver_secret, nominal_spend_key) =
        enote_utils::try_get_nominal_spend_key_plain(
            &derivation,
            input_context,
            &enote.onetime_address,
            enote.view_tag,
        )?;

    let nominal_address_tag =
        decrypt_address_tag(&nominal_sender_receiver_secret, enote.addr_tag_enc);

    Some(BasicEnoteRecord {
        enote: *enote,
        enote_ephemeral_pubkey: *enote_ephemeral_pubkey,
        input_context: *input_context,
        nominal_sender_receiver_secret,
        nominal_spend_key,
        nominal_address_tag,
    })
}

/// Tier 2: decipher the tag, check ownership, recover the amount.
pub fn try_get_intermediate_enote_record(
    basic_record: &BasicEnoteRecord,
    spend_pubkey: &EdwardsPoint,
    xk_unlock_amounts: &Scalar,
    s_generate_address: &[u8; 32],
    cipher_context: &CipherContext,
) -> Option<IntermediateEnoteRecord> {
    // j (fails on a foreign MAC)
    let address_index = cipher_context.try_decipher(basic_record.nominal_address_tag)?;

    // K'_1 ?= K_1(j)
    let expected_spend_key =
        make_address_spend_key(spend_pubkey, s_generate_address, address_index);
    if expected_spend_key != basic_record.nominal_spend_key {
        return None;
    }

    // amount under the recipient-side baked key
    let address_privkey = make_address_privkey(s_generate_address, address_index);
    let baked_key = enote_utils::make_amount_baked_key_plain_recipient(
        xk_unlock_amounts,
        &address_privkey,
        &basic_record.enote_ephemeral_pubkey,
    );
    let (amount, amount_blinding_factor) = enote_utils::try_get_amount_plain(
        &basic_record.nominal_sender_receiver_secret,
        &baked_key,
        &basic_record.enote.amount_commitment,
        basic_record.enote.encoded_amount,
    )?;

    Some(IntermediateEnoteRecord {
        enote: basic_record.enote,
        enote_ephemeral_pubkey: basic_record.enote_ephemeral_pubkey,
        input_context: basic_record.input_context,
        sender_receiver_secret: basic_record.nominal_sender_receiver_secret,
        address_index,
        amount,
        amount_blinding_factor,
    })
}

/// Tier 3: add the enote view privkey and the key image.
pub fn try_get_full_enote_record(
    intermediate: &IntermediateEnoteRecord,
    spend_pubkey: &EdwardsPoint,
    k_view_balance: &Scalar,
    s_generate_address: &[u8; 32],
) -> Option<EnoteRecord> {
    let enote_view_privkey = make_enote_view_privkey(
        k_view_balance,
        s_generate_address,
        intermediate.address_index,
        &intermediate.sender_receiver_secret,
    );
    let key_image = make_key_image(spend_pubkey, k_view_balance, &enote_view_privkey)?;

    Some(EnoteRecord {
        enote: intermediate.enote,
        enote_ephemeral_pubkey: intermediate.enote_ephemeral_pubkey,
        input_context: intermediate.input_context,
        address_index: intermediate.address_index,
        amount: intermediate.amount,
        amount_blinding_factor: intermediate.amount_blinding_factor,
        enote_view_privkey,
        key_image: key_image.compress().to_bytes(),
        enote_type: seraphis_crypto::EnoteType::Plain,
    })
}

/// Full plain-enote recovery (all three tiers in one call).
pub fn try_get_enote_record_plain(
    enote: &Enote,
    enote_ephemeral_pubkey: &MontgomeryPoint,
    input_context: &[u8; 32],
    keys: &JamtisKeys,
    cipher_context: &CipherContext,
) -> Option<EnoteRecord> {
    let basic = try_get_basic_enote_record(
        enote,
        enote_ephemeral_pubkey,
        input_context,
        &keys.xk_find_received,
    )?;
    let intermediate = try_get_intermediate_enote_record(
        &basic,
        &keys.spend_pubkey,
        &keys.xk_unlock_amounts,
        &keys.s_generate_address,
        cipher_context,
    )?;
    try_get_full_enote_record(
        &intermediate,
        &keys.spend_pubkey,
        &keys.k_view_balance,
        &keys.s_generate_address,
    )
}

fn try_get_enote_record_selfsend_type(
    enote: &Enote,
    enote_ephemeral_pubkey: &MontgomeryPoint,
    input_context: &[u8; 32],
    keys: &JamtisKeys,
    cipher_context: &CipherContext,
    self_send_type: SelfSendType,
) -> Option<EnoteRecord> {
    let sender_receiver_secret = enote_utils::make_sender_receiver_secret_selfsend(
        &keys.k_view_balance,
        enote_ephemeral_pubkey,
        input_context,
        self_send_type,
    );

    let onetime_address = CompressedEdwardsY(enote.onetime_address).decompress()?;
    let nominal_spend_key =
        enote_utils::make_nominal_spend_key(&sender_receiver_secret, &onetime_address);

    // j (fails on a foreign MAC)
    let nominal_address_tag = decrypt_address_tag(&sender_receiver_secret, enote.addr_tag_enc);
    let address_index = cipher_context.try_decipher(nominal_address_tag)?;

    // K'_1 ?= K_1(j)
    let expected_spend_key =
        make_address_spend_key(&keys.spend_pubkey, &keys.s_generate_address, address_index);
    if expected_spend_key != nominal_spend_key {
        return None;
    }

    // amount (no baked key for self-sends)
    let (amount, amount_blinding_factor) = enote_utils::try_get_amount_selfsend(
        &sender_receiver_secret,
        &enote.amount_commitment,
        enote.encoded_amount,
    )?;

    let enote_view_privkey = make_enote_view_privkey(
        &keys.k_view_balance,
        &keys.s_generate_address,
        address_index,
        &sender_receiver_secret,
    );
    let key_image = make_key_image(&keys.spend_pubkey, &keys.k_view_balance, &enote_view_privkey)?;

    Some(EnoteRecord {
        enote: *enote,
        enote_ephemeral_pubkey: *enote_ephemeral_pubkey,
        input_context: *input_context,
        address_index,
        amount,
        amount_blinding_factor,
        enote_view_privkey,
        key_image: key_image.compress().to_bytes(),
        enote_type: self_send_type.enote_type(),
    })
}

/// Full self-send recovery: try each self-send secret in turn.
pub fn try_get_enote_record_selfsend(
    enote: &Enote,
    enote_ephemeral_pubkey: &MontgomeryPoint,
    input_context: &[u8; 32],
    keys: &JamtisKeys,
    cipher_context: &CipherContext,
) -> Option<EnoteRecord> {
    SelfSendType::ALL.iter().find_map(|&self_send_type| {
        try_get_enote_record_selfsend_type(
            enote,
            enote_ephemeral_pubkey,
            input_context,
            keys,
            cipher_context,
            self_send_type,
        )
    })
}

/// Full recovery for one enote; self-sends are tried first since they
/// dominate a wallet's own transactions.
pub fn try_get_enote_record(
    enote: &Enote,
    enote_ephemeral_pubkey: &MontgomeryPoint,
    input_context: &[u8; 32],
    keys: &JamtisKeys,
    cipher_context: &CipherContext,
) -> Option<EnoteRecord> {
    try_get_enote_record_selfsend(enote, enote_ephemeral_pubkey, input_context, keys, cipher_context)
        .or_else(|| {
            try_get_enote_record_plain(
                enote,
                enote_ephemeral_pubkey,
                input_context,
                keys,
                cipher_context,
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use seraphis_crypto::address::make_destination;
    use seraphis_crypto::address_tag::encrypt_address_tag;
    use seraphis_crypto::EnoteType;

    fn wallet() -> (JamtisKeys, CipherContext) {
        let keys = JamtisKeys::derive(Scalar::from(0xfeed_beefu64));
        let cipher = CipherContext::new(&keys.s_cipher_tag);
        (keys, cipher)
    }

    fn build_plain_enote(
        keys: &JamtisKeys,
        cipher: &CipherContext,
        j: AddressIndex,
        amount: u64,
        r: Scalar,
        input_context: &[u8; 32],
    ) -> (Enote, MontgomeryPoint, Scalar) {
        let destination = make_destination(
            &keys.spend_pubkey,
            &keys.unlockamounts_pubkey,
            &keys.findreceived_pubkey,
            &keys.s_generate_address,
            cipher,
            j,
        );

        let ephemeral_pubkey =
            enote_utils::make_enote_ephemeral_pubkey(&r, &destination.base_pubkey);
        let derivation =
            enote_utils::make_sender_receiver_derivation(&r, &destination.view_pubkey);
        let q = enote_utils::make_sender_receiver_secret_plain(&derivation, input_context);

        let onetime_address = enote_utils::make_onetime_address(&q, &destination.spend_pubkey)
            .compress()
            .to_bytes();
        let baked_key = enote_utils::make_amount_baked_key_plain_sender(&r);
        let blinding_factor = enote_utils::make_amount_blinding_factor_plain(&q, &baked_key);

        let enote = Enote {
            onetime_address,
            amount_commitment: enote_utils::make_amount_commitment(amount, &blinding_factor)
                .compress()
                .to_bytes(),
            encoded_amount: enote_utils::encode_amount_plain(amount, &q, &baked_key),
            addr_tag_enc: encrypt_address_tag(&q, destination.addr_tag),
            view_tag: enote_utils::make_view_tag(&derivation, &onetime_address),
        };
        (enote, ephemeral_pubkey, blinding_factor)
    }

    fn build_selfsend_enote(
        keys: &JamtisKeys,
        cipher: &CipherContext,
        j: AddressIndex,
        amount: u64,
        r: Scalar,
        input_context: &[u8; 32],
        self_send_type: SelfSendType,
    ) -> (Enote, MontgomeryPoint) {
        let destination = make_destination(
            &keys.spend_pubkey,
            &keys.unlockamounts_pubkey,
            &keys.findreceived_pubkey,
            &keys.s_generate_address,
            cipher,
            j,
        );

        let ephemeral_pubkey =
            enote_utils::make_enote_ephemeral_pubkey(&r, &destination.base_pubkey);
        let q = enote_utils::make_sender_receiver_secret_selfsend(
            &keys.k_view_balance,
            &ephemeral_pubkey,
            input_context,
            self_send_type,
        );

        let onetime_address = enote_utils::make_onetime_address(&q, &destination.spend_pubkey)
            .compress()
            .to_bytes();
        let blinding_factor = enote_utils::make_amount_blinding_factor_selfsend(&q);
        let derivation = enote_utils::make_sender_receiver_derivation(
            &keys.xk_find_received,
            &ephemeral_pubkey,
        );

        let enote = Enote {
            onetime_address,
            amount_commitment: enote_utils::make_amount_commitment(amount, &blinding_factor)
                .compress()
                .to_bytes(),
            encoded_amount: enote_utils::encode_amount_selfsend(amount, &q),
            addr_tag_enc: encrypt_address_tag(&q, destination.addr_tag),
            view_tag: enote_utils::make_view_tag(&derivation, &onetime_address),
        };
        (enote, ephemeral_pubkey)
    }

    #[test]
    fn plain_enote_recovers_through_all_tiers() {
        let (keys, cipher) = wallet();
        let j = AddressIndex::from_u128(0xabcd);
        let amount = 1_000_000_007u64;
        let input_context = enote_utils::make_input_context_standard(&[[3u8; 32]]);

        let (enote, ephemeral_pubkey, blinding_factor) = build_plain_enote(
            &keys,
            &cipher,
            j,
            amount,
            Scalar::from(4242u64),
            &input_context,
        );

        let record =
            try_get_enote_record(&enote, &ephemeral_pubkey, &input_context, &keys, &cipher)
                .expect("owned enote must recover");
        assert_eq!(record.address_index, j);
        assert_eq!(record.amount, amount);
        assert_eq!(record.amount_blinding_factor, blinding_factor);
        assert_eq!(record.enote_type, EnoteType::Plain);

        // key image is deterministic for the enote
        let again =
            try_get_enote_record(&enote, &ephemeral_pubkey, &input_context, &keys, &cipher)
                .unwrap();
        assert_eq!(record.key_image, again.key_image);
    }

    #[test]
    fn selfsend_enotes_recover_with_their_type() {
        let (keys, cipher) = wallet();
        let input_context = enote_utils::make_input_context_coinbase(55);

        for (i, self_send_type) in SelfSendType::ALL.into_iter().enumerate() {
            let (enote, ephemeral_pubkey) = build_selfsend_enote(
                &keys,
                &cipher,
                AddressIndex::from_u128(i as u128),
                500 + i as u64,
                Scalar::from(77u64 + i as u64),
                &input_context,
                self_send_type,
            );

            let record =
                try_get_enote_record(&enote, &ephemeral_pubkey, &input_context, &keys, &cipher)
                    .expect("own self-send must recover");
            assert_eq!(record.enote_type, self_send_type.enote_type());
            assert_eq!(record.amount, 500 + i as u64);
        }
    }

    #[test]
    fn foreign_enote_is_rejected_at_the_basic_tier() {
        let (keys, cipher) = wallet();
        let (other_keys, other_cipher) = {
            let other = JamtisKeys::derive(Scalar::from(0xdddu64));
            let other_cipher = CipherContext::new(&other.s_cipher_tag);
            (other, other_cipher)
        };
        let input_context = enote_utils::make_input_context_coinbase(1);

        let mut view_tag_hits = 0;
        for i in 0..32u64 {
            let (enote, ephemeral_pubkey, _) = build_plain_enote(
                &other_keys,
                &other_cipher,
                AddressIndex::from_u128(i as u128),
                10,
                Scalar::from(1000 + i),
                &input_context,
            );

            assert!(try_get_enote_record(
                &enote,
                &ephemeral_pubkey,
                &input_context,
                &keys,
                &cipher
            )
            .is_none());

            if try_get_basic_enote_record(
                &enote,
                &ephemeral_pubkey,
                &input_context,
                &keys.xk_find_received,
            )
            .is_some()
            {
                view_tag_hits += 1;
            }
        }
        // ~1/256 of foreign enotes pass the view tag by chance
        assert!(view_tag_hits <= 3, "{view_tag_hits} view-tag passes");
    }

    #[test]
    fn intermediate_tier_stops_without_view_balance() {
        let (keys, cipher) = wallet();
        let j = AddressIndex::from_u128(9);
        let input_context = enote_utils::make_input_context_coinbase(12);

        let (enote, ephemeral_pubkey, _) =
            build_plain_enote(&keys, &cipher, j, 333, Scalar::from(5u64), &input_context);

        let basic = try_get_basic_enote_record(
            &enote,
            &ephemeral_pubkey,
            &input_context,
            &keys.xk_find_received,
        )
        .expect("view tag must pass");

        let intermediate = try_get_intermediate_enote_record(
            &basic,
            &keys.spend_pubkey,
            &keys.xk_unlock_amounts,
            &keys.s_generate_address,
            &cipher,
        )
        .expect("intermediate info must recover");
        assert_eq!(intermediate.address_index, j);
        assert_eq!(intermediate.amount, 333);
    }
}
