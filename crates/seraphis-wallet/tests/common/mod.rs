//! Shared fixtures for scanning tests: hand-built enotes and mock txs.

use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;

use seraphis_crypto::address::{make_destination, AddressIndex};
use seraphis_crypto::address_tag::{encrypt_address_tag, CipherContext};
use seraphis_crypto::{enote_utils, Enote, JamtisKeys};
use seraphis_wallet::mock_ledger::MockTx;

pub fn wallet(seed: u64) -> (JamtisKeys, CipherContext) {
    let keys = JamtisKeys::derive(Scalar::from(seed));
    let cipher = CipherContext::new(&keys.s_cipher_tag);
    (keys, cipher)
}

/// Build a plain enote paying `amount` to `(keys, j)`.
pub fn build_plain_enote(
    keys: &JamtisKeys,
    cipher: &CipherContext,
    j: AddressIndex,
    amount: u64,
    r: Scalar,
    input_context: &[u8; 32],
) -> (Enote, MontgomeryPoint) {
    let destination = make_destination(
        &keys.spend_pubkey,
        &keys.unlockamounts_pubkey,
        &keys.findreceived_pubkey,
        &keys.s_generate_address,
        cipher,
        j,
    );

    let ephemeral_pubkey = enote_utils::make_enote_ephemeral_pubkey(&r, &destination.base_pubkey);
    let derivation = enote_utils::make_sender_receiver_derivation(&r, &destination.view_pubkey);
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
    (enote, ephemeral_pubkey)
}

/// A coinbase-style tx at `block_height` paying `amount` to `(keys, j)`.
pub fn coinbase_tx(
    keys: &JamtisKeys,
    cipher: &CipherContext,
    j: AddressIndex,
    amount: u64,
    block_height: u64,
    r_seed: u64,
) -> MockTx {
    let input_context = enote_utils::make_input_context_coinbase(block_height);
    let (enote, ephemeral_pubkey) = build_plain_enote(
        keys,
        cipher,
        j,
        amount,
        Scalar::from(r_seed),
        &input_context,
    );

    let mut tx_id = [0u8; 32];
    tx_id[..8].copy_from_slice(&block_height.to_le_bytes());
    tx_id[8..16].copy_from_slice(&r_seed.to_le_bytes());

    MockTx {
        tx_id,
        input_context,
        outputs: vec![(enote, ephemeral_pubkey)],
        spent_key_images: vec![],
    }
}
