//! Payment proposals and their conversion to output proposals.
//!
//! A payment proposal is the user-level intent "send `amount` to
//! `destination`"; converting it binds the enote to an input context and
//! produces every on-chain field. Self-send proposals derive the
//! sender-receiver secret from the view-balance key instead of a DH
//! exchange.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, RngCore};

use seraphis_crypto::address_tag::{encrypt_address_tag, AddressTag, ADDRESS_TAG_BYTES};
use seraphis_crypto::{enote_utils, random_scalar, Destination, Enote, SelfSendType};

use crate::extra::ExtraFieldElement;

/// A concrete output ready for the output set: all on-chain fields plus
/// the data needed for balance proofs.
#[derive(Debug, Clone)]
pub struct OutputProposal {
    pub onetime_address: EdwardsPoint,
    pub amount: u64,
    pub amount_blinding_factor: Scalar,
    pub enote_ephemeral_pubkey: MontgomeryPoint,
    pub encoded_amount: [u8; 8],
    pub addr_tag_enc: AddressTag,
    pub view_tag: u8,
    pub partial_memo: Vec<ExtraFieldElement>,
    /// Set when this wallet constructed the output as a self-send.
    pub self_send_type: Option<SelfSendType>,
}

impl OutputProposal {
    pub fn enote(&self) -> Enote {
        Enote {
            onetime_address: self.onetime_address.compress().to_bytes(),
            amount_commitment: enote_utils::make_amount_commitment(
                self.amount,
                &self.amount_blinding_factor,
            )
            .compress()
            .to_bytes(),
            encoded_amount: self.encoded_amount,
            addr_tag_enc: self.addr_tag_enc,
            view_tag: self.view_tag,
        }
    }

    /// Random unrecoverable output (dummies).
    pub fn gen<R: RngCore + CryptoRng>(rng: &mut R, amount: u64) -> OutputProposal {
        let mut encoded_amount = [0u8; 8];
        rng.fill_bytes(&mut encoded_amount);
        let mut addr_tag_enc = [0u8; ADDRESS_TAG_BYTES];
        rng.fill_bytes(&mut addr_tag_enc);
        let mut view_tag = [0u8; 1];
        rng.fill_bytes(&mut view_tag);

        OutputProposal {
            onetime_address: random_scalar(rng) * seraphis_crypto::generators::g_gen(),
            amount,
            amount_blinding_factor: random_scalar(rng),
            enote_ephemeral_pubkey: seraphis_crypto::x25519::scmul_base(&random_scalar(rng)),
            encoded_amount,
            addr_tag_enc: AddressTag(addr_tag_enc),
            view_tag: view_tag[0],
            partial_memo: Vec::new(),
            self_send_type: None,
        }
    }
}

/// Plain payment to a third-party destination.
#[derive(Debug, Clone)]
pub struct PaymentProposal {
    pub destination: Destination,
    pub amount: u64,
    /// `r`.
    pub enote_ephemeral_privkey: Scalar,
    pub partial_memo: Vec<ExtraFieldElement>,
}

impl PaymentProposal {
    pub fn new<R: RngCore + CryptoRng>(
        destination: Destination,
        amount: u64,
        rng: &mut R,
    ) -> PaymentProposal {
        PaymentProposal {
            destination,
            amount,
            enote_ephemeral_privkey: random_scalar(rng),
            partial_memo: Vec::new(),
        }
    }

    /// Build the output proposal for a given input context.
    pub fn output_proposal(&self, input_context: &[u8; 32]) -> OutputProposal {
        let r = &self.enote_ephemeral_privkey;

        let enote_ephemeral_pubkey =
            enote_utils::make_enote_ephemeral_pubkey(r, &self.destination.base_pubkey);
        let derivation =
            enote_utils::make_sender_receiver_derivation(r, &self.destination.view_pubkey);
        let sender_receiver_secret =
            enote_utils::make_sender_receiver_secret_plain(&derivation, input_context);

        let onetime_address = enote_utils::make_onetime_address(
            &sender_receiver_secret,
            &self.destination.spend_pubkey,
        );
        let baked_key = enote_utils::make_amount_baked_key_plain_sender(r);

        OutputProposal {
            onetime_address,
            amount: self.amount,
            amount_blinding_factor: enote_utils::make_amount_blinding_factor_plain(
                &sender_receiver_secret,
                &baked_key,
            ),
            enote_ephemeral_pubkey,
            encoded_amount: enote_utils::encode_amount_plain(
                self.amount,
                &sender_receiver_secret,
                &baked_key,
            ),
            addr_tag_enc: encrypt_address_tag(&sender_receiver_secret, self.destination.addr_tag),
            view_tag: enote_utils::make_view_tag(
                &derivation,
                onetime_address.compress().as_bytes(),
            ),
            partial_memo: self.partial_memo.clone(),
            self_send_type: None,
        }
    }
}

/// Payment from the tx author to themselves (change, self-spend, dummy).
#[derive(Debug, Clone)]
pub struct SelfSendPaymentProposal {
    pub destination: Destination,
    pub amount: u64,
    pub self_send_type: SelfSendType,
    /// `r`.
    pub enote_ephemeral_privkey: Scalar,
    pub partial_memo: Vec<ExtraFieldElement>,
}

impl SelfSendPaymentProposal {
    pub fn new<R: RngCore + CryptoRng>(
        destination: Destination,
        amount: u64,
        self_send_type: SelfSendType,
        rng: &mut R,
    ) -> SelfSendPaymentProposal {
        SelfSendPaymentProposal {
            destination,
            amount,
            self_send_type,
            enote_ephemeral_privkey: random_scalar(rng),
            partial_memo: Vec::new(),
        }
    }

    /// Build the output proposal; `q` comes from the view-balance key, so
    /// no DH secret is involved.
    pub fn output_proposal(
        &self,
        k_view_balance: &Scalar,
        input_context: &[u8; 32],
    ) -> OutputProposal {
        let r = &self.enote_ephemeral_privkey;

        let enote_ephemeral_pubkey =
            enote_utils::make_enote_ephemeral_pubkey(r, &self.destination.base_pubkey);
        let sender_receiver_secret = enote_utils::make_sender_receiver_secret_selfsend(
            k_view_balance,
            &enote_ephemeral_pubkey,
            input_context,
            self.self_send_type,
        );

        let onetime_address = enote_utils::make_onetime_address(
            &sender_receiver_secret,
            &self.destination.spend_pubkey,
        );

        // the view tag is filled like a plain enote's; self-send recovery
        // does not read it
        let derivation =
            enote_utils::make_sender_receiver_derivation(r, &self.destination.view_pubkey);

        OutputProposal {
            onetime_address,
            amount: self.amount,
            amount_blinding_factor: enote_utils::make_amount_blinding_factor_selfsend(
                &sender_receiver_secret,
            ),
            enote_ephemeral_pubkey,
            encoded_amount: enote_utils::encode_amount_selfsend(
                self.amount,
                &sender_receiver_secret,
            ),
            addr_tag_enc: encrypt_address_tag(&sender_receiver_secret, self.destination.addr_tag),
            view_tag: enote_utils::make_view_tag(
                &derivation,
                onetime_address.compress().as_bytes(),
            ),
            partial_memo: self.partial_memo.clone(),
            self_send_type: Some(self.self_send_type),
        }
    }
}
