//! Tx proposal, partial inputs, and partial-tx assembly.
//!
//! A tx proposal fixes the output side (sorted enotes + supplement) and
//! yields the proposal prefix every input proof binds to. Partial inputs
//! pair an enote image with its composition proof; a partial tx is
//! everything except membership proofs, which a later ring-selection step
//! supplies.

use curve25519_dalek::edwards::CompressedEdwardsY;
use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, RngCore};

use seraphis_crypto::address_tag::CipherContext;
use seraphis_crypto::hash::hash32;
use seraphis_crypto::{enote_utils, random_scalar, sp_core, CryptoError, Destination, Enote,
    EnoteImage, JamtisKeys};
use seraphis_wallet::records::EnoteRecord;
use seraphis_wallet::ContextualEnoteRecord;

use crate::error::TxError;
use crate::fee::FeeCalculator;
use crate::input_selection::{try_get_input_set, InputSelector};
use crate::outputs::{check_tx_supplement_semantics, finalize_output_proposal_set, make_outputs,
    ProposalShape, TxSupplement};
use crate::proofs::{CompositionProof, CompositionProofSystem, MembershipProof, RangeProof,
    RangeProofSystem};
use crate::proposal::{OutputProposal, PaymentProposal, SelfSendPaymentProposal};

/// Name bound into every proposal prefix.
pub const CRYPTO_PROJECT_NAME: &str = "seraphis";

const DOMAIN_TX_PROPOSAL_MESSAGE: &str = "seraphis_tx_proposal_message_v1";

/// Fixed output side of a transaction.
#[derive(Debug, Clone)]
pub struct TxProposal {
    pub outputs: Vec<Enote>,
    pub tx_supplement: TxSupplement,
    pub output_amounts: Vec<u64>,
    pub output_amount_blinding_factors: Vec<Scalar>,
}

impl TxProposal {
    /// Check, sort, and freeze an output proposal set.
    pub fn new(output_proposals: Vec<OutputProposal>) -> Result<TxProposal, TxError> {
        let (outputs, tx_supplement, output_amounts, output_amount_blinding_factors) =
            make_outputs(output_proposals)?;
        check_tx_supplement_semantics(&tx_supplement, outputs.len())?;

        Ok(TxProposal {
            outputs,
            tx_supplement,
            output_amounts,
            output_amount_blinding_factors,
        })
    }

    /// Message signed by every input's composition proof and bound into
    /// the balance proof: sensitive to every output byte, ephemeral
    /// pubkey, and tx-extra byte.
    pub fn proposal_prefix(&self, version_string: &str) -> [u8; 32] {
        let mut data = Vec::new();
        for output in &self.outputs {
            output.append_to_bytes(&mut data);
        }
        for ephemeral_pubkey in &self.tx_supplement.output_enote_ephemeral_pubkeys {
            data.extend_from_slice(ephemeral_pubkey.as_bytes());
        }
        data.extend_from_slice(&self.tx_supplement.tx_extra);

        hash32(
            DOMAIN_TX_PROPOSAL_MESSAGE,
            &[
                CRYPTO_PROJECT_NAME.as_bytes(),
                version_string.as_bytes(),
                &data,
            ],
        )
    }
}

/// One enote to spend, with fresh image masks.
#[derive(Debug, Clone)]
pub struct InputProposal {
    pub record: EnoteRecord,
    /// `t_k`.
    pub address_mask: Scalar,
    /// `t_c`.
    pub commitment_mask: Scalar,
}

impl InputProposal {
    pub fn new<R: RngCore + CryptoRng>(record: EnoteRecord, rng: &mut R) -> InputProposal {
        InputProposal {
            record,
            address_mask: random_scalar(rng),
            commitment_mask: random_scalar(rng),
        }
    }

    /// Build this input's enote image in the squashed-enote model.
    pub fn enote_image(&self) -> Result<EnoteImage, TxError> {
        let onetime_address = CompressedEdwardsY(self.record.enote.onetime_address)
            .decompress()
            .ok_or(CryptoError::InvalidPoint)?;
        let amount_commitment = CompressedEdwardsY(self.record.enote.amount_commitment)
            .decompress()
            .ok_or(CryptoError::InvalidPoint)?;
        let key_image = CompressedEdwardsY(self.record.key_image)
            .decompress()
            .ok_or(CryptoError::InvalidPoint)?;

        Ok(sp_core::make_enote_image(
            &onetime_address,
            &amount_commitment,
            &self.address_mask,
            &self.commitment_mask,
            &key_image,
        ))
    }
}

/// A fully proven input, missing only its membership proof.
#[derive(Debug, Clone)]
pub struct PartialInput {
    pub enote_image: EnoteImage,
    pub image_proof: CompositionProof,
    pub address_mask: Scalar,
    pub commitment_mask: Scalar,
    pub proposal_prefix: [u8; 32],
    /// The spent enote itself, for membership-proof preparation.
    pub input_enote: Enote,
    pub input_amount: u64,
    pub input_amount_blinding_factor: Scalar,
}

/// Prove spend authority for one input against a proposal prefix.
///
/// The masked address opens as `t_k G + H_sq(Ko,C) (k_a X + k_m U)`, so the
/// composition proof receives `(t_k, H_sq k_a, H_sq k_m)`.
pub fn make_partial_input(
    input_proposal: &InputProposal,
    proposal_prefix: &[u8; 32],
    keys: &JamtisKeys,
    composition_prover: &dyn CompositionProofSystem,
) -> Result<PartialInput, TxError> {
    let enote_image = input_proposal.enote_image()?;

    let squash_prefix = sp_core::make_squash_prefix(
        &input_proposal.record.enote.onetime_address,
        &input_proposal.record.enote.amount_commitment,
    );
    let y = squash_prefix * input_proposal.record.enote_view_privkey;
    let z = squash_prefix * keys.k_master;

    let image_proof = composition_prover.prove_composition(
        proposal_prefix,
        &enote_image.masked_address,
        &input_proposal.address_mask,
        &y,
        &z,
    )?;

    Ok(PartialInput {
        enote_image,
        image_proof,
        address_mask: input_proposal.address_mask,
        commitment_mask: input_proposal.commitment_mask,
        proposal_prefix: *proposal_prefix,
        input_enote: input_proposal.record.enote,
        input_amount: input_proposal.record.amount,
        input_amount_blinding_factor: input_proposal.record.amount_blinding_factor,
    })
}

/// Range proofs over all input-image and output commitments plus the
/// remainder blinding factor that closes the balance.
#[derive(Debug, Clone)]
pub struct BalanceProof {
    pub range_proof: RangeProof,
    pub remainder_blinding_factor: Scalar,
}

fn make_balance_proof(
    input_amounts: &[u64],
    output_amounts: &[u64],
    transaction_fee: u64,
    input_image_blinding_factors: &[Scalar],
    output_blinding_factors: &[Scalar],
    range_prover: &dyn RangeProofSystem,
) -> Result<BalanceProof, TxError> {
    let in_sum: u128 = input_amounts.iter().map(|&amount| amount as u128).sum();
    let out_sum: u128 = output_amounts.iter().map(|&amount| amount as u128).sum();
    if in_sum != out_sum + transaction_fee as u128 {
        return Err(TxError::OutputSetInvalid("amounts do not balance"));
    }

    let mut amounts = Vec::with_capacity(input_amounts.len() + output_amounts.len());
    amounts.extend_from_slice(input_amounts);
    amounts.extend_from_slice(output_amounts);

    let mut blinding_factors =
        Vec::with_capacity(input_image_blinding_factors.len() + output_blinding_factors.len());
    blinding_factors.extend_from_slice(input_image_blinding_factors);
    blinding_factors.extend_from_slice(output_blinding_factors);

    let range_proof = range_prover.prove_range(&amounts, &blinding_factors)?;

    let input_mask_sum: Scalar = input_image_blinding_factors.iter().sum();
    let output_mask_sum: Scalar = output_blinding_factors.iter().sum();

    Ok(BalanceProof {
        range_proof,
        remainder_blinding_factor: input_mask_sum - output_mask_sum,
    })
}

/// Everything but membership proofs.
#[derive(Debug, Clone)]
pub struct PartialTx {
    pub input_images: Vec<EnoteImage>,
    pub outputs: Vec<Enote>,
    pub balance_proof: BalanceProof,
    pub image_proofs: Vec<CompositionProof>,
    pub tx_supplement: TxSupplement,
    pub transaction_fee: u64,
    /// Data for the membership-proof step, aligned with `input_images`.
    pub input_enotes: Vec<Enote>,
    pub address_masks: Vec<Scalar>,
    pub commitment_masks: Vec<Scalar>,
}

/// Assemble a partial tx: sort inputs by key image, prove the balance.
pub fn make_partial_tx(
    tx_proposal: &TxProposal,
    mut partial_inputs: Vec<PartialInput>,
    transaction_fee: u64,
    version_string: &str,
    range_prover: &dyn RangeProofSystem,
) -> Result<PartialTx, TxError> {
    let proposal_prefix = tx_proposal.proposal_prefix(version_string);
    for partial_input in &partial_inputs {
        if partial_input.proposal_prefix != proposal_prefix {
            return Err(TxError::OutputSetInvalid(
                "partial input was signed for a different proposal",
            ));
        }
    }

    partial_inputs.sort_by(|a, b| a.enote_image.key_image.cmp(&b.enote_image.key_image));

    let input_amounts: Vec<u64> = partial_inputs.iter().map(|input| input.input_amount).collect();
    // the image commitment C' = t_c G + C opens with blinding t_c + x
    let input_image_blinding_factors: Vec<Scalar> = partial_inputs
        .iter()
        .map(|input| input.commitment_mask + input.input_amount_blinding_factor)
        .collect();

    let balance_proof = make_balance_proof(
        &input_amounts,
        &tx_proposal.output_amounts,
        transaction_fee,
        &input_image_blinding_factors,
        &tx_proposal.output_amount_blinding_factors,
        range_prover,
    )?;

    Ok(PartialTx {
        input_images: partial_inputs.iter().map(|input| input.enote_image).collect(),
        outputs: tx_proposal.outputs.clone(),
        balance_proof,
        image_proofs: partial_inputs.iter().map(|input| input.image_proof.clone()).collect(),
        tx_supplement: tx_proposal.tx_supplement.clone(),
        transaction_fee,
        input_enotes: partial_inputs.iter().map(|input| input.input_enote).collect(),
        address_masks: partial_inputs.iter().map(|input| input.address_mask).collect(),
        commitment_masks: partial_inputs.iter().map(|input| input.commitment_mask).collect(),
    })
}

/// A complete transaction.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub input_images: Vec<EnoteImage>,
    pub outputs: Vec<Enote>,
    pub balance_proof: BalanceProof,
    pub image_proofs: Vec<CompositionProof>,
    pub membership_proofs: Vec<MembershipProof>,
    pub tx_supplement: TxSupplement,
    pub transaction_fee: u64,
}

impl Transaction {
    /// Transaction id: digest of the on-chain fields.
    pub fn tx_id(&self) -> [u8; 32] {
        let mut data = Vec::new();
        for image in &self.input_images {
            data.extend_from_slice(&image.to_bytes());
        }
        for output in &self.outputs {
            output.append_to_bytes(&mut data);
        }
        for ephemeral_pubkey in &self.tx_supplement.output_enote_ephemeral_pubkeys {
            data.extend_from_slice(ephemeral_pubkey.as_bytes());
        }
        data.extend_from_slice(&self.tx_supplement.tx_extra);
        data.extend_from_slice(&self.transaction_fee.to_le_bytes());
        hash32("seraphis_tx_id", &[&data])
    }
}

/// Attach membership proofs to finish a partial tx.
pub fn complete_transaction(
    partial_tx: PartialTx,
    membership_proofs: Vec<MembershipProof>,
) -> Result<Transaction, TxError> {
    if membership_proofs.len() != partial_tx.input_images.len() {
        return Err(TxError::ProofFailure(
            "one membership proof is required per input".into(),
        ));
    }

    Ok(Transaction {
        input_images: partial_tx.input_images,
        outputs: partial_tx.outputs,
        balance_proof: partial_tx.balance_proof,
        image_proofs: partial_tx.image_proofs,
        membership_proofs,
        tx_supplement: partial_tx.tx_supplement,
        transaction_fee: partial_tx.transaction_fee,
    })
}

/// One-call assembly: select inputs, finalize outputs, prove everything
/// except membership. Returns the partial tx and the spent records (for
/// membership preparation and spent-tracking).
#[allow(clippy::too_many_arguments)]
pub fn make_partial_transaction<R: RngCore + CryptoRng>(
    rng: &mut R,
    keys: &JamtisKeys,
    payments: &[PaymentProposal],
    selfsend_payments: &[SelfSendPaymentProposal],
    change_destination: &Destination,
    input_selector: &dyn InputSelector,
    fee_calculator: &dyn FeeCalculator,
    fee_per_weight: u64,
    max_inputs: usize,
    composition_prover: &dyn CompositionProofSystem,
    range_prover: &dyn RangeProofSystem,
    version_string: &str,
) -> Result<(PartialTx, Vec<ContextualEnoteRecord>), TxError> {
    // output shapes and the requested amount are known before inputs
    let mut shapes = Vec::with_capacity(payments.len() + selfsend_payments.len());
    let mut output_amount: u128 = 0;
    for payment in payments {
        shapes.push(ProposalShape {
            enote_ephemeral_pubkey: enote_utils::make_enote_ephemeral_pubkey(
                &payment.enote_ephemeral_privkey,
                &payment.destination.base_pubkey,
            ),
            is_self_send: false,
        });
        output_amount += payment.amount as u128;
    }
    for payment in selfsend_payments {
        shapes.push(ProposalShape {
            enote_ephemeral_pubkey: enote_utils::make_enote_ephemeral_pubkey(
                &payment.enote_ephemeral_privkey,
                &payment.destination.base_pubkey,
            ),
            is_self_send: true,
        });
        output_amount += payment.amount as u128;
    }

    let input_set = try_get_input_set(
        &shapes,
        output_amount,
        max_inputs,
        input_selector,
        fee_per_weight,
        fee_calculator,
    )?;

    // the input context binds every output to this spend
    let key_images: Vec<_> = input_set.inputs.iter().map(|input| input.key_image()).collect();
    let input_context = enote_utils::make_input_context_standard(&key_images);

    let mut output_proposals: Vec<OutputProposal> =
        Vec::with_capacity(shapes.len() + 2);
    for payment in payments {
        output_proposals.push(payment.output_proposal(&input_context));
    }
    for payment in selfsend_payments {
        output_proposals.push(payment.output_proposal(&keys.k_view_balance, &input_context));
    }

    let total_input_amount: u128 =
        input_set.inputs.iter().map(|input| input.amount() as u128).sum();
    finalize_output_proposal_set(
        rng,
        total_input_amount,
        input_set.fee,
        change_destination,
        &keys.k_view_balance,
        &input_context,
        &mut output_proposals,
    )?;

    let tx_proposal = TxProposal::new(output_proposals)?;
    let proposal_prefix = tx_proposal.proposal_prefix(version_string);

    let mut partial_inputs = Vec::with_capacity(input_set.inputs.len());
    for contextual in &input_set.inputs {
        let input_proposal = InputProposal::new(contextual.record, rng);
        partial_inputs.push(make_partial_input(
            &input_proposal,
            &proposal_prefix,
            keys,
            composition_prover,
        )?);
    }

    let partial_tx = make_partial_tx(
        &tx_proposal,
        partial_inputs,
        input_set.fee,
        version_string,
        range_prover,
    )?;
    Ok((partial_tx, input_set.inputs))
}

/// Convenience for scanners: a change destination is just the wallet's
/// address at a fixed index.
pub fn change_destination(keys: &JamtisKeys, cipher_context: &CipherContext) -> Destination {
    seraphis_crypto::address::make_destination(
        &keys.spend_pubkey,
        &keys.unlockamounts_pubkey,
        &keys.findreceived_pubkey,
        &keys.s_generate_address,
        cipher_context,
        seraphis_crypto::address::AddressIndex::from_u128(0),
    )
}
