//! Multisig intermediate types.
//!
//! A multisig quorum passes three artifacts around: the shared tx
//! proposal, per-signer nonce initializers for each input's composition
//! proof, and partial signatures. Only the types and their binding checks
//! live here; the signing ceremony itself is out of scope.

use curve25519_dalek::scalar::Scalar;

use seraphis_crypto::{Enote, KeyImage};

use crate::error::TxError;
use crate::extra::ExtraFieldElement;
use crate::proposal::{OutputProposal, PaymentProposal};

/// Bitfield naming the signers expected to participate.
pub type SignerSetFilter = u64;

/// Whether `signer_index` is named by a filter.
pub fn filter_contains(filter: SignerSetFilter, signer_index: u32) -> bool {
    signer_index < 64 && filter & (1u64 << signer_index) != 0
}

/// Number of signers a filter names.
pub fn filter_size(filter: SignerSetFilter) -> u32 {
    filter.count_ones()
}

/// One input a quorum intends to spend.
#[derive(Debug, Clone)]
pub struct MultisigInputProposal {
    pub enote: Enote,
    pub key_image: KeyImage,
    /// `t_k`.
    pub address_mask: Scalar,
    /// `t_c`.
    pub commitment_mask: Scalar,
}

/// The shared proposal every signer must agree on.
#[derive(Debug, Clone)]
pub struct MultisigTxProposal {
    /// Payments with known addresses.
    pub explicit_payments: Vec<PaymentProposal>,
    /// Opaque outputs (self-sends, dummies) already converted.
    pub opaque_payments: Vec<OutputProposal>,
    pub partial_memo: Vec<ExtraFieldElement>,
    pub input_proposals: Vec<MultisigInputProposal>,
    /// All signers who should participate; supersets of the threshold are
    /// resolved per-permutation by the ceremony.
    pub aggregate_signer_set_filter: SignerSetFilter,
}

/// Per-signer nonce commitments for one input's composition proof.
#[derive(Debug, Clone)]
pub struct MultisigInputInit {
    pub proposal_prefix: [u8; 32],
    pub key_image: KeyImage,
    pub aggregate_signer_set_filter: SignerSetFilter,
    /// `alpha_{ki,1,e} U` per signer subset.
    pub signature_nonce_pubkeys_1: Vec<[u8; 32]>,
    /// `alpha_{ki,2,e} U` per signer subset.
    pub signature_nonce_pubkeys_2: Vec<[u8; 32]>,
}

/// One signer's partial composition signature for one input.
#[derive(Debug, Clone)]
pub struct MultisigInputPartialSig {
    pub proposal_prefix: [u8; 32],
    pub key_image: KeyImage,
    pub signer_set_filter: SignerSetFilter,
    pub partial_signature: Vec<u8>,
}

/// An initializer must carry aligned, non-empty nonce vectors.
pub fn check_input_init_semantics(init: &MultisigInputInit) -> Result<(), TxError> {
    if init.signature_nonce_pubkeys_1.is_empty()
        || init.signature_nonce_pubkeys_1.len() != init.signature_nonce_pubkeys_2.len()
    {
        return Err(TxError::ProofFailure(
            "multisig input init has misaligned nonce sets".into(),
        ));
    }
    if filter_size(init.aggregate_signer_set_filter) == 0 {
        return Err(TxError::ProofFailure(
            "multisig input init names no signers".into(),
        ));
    }
    Ok(())
}

/// A partial signature must bind to the same proposal and input as its
/// initializer, with a signer subset drawn from the aggregate filter.
pub fn check_partial_sig_semantics(
    partial_sig: &MultisigInputPartialSig,
    init: &MultisigInputInit,
) -> Result<(), TxError> {
    if partial_sig.proposal_prefix != init.proposal_prefix
        || partial_sig.key_image != init.key_image
    {
        return Err(TxError::ProofFailure(
            "multisig partial signature binds to a different proposal or input".into(),
        ));
    }
    if partial_sig.signer_set_filter & !init.aggregate_signer_set_filter != 0 {
        return Err(TxError::ProofFailure(
            "multisig partial signature names signers outside the aggregate filter".into(),
        ));
    }
    Ok(())
}
