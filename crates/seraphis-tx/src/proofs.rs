//! Capability traits for the external proof systems.
//!
//! Composition (spend authority), Bulletproofs+ (ranges) and Grootle
//! (membership) are consumed as black boxes; this core defines only the
//! openings they receive and the messages they bind to. [`MockProofs`]
//! gives tests a transparent stand-in that still checks the openings it
//! is handed.

use curve25519_dalek::edwards::CompressedEdwardsY;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::VartimeMultiscalarMul;

use seraphis_crypto::generators::{g_gen, u_gen, x_gen};
use seraphis_crypto::hash::keccak256;
use seraphis_crypto::{enote_utils, KeyImage};

use crate::error::TxError;
use crate::membership::MembershipReferenceSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionProof {
    pub proof_bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeProof {
    pub proof_bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipProof {
    pub proof_bytes: Vec<u8>,
}

/// Seraphis composition proof: demonstrates knowledge of `(x, y, z)` with
/// `K' = x G + y X + z U` and binds `KI = (z/y) U` to the proof message.
pub trait CompositionProofSystem {
    fn prove_composition(
        &self,
        message: &[u8; 32],
        masked_address: &[u8; 32],
        x: &Scalar,
        y: &Scalar,
        z: &Scalar,
    ) -> Result<CompositionProof, TxError>;

    fn verify_composition(
        &self,
        proof: &CompositionProof,
        message: &[u8; 32],
        masked_address: &[u8; 32],
        key_image: &KeyImage,
    ) -> Result<(), TxError>;
}

/// Aggregate range proof over amount commitments.
pub trait RangeProofSystem {
    fn prove_range(
        &self,
        amounts: &[u64],
        blinding_factors: &[Scalar],
    ) -> Result<RangeProof, TxError>;

    fn verify_range(&self, proof: &RangeProof, commitments: &[[u8; 32]]) -> Result<(), TxError>;
}

/// Grootle membership proof over a squashed-enote reference set.
pub trait MembershipProofSystem {
    fn prove_membership(
        &self,
        reference_set: &MembershipReferenceSet,
        masked_address: &[u8; 32],
        masked_commitment: &[u8; 32],
        address_mask: &Scalar,
        commitment_mask: &Scalar,
    ) -> Result<MembershipProof, TxError>;
}

/// Transparent proof systems for tests: proofs are digests over public
/// inputs, and proving checks the openings it receives.
pub struct MockProofs;

fn composition_digest(message: &[u8; 32], masked_address: &[u8; 32]) -> Vec<u8> {
    keccak256(&[b"mock_composition_proof", message, masked_address]).to_vec()
}

impl CompositionProofSystem for MockProofs {
    fn prove_composition(
        &self,
        message: &[u8; 32],
        masked_address: &[u8; 32],
        x: &Scalar,
        y: &Scalar,
        z: &Scalar,
    ) -> Result<CompositionProof, TxError> {
        let opening = curve25519_dalek::edwards::EdwardsPoint::vartime_multiscalar_mul(
            &[*x, *y, *z],
            &[g_gen(), x_gen(), u_gen()],
        );
        if opening.compress().as_bytes() != masked_address {
            return Err(TxError::ProofFailure(
                "composition opening does not match the masked address".into(),
            ));
        }
        if *y == Scalar::ZERO {
            return Err(TxError::ProofFailure("zero y in composition opening".into()));
        }

        Ok(CompositionProof {
            proof_bytes: composition_digest(message, masked_address),
        })
    }

    fn verify_composition(
        &self,
        proof: &CompositionProof,
        message: &[u8; 32],
        masked_address: &[u8; 32],
        _key_image: &KeyImage,
    ) -> Result<(), TxError> {
        if proof.proof_bytes != composition_digest(message, masked_address) {
            return Err(TxError::ProofFailure("bad composition proof".into()));
        }
        Ok(())
    }
}

impl RangeProofSystem for MockProofs {
    fn prove_range(
        &self,
        amounts: &[u64],
        blinding_factors: &[Scalar],
    ) -> Result<RangeProof, TxError> {
        if amounts.len() != blinding_factors.len() {
            return Err(TxError::ProofFailure("range proof input mismatch".into()));
        }

        let mut digest_input = Vec::with_capacity(amounts.len() * 32);
        for (amount, blinding_factor) in amounts.iter().zip(blinding_factors.iter()) {
            let commitment = enote_utils::make_amount_commitment(*amount, blinding_factor);
            digest_input.extend_from_slice(commitment.compress().as_bytes());
        }

        Ok(RangeProof {
            proof_bytes: keccak256(&[b"mock_range_proof", &digest_input]).to_vec(),
        })
    }

    fn verify_range(&self, proof: &RangeProof, commitments: &[[u8; 32]]) -> Result<(), TxError> {
        let mut digest_input = Vec::with_capacity(commitments.len() * 32);
        for commitment in commitments {
            digest_input.extend_from_slice(commitment);
        }
        if proof.proof_bytes != keccak256(&[b"mock_range_proof", &digest_input]).to_vec() {
            return Err(TxError::ProofFailure("bad range proof".into()));
        }
        Ok(())
    }
}

impl MembershipProofSystem for MockProofs {
    fn prove_membership(
        &self,
        reference_set: &MembershipReferenceSet,
        masked_address: &[u8; 32],
        masked_commitment: &[u8; 32],
        _address_mask: &Scalar,
        _commitment_mask: &Scalar,
    ) -> Result<MembershipProof, TxError> {
        let real = reference_set
            .referenced_enotes
            .get(reference_set.real_spend_index_in_set)
            .ok_or_else(|| TxError::ProofFailure("reference set is malformed".into()))?;
        CompressedEdwardsY(real.0)
            .decompress()
            .ok_or_else(|| TxError::ProofFailure("referenced enote is invalid".into()))?;

        let mut digest_input = Vec::new();
        for index in &reference_set.ledger_enote_indices {
            digest_input.extend_from_slice(&index.to_le_bytes());
        }
        digest_input.extend_from_slice(masked_address);
        digest_input.extend_from_slice(masked_commitment);

        Ok(MembershipProof {
            proof_bytes: keccak256(&[b"mock_membership_proof", &digest_input]).to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_round_trip() {
        let x = Scalar::from(3u64);
        let y = Scalar::from(5u64);
        let z = Scalar::from(7u64);
        let opening = curve25519_dalek::edwards::EdwardsPoint::vartime_multiscalar_mul(
            &[x, y, z],
            &[g_gen(), x_gen(), u_gen()],
        )
        .compress()
        .to_bytes();

        let message = [9u8; 32];
        let proof = MockProofs.prove_composition(&message, &opening, &x, &y, &z).unwrap();
        MockProofs.verify_composition(&proof, &message, &opening, &[0u8; 32]).unwrap();

        // message binding
        assert!(MockProofs
            .verify_composition(&proof, &[8u8; 32], &opening, &[0u8; 32])
            .is_err());
    }

    #[test]
    fn composition_rejects_wrong_opening() {
        let message = [1u8; 32];
        let wrong = (Scalar::from(2u64) * g_gen()).compress().to_bytes();
        assert!(MockProofs
            .prove_composition(&message, &wrong, &Scalar::ONE, &Scalar::ONE, &Scalar::ONE)
            .is_err());
    }
}
