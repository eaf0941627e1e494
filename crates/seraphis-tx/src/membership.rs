//! Membership-proof reference sets.
//!
//! A reference set names `n^m` ledger positions (the real spend plus
//! decoys) whose squashed enotes a Grootle proof will range over. Only the
//! positions and copies of the referenced enote cores are prepared here;
//! the proof itself is an external system.

use rand::{CryptoRng, Rng, RngCore};

use crate::error::TxError;

/// Prepared reference set for one input.
#[derive(Debug, Clone)]
pub struct MembershipReferenceSet {
    /// Reference-set size decomposition: size = n^m.
    pub ref_set_decomp_n: usize,
    pub ref_set_decomp_m: usize,
    /// Ledger positions of the referenced enotes, sorted ascending.
    pub ledger_enote_indices: Vec<u64>,
    /// `(Ko, C)` of each referenced enote, aligned with the indices.
    pub referenced_enotes: Vec<([u8; 32], [u8; 32])>,
    /// Position of the real spend within the set.
    pub real_spend_index_in_set: usize,
}

/// Uniformly sample decoys around a real spend.
///
/// `fetch_enote` maps a ledger position to its enote core `(Ko, C)`.
pub fn prepare_membership_reference_set<R, F>(
    rng: &mut R,
    ref_set_decomp_n: usize,
    ref_set_decomp_m: usize,
    real_ledger_index: u64,
    ledger_size: u64,
    fetch_enote: F,
) -> Result<MembershipReferenceSet, TxError>
where
    R: RngCore + CryptoRng,
    F: Fn(u64) -> ([u8; 32], [u8; 32]),
{
    let ref_set_size = ref_set_decomp_n
        .checked_pow(ref_set_decomp_m as u32)
        .ok_or(TxError::AmountOverflow("reference set size"))?;
    if ref_set_size == 0 || real_ledger_index >= ledger_size {
        return Err(TxError::ProofFailure("bad reference set parameters".into()));
    }
    if (ledger_size as u128) < ref_set_size as u128 {
        return Err(TxError::ProofFailure(
            "ledger has fewer enotes than the reference set size".into(),
        ));
    }

    let mut indices = vec![real_ledger_index];
    while indices.len() < ref_set_size {
        let candidate = rng.gen_range(0..ledger_size);
        if !indices.contains(&candidate) {
            indices.push(candidate);
        }
    }
    indices.sort_unstable();

    let real_spend_index_in_set = indices
        .iter()
        .position(|&index| index == real_ledger_index)
        .expect("real index was inserted");
    let referenced_enotes = indices.iter().map(|&index| fetch_enote(index)).collect();

    Ok(MembershipReferenceSet {
        ref_set_decomp_n,
        ref_set_decomp_m,
        ledger_enote_indices: indices,
        referenced_enotes,
        real_spend_index_in_set,
    })
}
