//! Fee calculators.
//!
//! A fee calculator answers one question for input selection: what does a
//! transaction with `(num_inputs, num_outputs)` cost at a given
//! fee-per-weight? [`WeightFeeCalculator`] models the squashed-enote
//! transaction layout; [`FlatFeeCalculator`] is a trivial linear model for
//! tests and simulations.

use seraphis_crypto::enote::{ENOTE_BYTES, ENOTE_IMAGE_BYTES};

/// Capability interface consumed by input selection.
pub trait FeeCalculator {
    fn fee(&self, fee_per_weight: u64, num_inputs: usize, num_outputs: usize) -> u64;
}

/// Weight model for squashed-enote transactions.
///
/// Membership proofs are sized from the reference-set decomposition n^m and
/// the bin count; the shared range proof grows logarithmically with the
/// aggregation size.
#[derive(Debug, Clone, Copy)]
pub struct WeightFeeCalculator {
    pub ref_set_decomp_n: usize,
    pub ref_set_decomp_m: usize,
    pub num_bin_members: usize,
    pub tx_extra_size: usize,
}

impl WeightFeeCalculator {
    pub fn weight(&self, num_inputs: usize, num_outputs: usize) -> u64 {
        // prefix: version + fee varint + input/output counts
        let mut weight = 12usize;

        // per input: enote image + composition proof (3 scalars + 1 key)
        // + membership proof (m*(n+1) keys plus bin loci)
        let membership_proof_size =
            32 * self.ref_set_decomp_m * (self.ref_set_decomp_n + 1) + 8 * self.num_bin_members;
        weight += num_inputs * (ENOTE_IMAGE_BYTES + 32 * 4 + membership_proof_size);

        // per output: enote + its ephemeral pubkey in the supplement
        weight += num_outputs * (ENOTE_BYTES + 32);

        // shared range proof: 6 + 2*ceil(log2(64 * num_outputs)) keys
        let aggregation = (64 * num_outputs.max(1)).next_power_of_two();
        weight += 32 * (6 + 2 * aggregation.trailing_zeros() as usize);

        weight += self.tx_extra_size;

        weight as u64
    }
}

impl FeeCalculator for WeightFeeCalculator {
    fn fee(&self, fee_per_weight: u64, num_inputs: usize, num_outputs: usize) -> u64 {
        fee_per_weight.saturating_mul(self.weight(num_inputs, num_outputs))
    }
}

/// Linear weight model: `base + in*per_input + out*per_output`.
#[derive(Debug, Clone, Copy)]
pub struct FlatFeeCalculator {
    pub base_weight: u64,
    pub weight_per_input: u64,
    pub weight_per_output: u64,
}

impl FlatFeeCalculator {
    /// Weight 1 regardless of shape (fee == fee_per_weight).
    pub fn trivial() -> FlatFeeCalculator {
        FlatFeeCalculator {
            base_weight: 1,
            weight_per_input: 0,
            weight_per_output: 0,
        }
    }
}

impl FeeCalculator for FlatFeeCalculator {
    fn fee(&self, fee_per_weight: u64, num_inputs: usize, num_outputs: usize) -> u64 {
        let weight = self.base_weight
            + self.weight_per_input * num_inputs as u64
            + self.weight_per_output * num_outputs as u64;
        fee_per_weight.saturating_mul(weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_grows_with_shape() {
        let calc = WeightFeeCalculator {
            ref_set_decomp_n: 2,
            ref_set_decomp_m: 7,
            num_bin_members: 8,
            tx_extra_size: 0,
        };
        assert!(calc.fee(1, 2, 2) > calc.fee(1, 1, 2));
        assert!(calc.fee(1, 1, 3) > calc.fee(1, 1, 2));
        assert_eq!(calc.fee(2, 1, 2), 2 * calc.fee(1, 1, 2));
    }

    #[test]
    fn trivial_fee_is_flat() {
        let calc = FlatFeeCalculator::trivial();
        assert_eq!(calc.fee(5, 0, 2), 5);
        assert_eq!(calc.fee(5, 16, 16), 5);
    }
}
