//! Input selection under a fee calculator.
//!
//! Iterative search: keep a working set of added inputs and a ledger of
//! inputs already seen but not worth adding (excluded). Each round either
//! proves the set sufficient at the current fee or tries, in order, to
//! (1) replace the smallest added input with a better excluded one,
//! (2) promote the best excluded input past its differential fee,
//! (3) ask the selector oracle for a fresh input,
//! (4) bulk-add a prefix of excluded inputs whose sum beats their
//! cumulative differential fee. When nothing moves, selection fails.
//!
//! The outer driver first solves for zero change, then re-solves with a
//! forced non-zero change when the leftover cannot cover the change
//! output's own fee.

use seraphis_wallet::{ContextualEnoteRecord, EnoteStore, OriginStatus, SpentStatus};

use crate::error::TxError;
use crate::fee::FeeCalculator;
use crate::outputs::{num_additional_outputs, ProposalShape};

/// Oracle handing candidate inputs to the selection loop. Implementations
/// must never return a record already present in `added` or `excluded`.
pub trait InputSelector {
    fn try_select_input(
        &self,
        target_amount: u128,
        added: &[ContextualEnoteRecord],
        excluded: &[ContextualEnoteRecord],
    ) -> Option<ContextualEnoteRecord>;
}

/// A solved input set and the fee it was solved for.
#[derive(Debug, Clone)]
pub struct InputSet {
    pub inputs: Vec<ContextualEnoteRecord>,
    pub fee: u64,
}

fn total_amount(records: &[ContextualEnoteRecord]) -> u128 {
    records.iter().map(|record| record.amount() as u128).sum()
}

fn sort_descending(records: &mut [ContextualEnoteRecord]) {
    records.sort_by(|a, b| b.amount().cmp(&a.amount()));
}

/// (1) replace the smallest added input with a larger excluded input.
fn try_update_replace_excluded(
    added: &mut Vec<ContextualEnoteRecord>,
    excluded: &mut Vec<ContextualEnoteRecord>,
) -> bool {
    sort_descending(added);
    sort_descending(excluded);

    if !added.is_empty()
        && !excluded.is_empty()
        && excluded[0].amount() > added[added.len() - 1].amount()
    {
        added.pop();
        added.push(excluded.remove(0));
        return true;
    }
    false
}

/// (2) promote the best excluded input if it beats its differential fee.
fn try_update_add_excluded(
    max_inputs: usize,
    fee_per_weight: u64,
    fee_calculator: &dyn FeeCalculator,
    num_outputs: usize,
    added: &mut Vec<ContextualEnoteRecord>,
    excluded: &mut Vec<ContextualEnoteRecord>,
) -> bool {
    if added.len() >= max_inputs {
        return false;
    }

    let current_fee = fee_calculator.fee(fee_per_weight, added.len(), num_outputs);
    let next_fee = fee_calculator.fee(fee_per_weight, added.len() + 1, num_outputs);
    debug_assert!(next_fee >= current_fee);

    sort_descending(excluded);
    if !excluded.is_empty() && excluded[0].amount() as u128 > (next_fee - current_fee) as u128 {
        added.push(excluded.remove(0));
        return true;
    }
    false
}

/// (3) ask the oracle for a new input that gets us closer to a solution.
fn try_update_selection(
    output_amount: u128,
    max_inputs: usize,
    input_selector: &dyn InputSelector,
    fee_per_weight: u64,
    fee_calculator: &dyn FeeCalculator,
    num_outputs: usize,
    added: &mut Vec<ContextualEnoteRecord>,
    excluded: &mut Vec<ContextualEnoteRecord>,
) -> bool {
    sort_descending(added);

    let current_fee = fee_calculator.fee(fee_per_weight, added.len(), num_outputs);

    // when the set is full we can only replace the smallest added input
    let (selection_amount, comparison_amount) = if added.len() < max_inputs {
        let next_fee = fee_calculator.fee(fee_per_weight, added.len() + 1, num_outputs);
        debug_assert!(next_fee >= current_fee);
        (output_amount + next_fee as u128, (next_fee - current_fee) as u128)
    } else {
        (
            output_amount + current_fee as u128,
            added[added.len() - 1].amount() as u128,
        )
    };

    while let Some(requested) = input_selector.try_select_input(selection_amount, added, excluded)
    {
        if requested.amount() as u128 > comparison_amount {
            if added.len() >= max_inputs {
                added.pop();
            }
            added.push(requested);
            return true;
        }
        excluded.push(requested);
    }
    false
}

/// (4) bulk-add a prefix of excluded inputs that beats its cumulative
/// differential fee.
fn try_update_range(
    max_inputs: usize,
    fee_per_weight: u64,
    fee_calculator: &dyn FeeCalculator,
    num_outputs: usize,
    added: &mut Vec<ContextualEnoteRecord>,
    excluded: &mut Vec<ContextualEnoteRecord>,
) -> bool {
    if added.len() >= max_inputs {
        return false;
    }

    let current_fee = fee_calculator.fee(fee_per_weight, added.len(), num_outputs);
    sort_descending(excluded);

    let mut range_sum: u128 = 0;
    for range_size in 1..=excluded.len() {
        range_sum += excluded[range_size - 1].amount() as u128;
        if added.len() + range_size > max_inputs {
            return false;
        }

        let range_fee = fee_calculator.fee(fee_per_weight, added.len() + range_size, num_outputs);
        debug_assert!(range_fee >= current_fee);
        if range_sum > (range_fee - current_fee) as u128 {
            added.extend(excluded.drain(..range_size));
            return true;
        }
    }
    false
}

/// Solve for inputs covering `output_amount` plus the fee at the solved
/// input count.
fn try_select_inputs(
    output_amount: u128,
    max_inputs: usize,
    input_selector: &dyn InputSelector,
    fee_per_weight: u64,
    fee_calculator: &dyn FeeCalculator,
    num_outputs: usize,
) -> Result<Vec<ContextualEnoteRecord>, TxError> {
    debug_assert!(max_inputs > 0);

    let mut added: Vec<ContextualEnoteRecord> = Vec::new();
    let mut excluded: Vec<ContextualEnoteRecord> = Vec::new();

    loop {
        let fee = fee_calculator.fee(fee_per_weight, added.len(), num_outputs);
        if total_amount(&added) >= output_amount + fee as u128 {
            return Ok(added);
        }

        if try_update_replace_excluded(&mut added, &mut excluded) {
            continue;
        }
        if try_update_add_excluded(
            max_inputs,
            fee_per_weight,
            fee_calculator,
            num_outputs,
            &mut added,
            &mut excluded,
        ) {
            continue;
        }
        if try_update_selection(
            output_amount,
            max_inputs,
            input_selector,
            fee_per_weight,
            fee_calculator,
            num_outputs,
            &mut added,
            &mut excluded,
        ) {
            continue;
        }
        if try_update_range(
            max_inputs,
            fee_per_weight,
            fee_calculator,
            num_outputs,
            &mut added,
            &mut excluded,
        ) {
            continue;
        }

        return Err(TxError::InputSelectionFailed);
    }
}

/// Select an input set for an output proposal set.
///
/// First pass assumes zero change; if the leftover is non-zero the fee is
/// recomputed with a change output, re-selecting with a `+1` target when
/// the original inputs cannot also cover the change output's fee.
pub fn try_get_input_set(
    shapes: &[ProposalShape],
    output_amount: u128,
    max_inputs: usize,
    input_selector: &dyn InputSelector,
    fee_per_weight: u64,
    fee_calculator: &dyn FeeCalculator,
) -> Result<InputSet, TxError> {
    let num_outputs_nochange = shapes.len() + num_additional_outputs(shapes, false)?;

    let inputs = try_select_inputs(
        output_amount,
        max_inputs,
        input_selector,
        fee_per_weight,
        fee_calculator,
        num_outputs_nochange,
    )?;
    let zero_change_fee = fee_calculator.fee(fee_per_weight, inputs.len(), num_outputs_nochange);

    // exact hit: no change output needed (rare)
    if total_amount(&inputs) == output_amount + zero_change_fee as u128 {
        return Ok(InputSet {
            inputs,
            fee: zero_change_fee,
        });
    }

    // typical case: leftover exists, so plan for a change output
    let num_outputs_withchange = shapes.len() + num_additional_outputs(shapes, true)?;
    let mut nonzero_change_fee =
        fee_calculator.fee(fee_per_weight, inputs.len(), num_outputs_withchange);
    debug_assert!(zero_change_fee <= nonzero_change_fee);

    if total_amount(&inputs) > output_amount + nonzero_change_fee as u128 {
        return Ok(InputSet {
            inputs,
            fee: nonzero_change_fee,
        });
    }

    // the leftover cannot cover the change output's own fee: force a
    // non-zero change with a +1 target (rare)
    let inputs = try_select_inputs(
        output_amount + 1,
        max_inputs,
        input_selector,
        fee_per_weight,
        fee_calculator,
        num_outputs_withchange,
    )?;
    nonzero_change_fee = fee_calculator.fee(fee_per_weight, inputs.len(), num_outputs_withchange);

    Ok(InputSet {
        inputs,
        fee: nonzero_change_fee,
    })
}

/// Largest-first selector over an enote store's confirmed spendable
/// records.
pub struct StoreInputSelector<'a> {
    store: &'a EnoteStore,
}

impl<'a> StoreInputSelector<'a> {
    pub fn new(store: &'a EnoteStore) -> StoreInputSelector<'a> {
        StoreInputSelector { store }
    }
}

impl InputSelector for StoreInputSelector<'_> {
    fn try_select_input(
        &self,
        _target_amount: u128,
        added: &[ContextualEnoteRecord],
        excluded: &[ContextualEnoteRecord],
    ) -> Option<ContextualEnoteRecord> {
        self.store
            .records()
            .filter(|record| {
                record.origin.status == OriginStatus::Onchain
                    && record.spent.status == SpentStatus::Unspent
            })
            .filter(|record| {
                !added
                    .iter()
                    .chain(excluded.iter())
                    .any(|seen| seen.key_image() == record.key_image())
            })
            .max_by_key(|record| (record.amount(), record.key_image()))
            .copied()
    }
}
