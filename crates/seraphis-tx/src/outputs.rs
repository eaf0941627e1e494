//! Output-set finalization and tx-supplement assembly.
//!
//! Ephemeral-pubkey policy: a 2-output tx has exactly one `K_e` shared by
//! both outputs; a tx with three or more outputs has one unique `K_e` per
//! output. Finalization appends the dummy/change outputs needed to land in
//! one of those shapes, or rejects sets that cannot reach one.

use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, RngCore};

use seraphis_crypto::keys::make_findreceived_key;
use seraphis_crypto::{x25519, Destination, Enote, SelfSendType};

use crate::error::TxError;
use crate::extra::{make_tx_extra, ExtraFieldElement, TxExtra};
use crate::proposal::{OutputProposal, SelfSendPaymentProposal};

/// Supplemental transaction data: ephemeral pubkeys and the tx-extra field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxSupplement {
    pub output_enote_ephemeral_pubkeys: Vec<MontgomeryPoint>,
    pub tx_extra: TxExtra,
}

impl TxSupplement {
    /// Wire form: varint count, the 32-byte pubkeys, then the TLV extra.
    pub fn append_to_bytes(&self, out: &mut Vec<u8>) {
        seraphis_types::varint::write_varint(
            out,
            self.output_enote_ephemeral_pubkeys.len() as u64,
        );
        for ephemeral_pubkey in &self.output_enote_ephemeral_pubkeys {
            out.extend_from_slice(ephemeral_pubkey.as_bytes());
        }
        out.extend_from_slice(&self.tx_extra);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.append_to_bytes(&mut out);
        out
    }

    /// Parse a wire supplement; the tx-extra tail is validated as TLV.
    pub fn from_slice(bytes: &[u8]) -> Result<TxSupplement, TxError> {
        let mut position = 0;
        let count = seraphis_types::varint::read_varint(bytes, &mut position)
            .map_err(|_| TxError::MalformedWireData)?;
        let count = usize::try_from(count).map_err(|_| TxError::MalformedWireData)?;

        let pubkeys_end = position
            .checked_add(count.checked_mul(32).ok_or(TxError::MalformedWireData)?)
            .ok_or(TxError::MalformedWireData)?;
        if pubkeys_end > bytes.len() {
            return Err(TxError::MalformedWireData);
        }

        let mut output_enote_ephemeral_pubkeys = Vec::with_capacity(count);
        for chunk in bytes[position..pubkeys_end].chunks_exact(32) {
            let mut pubkey = [0u8; 32];
            pubkey.copy_from_slice(chunk);
            output_enote_ephemeral_pubkeys.push(MontgomeryPoint(pubkey));
        }

        let tx_extra = bytes[pubkeys_end..].to_vec();
        crate::extra::try_get_extra_field_elements(&tx_extra)?;

        Ok(TxSupplement {
            output_enote_ephemeral_pubkeys,
            tx_extra,
        })
    }
}

/// A supplement must carry one ephemeral pubkey for a 2-out tx and one
/// unique pubkey per output otherwise.
pub fn check_tx_supplement_semantics(
    supplement: &TxSupplement,
    num_outputs: usize,
) -> Result<(), TxError> {
    let num_pubkeys = supplement.output_enote_ephemeral_pubkeys.len();
    if num_outputs == 2 {
        if num_pubkeys != 1 {
            return Err(TxError::OutputSetInvalid(
                "a 2-out tx carries exactly one ephemeral pubkey",
            ));
        }
    } else {
        if num_pubkeys != num_outputs {
            return Err(TxError::OutputSetInvalid(
                "a tx carries one ephemeral pubkey per output",
            ));
        }
        for (i, pubkey) in supplement.output_enote_ephemeral_pubkeys.iter().enumerate() {
            for other in &supplement.output_enote_ephemeral_pubkeys[i + 1..] {
                if pubkey == other {
                    return Err(TxError::OutputSetInvalid(
                        "duplicate ephemeral pubkey in the tx supplement",
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Ephemeral-pubkey shape of one proposal, known before input selection.
#[derive(Debug, Clone, Copy)]
pub struct ProposalShape {
    pub enote_ephemeral_pubkey: MontgomeryPoint,
    pub is_self_send: bool,
}

impl From<&OutputProposal> for ProposalShape {
    fn from(proposal: &OutputProposal) -> ProposalShape {
        ProposalShape {
            enote_ephemeral_pubkey: proposal.enote_ephemeral_pubkey,
            is_self_send: proposal.self_send_type.is_some(),
        }
    }
}

fn all_ephemeral_pubkeys_unique(shapes: &[ProposalShape]) -> bool {
    for (i, shape) in shapes.iter().enumerate() {
        for other in &shapes[i + 1..] {
            if shape.enote_ephemeral_pubkey == other.enote_ephemeral_pubkey {
                return false;
            }
        }
    }
    true
}

/// How many outputs finalization will append for this proposal set and
/// change disposition. Mirrors [`finalize_output_proposal_set`] exactly.
pub fn num_additional_outputs(
    shapes: &[ProposalShape],
    nonzero_change: bool,
) -> Result<usize, TxError> {
    match shapes.len() {
        0 => Err(TxError::OutputSetInvalid(
            "no outputs were specified; pay yourself with a self-spend instead of change",
        )),
        1 => {
            if !nonzero_change {
                Ok(1) // special dummy
            } else if !shapes[0].is_self_send {
                Ok(1) // special change
            } else {
                Ok(2) // dummy + normal change
            }
        }
        2 if shapes[0].enote_ephemeral_pubkey != shapes[1].enote_ephemeral_pubkey => Ok(1),
        2 => {
            // shared ephemeral pubkey: the set must already be final
            if nonzero_change {
                Err(TxError::OutputSetInvalid(
                    "2 outputs share an ephemeral pubkey, so a change output cannot be added",
                ))
            } else if shapes[0].is_self_send && shapes[1].is_self_send {
                Err(TxError::OutputSetInvalid(
                    "2 self-send outputs may not share an ephemeral pubkey",
                ))
            } else {
                Ok(0)
            }
        }
        _ => {
            if !all_ephemeral_pubkeys_unique(shapes) {
                return Err(TxError::OutputSetInvalid(
                    ">2 outputs but their ephemeral pubkeys are not all unique",
                ));
            }
            Ok(usize::from(nonzero_change))
        }
    }
}

fn make_normal_change_proposal<R: RngCore + CryptoRng>(
    rng: &mut R,
    change_destination: &Destination,
    amount: u64,
    k_view_balance: &Scalar,
    input_context: &[u8; 32],
) -> OutputProposal {
    SelfSendPaymentProposal::new(*change_destination, amount, SelfSendType::Change, rng)
        .output_proposal(k_view_balance, input_context)
}

/// Finalize an output proposal set: compute the change amount and append
/// the dummy/change outputs dictated by the ephemeral-pubkey policy.
pub fn finalize_output_proposal_set<R: RngCore + CryptoRng>(
    rng: &mut R,
    total_input_amount: u128,
    transaction_fee: u64,
    change_destination: &Destination,
    k_view_balance: &Scalar,
    input_context: &[u8; 32],
    output_proposals: &mut Vec<OutputProposal>,
) -> Result<(), TxError> {
    let mut output_sum = transaction_fee as u128;
    for proposal in output_proposals.iter() {
        output_sum += proposal.amount as u128;
    }

    if total_input_amount < output_sum {
        return Err(TxError::OutputSetInvalid("input amount is too small"));
    }
    let change_amount = total_input_amount - output_sum;
    let change_amount =
        u64::try_from(change_amount).map_err(|_| TxError::AmountOverflow("change amount"))?;

    // fail early on the shapes finalization cannot fix
    let shapes: Vec<ProposalShape> = output_proposals.iter().map(ProposalShape::from).collect();
    num_additional_outputs(&shapes, change_amount > 0)?;

    if output_proposals.len() == 1 {
        if change_amount == 0 {
            // special dummy: share the sole output's ephemeral pubkey so
            // the tx keeps the 2-out topology
            let mut dummy = OutputProposal::gen(rng, 0);
            dummy.enote_ephemeral_pubkey = output_proposals[0].enote_ephemeral_pubkey;
            output_proposals.push(dummy);
        } else if output_proposals[0].self_send_type.is_none() {
            // special change: a self-send sharing the normal output's
            // ephemeral pubkey (xK_2 = xk_fr * K_e_other, xK_3 = K_e_other,
            // r = 1)
            let findreceived_key = make_findreceived_key(k_view_balance);
            let shared_ephemeral = output_proposals[0].enote_ephemeral_pubkey;

            let mut special_destination = *change_destination;
            special_destination.view_pubkey =
                x25519::scmul_key(&findreceived_key, &shared_ephemeral);
            special_destination.base_pubkey = shared_ephemeral;

            let special_change = SelfSendPaymentProposal {
                destination: special_destination,
                amount: change_amount,
                self_send_type: SelfSendType::Change,
                enote_ephemeral_privkey: Scalar::ONE,
                partial_memo: Vec::new(),
            };
            output_proposals.push(special_change.output_proposal(k_view_balance, input_context));
        } else {
            // a 2-out tx may not hold 2 self-sends of one wallet: pad to
            // 3-out with a dummy plus a normal change
            output_proposals.push(OutputProposal::gen(rng, 0));
            output_proposals.push(make_normal_change_proposal(
                rng,
                change_destination,
                change_amount,
                k_view_balance,
                input_context,
            ));
        }
    } else if change_amount > 0 {
        output_proposals.push(make_normal_change_proposal(
            rng,
            change_destination,
            change_amount,
            k_view_balance,
            input_context,
        ));
    } else if output_proposals.len() == 2
        && output_proposals[0].enote_ephemeral_pubkey != output_proposals[1].enote_ephemeral_pubkey
    {
        // 2-out needs a shared ephemeral pubkey; pad to 3-out instead
        output_proposals.push(OutputProposal::gen(rng, 0));
    }
    // remaining cases are already final

    Ok(())
}

/// Validate a finalized set: ordering-independent semantics only.
pub fn check_output_proposal_set(output_proposals: &[OutputProposal]) -> Result<(), TxError> {
    if output_proposals.len() < 2 {
        return Err(TxError::OutputSetInvalid("a tx needs at least 2 outputs"));
    }

    let shapes: Vec<ProposalShape> = output_proposals.iter().map(ProposalShape::from).collect();
    if output_proposals.len() == 2 {
        if shapes[0].enote_ephemeral_pubkey != shapes[1].enote_ephemeral_pubkey {
            return Err(TxError::OutputSetInvalid(
                "a 2-out tx must share one ephemeral pubkey",
            ));
        }
        if shapes[0].is_self_send && shapes[1].is_self_send {
            return Err(TxError::OutputSetInvalid(
                "2 self-send outputs may not share an ephemeral pubkey",
            ));
        }
    } else if !all_ephemeral_pubkeys_unique(&shapes) {
        return Err(TxError::OutputSetInvalid(
            ">2 outputs but their ephemeral pubkeys are not all unique",
        ));
    }

    // one-time addresses must be unique
    for (i, proposal) in output_proposals.iter().enumerate() {
        for other in &output_proposals[i + 1..] {
            if proposal.onetime_address == other.onetime_address {
                return Err(TxError::OutputSetInvalid("duplicate one-time address"));
            }
        }
    }

    Ok(())
}

/// Sort proposals by one-time address and build the output enotes plus the
/// tx supplement (collapsing a shared 2-out ephemeral pubkey to one entry).
pub fn make_outputs(
    mut output_proposals: Vec<OutputProposal>,
) -> Result<(Vec<Enote>, TxSupplement, Vec<u64>, Vec<Scalar>), TxError> {
    check_output_proposal_set(&output_proposals)?;

    output_proposals.sort_by(|a, b| {
        a.onetime_address
            .compress()
            .as_bytes()
            .cmp(b.onetime_address.compress().as_bytes())
    });

    let mut enotes = Vec::with_capacity(output_proposals.len());
    let mut amounts = Vec::with_capacity(output_proposals.len());
    let mut blinding_factors = Vec::with_capacity(output_proposals.len());
    let mut memo_elements: Vec<ExtraFieldElement> = Vec::new();

    let mut supplement = TxSupplement::default();
    let shared_2out = output_proposals.len() == 2
        && output_proposals[0].enote_ephemeral_pubkey
            == output_proposals[1].enote_ephemeral_pubkey;

    for proposal in &output_proposals {
        enotes.push(proposal.enote());
        amounts.push(proposal.amount);
        blinding_factors.push(proposal.amount_blinding_factor);
        memo_elements.extend_from_slice(&proposal.partial_memo);
    }

    if shared_2out {
        supplement
            .output_enote_ephemeral_pubkeys
            .push(output_proposals[0].enote_ephemeral_pubkey);
    } else {
        for proposal in &output_proposals {
            supplement
                .output_enote_ephemeral_pubkeys
                .push(proposal.enote_ephemeral_pubkey);
        }
    }
    supplement.tx_extra = make_tx_extra(memo_elements);

    Ok((enotes, supplement, amounts, blinding_factors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use seraphis_crypto::address::{make_destination, AddressIndex};
    use seraphis_crypto::address_tag::CipherContext;
    use seraphis_crypto::{enote_utils, JamtisKeys};

    use crate::proposal::PaymentProposal;

    struct Fixture {
        keys: JamtisKeys,
        change_destination: Destination,
        other_destination: Destination,
        input_context: [u8; 32],
    }

    fn fixture() -> Fixture {
        let keys = JamtisKeys::derive(Scalar::from(0x5eedu64));
        let cipher = CipherContext::new(&keys.s_cipher_tag);
        let change_destination = make_destination(
            &keys.spend_pubkey,
            &keys.unlockamounts_pubkey,
            &keys.findreceived_pubkey,
            &keys.s_generate_address,
            &cipher,
            AddressIndex::from_u128(0),
        );

        let other = JamtisKeys::derive(Scalar::from(0x0facadeu64));
        let other_cipher = CipherContext::new(&other.s_cipher_tag);
        let other_destination = make_destination(
            &other.spend_pubkey,
            &other.unlockamounts_pubkey,
            &other.findreceived_pubkey,
            &other.s_generate_address,
            &other_cipher,
            AddressIndex::from_u128(1),
        );

        Fixture {
            keys,
            change_destination,
            other_destination,
            input_context: enote_utils::make_input_context_coinbase(7),
        }
    }

    fn finalize(
        fixture: &Fixture,
        total_input: u128,
        fee: u64,
        proposals: &mut Vec<OutputProposal>,
    ) -> Result<(), TxError> {
        finalize_output_proposal_set(
            &mut rand::thread_rng(),
            total_input,
            fee,
            &fixture.change_destination,
            &fixture.keys.k_view_balance,
            &fixture.input_context,
            proposals,
        )
    }

    fn plain_output(fixture: &Fixture, amount: u64) -> OutputProposal {
        PaymentProposal::new(fixture.other_destination, amount, &mut rand::thread_rng())
            .output_proposal(&fixture.input_context)
    }

    fn selfsend_output(fixture: &Fixture, amount: u64) -> OutputProposal {
        SelfSendPaymentProposal::new(
            fixture.change_destination,
            amount,
            SelfSendType::SelfSpend,
            &mut rand::thread_rng(),
        )
        .output_proposal(&fixture.keys.k_view_balance, &fixture.input_context)
    }

    #[test]
    fn empty_set_is_rejected() {
        let fixture = fixture();
        let mut proposals = vec![];
        assert!(matches!(
            finalize(&fixture, 100, 0, &mut proposals),
            Err(TxError::OutputSetInvalid(_))
        ));
    }

    #[test]
    fn one_output_zero_change_gains_special_dummy() {
        let fixture = fixture();
        let mut proposals = vec![plain_output(&fixture, 95)];
        finalize(&fixture, 100, 5, &mut proposals).unwrap();

        assert_eq!(proposals.len(), 2);
        assert_eq!(
            proposals[0].enote_ephemeral_pubkey,
            proposals[1].enote_ephemeral_pubkey
        );
        assert_eq!(proposals[1].amount, 0);
    }

    #[test]
    fn one_plain_output_with_change_gains_special_change() {
        let fixture = fixture();
        let mut proposals = vec![plain_output(&fixture, 60)];
        finalize(&fixture, 100, 5, &mut proposals).unwrap();

        assert_eq!(proposals.len(), 2);
        // change shares the payment's ephemeral pubkey and carries the rest
        assert_eq!(
            proposals[0].enote_ephemeral_pubkey,
            proposals[1].enote_ephemeral_pubkey
        );
        assert_eq!(proposals[1].amount, 35);
        assert_eq!(proposals[1].self_send_type, Some(SelfSendType::Change));
    }

    #[test]
    fn one_selfsend_output_with_change_gains_dummy_and_change() {
        let fixture = fixture();
        let mut proposals = vec![selfsend_output(&fixture, 60)];
        finalize(&fixture, 100, 5, &mut proposals).unwrap();

        assert_eq!(proposals.len(), 3);
        let change_sum: u64 = proposals[1..].iter().map(|p| p.amount).sum();
        assert_eq!(change_sum, 35);
        // all ephemeral pubkeys distinct in the 3-out shape
        check_output_proposal_set(&proposals).unwrap();
        assert!(all_ephemeral_pubkeys_unique(
            &proposals.iter().map(ProposalShape::from).collect::<Vec<_>>()
        ));
    }

    #[test]
    fn two_distinct_outputs_zero_change_gain_dummy() {
        let fixture = fixture();
        let mut proposals = vec![plain_output(&fixture, 50), plain_output(&fixture, 45)];
        finalize(&fixture, 100, 5, &mut proposals).unwrap();
        assert_eq!(proposals.len(), 3);
    }

    #[test]
    fn two_distinct_outputs_with_change_gain_normal_change() {
        let fixture = fixture();
        let mut proposals = vec![plain_output(&fixture, 50), plain_output(&fixture, 25)];
        finalize(&fixture, 100, 5, &mut proposals).unwrap();

        assert_eq!(proposals.len(), 3);
        assert_eq!(proposals[2].amount, 20);
        assert_eq!(proposals[2].self_send_type, Some(SelfSendType::Change));
    }

    #[test]
    fn two_shared_outputs_with_change_are_rejected() {
        let fixture = fixture();
        let mut proposals = vec![plain_output(&fixture, 50)];
        // force a shared ephemeral pubkey pair
        let mut second = plain_output(&fixture, 30);
        second.enote_ephemeral_pubkey = proposals[0].enote_ephemeral_pubkey;
        proposals.push(second);

        assert!(matches!(
            finalize(&fixture, 100, 5, &mut proposals),
            Err(TxError::OutputSetInvalid(_))
        ));
    }

    #[test]
    fn three_outputs_with_change_gain_normal_change() {
        let fixture = fixture();
        let mut proposals = vec![
            plain_output(&fixture, 10),
            plain_output(&fixture, 20),
            plain_output(&fixture, 30),
        ];
        finalize(&fixture, 100, 5, &mut proposals).unwrap();
        assert_eq!(proposals.len(), 4);
        assert_eq!(proposals[3].amount, 35);
    }

    #[test]
    fn insufficient_inputs_are_rejected() {
        let fixture = fixture();
        let mut proposals = vec![plain_output(&fixture, 95)];
        assert!(matches!(
            finalize(&fixture, 90, 10, &mut proposals),
            Err(TxError::OutputSetInvalid(_))
        ));
    }

    #[test]
    fn supplement_wire_round_trip() {
        let supplement = TxSupplement {
            output_enote_ephemeral_pubkeys: vec![
                MontgomeryPoint([1u8; 32]),
                MontgomeryPoint([2u8; 32]),
                MontgomeryPoint([3u8; 32]),
            ],
            tx_extra: crate::extra::make_tx_extra(vec![crate::extra::ExtraFieldElement::new(
                4,
                vec![5, 6],
            )]),
        };
        check_tx_supplement_semantics(&supplement, 3).unwrap();

        let bytes = supplement.to_bytes();
        assert_eq!(TxSupplement::from_slice(&bytes).unwrap(), supplement);

        // truncated pubkey section
        assert!(matches!(
            TxSupplement::from_slice(&bytes[..20]),
            Err(TxError::MalformedWireData)
        ));
        // malformed tx-extra tail
        let mut bad = supplement.to_bytes();
        bad.push(0x80);
        assert!(matches!(
            TxSupplement::from_slice(&bad),
            Err(TxError::MalformedWireData)
        ));
    }

    #[test]
    fn supplement_shape_follows_output_count() {
        let fixture = fixture();

        // 2-out with shared pubkey: one supplement entry
        let mut proposals = vec![plain_output(&fixture, 95)];
        finalize(&fixture, 100, 5, &mut proposals).unwrap();
        let (enotes, supplement, _, _) = make_outputs(proposals).unwrap();
        assert_eq!(enotes.len(), 2);
        assert_eq!(supplement.output_enote_ephemeral_pubkeys.len(), 1);

        // 3-out: one entry per output, all distinct
        let mut proposals = vec![plain_output(&fixture, 40), plain_output(&fixture, 40)];
        finalize(&fixture, 100, 5, &mut proposals).unwrap();
        let (enotes, supplement, _, _) = make_outputs(proposals).unwrap();
        assert_eq!(enotes.len(), 3);
        assert_eq!(supplement.output_enote_ephemeral_pubkeys.len(), 3);
        for (i, pubkey) in supplement.output_enote_ephemeral_pubkeys.iter().enumerate() {
            for other in &supplement.output_enote_ephemeral_pubkeys[i + 1..] {
                assert_ne!(pubkey, other);
            }
        }
    }
}
