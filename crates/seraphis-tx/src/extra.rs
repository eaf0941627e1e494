//! Tx-extra: a sorted type-length-value stream.
//!
//! Each element serializes as `varint(type) || varint(len) || bytes`; the
//! stream is sorted by `(type, value)` before serialization so independent
//! builders produce identical bytes. Deserialization is all-or-nothing:
//! trailing bytes or truncated elements reject the whole field.

use seraphis_types::varint::{read_varint, varint_size, write_varint};

use crate::error::TxError;

/// Serialized tx-extra field.
pub type TxExtra = Vec<u8>;

/// One TLV element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExtraFieldElement {
    pub field_type: u64,
    pub value: Vec<u8>,
}

impl ExtraFieldElement {
    pub fn new(field_type: u64, value: Vec<u8>) -> ExtraFieldElement {
        ExtraFieldElement { field_type, value }
    }

    /// Serialized size of this element.
    pub fn size(&self) -> usize {
        varint_size(self.field_type) + varint_size(self.value.len() as u64) + self.value.len()
    }

    fn append_to_bytes(&self, out: &mut TxExtra) {
        write_varint(out, self.field_type);
        write_varint(out, self.value.len() as u64);
        out.extend_from_slice(&self.value);
    }
}

/// Serialize elements into a tx-extra field (sorting them first).
pub fn make_tx_extra(mut elements: Vec<ExtraFieldElement>) -> TxExtra {
    elements.sort();

    let mut tx_extra = Vec::with_capacity(elements.iter().map(ExtraFieldElement::size).sum());
    for element in &elements {
        element.append_to_bytes(&mut tx_extra);
    }
    tx_extra
}

/// Parse a tx-extra field; the returned elements are in stream (sorted)
/// order.
pub fn try_get_extra_field_elements(tx_extra: &[u8]) -> Result<Vec<ExtraFieldElement>, TxError> {
    let mut elements = Vec::new();
    let mut position = 0;

    while position < tx_extra.len() {
        let field_type =
            read_varint(tx_extra, &mut position).map_err(|_| TxError::MalformedWireData)?;
        let length =
            read_varint(tx_extra, &mut position).map_err(|_| TxError::MalformedWireData)?;
        let length = usize::try_from(length).map_err(|_| TxError::MalformedWireData)?;

        let end = position.checked_add(length).ok_or(TxError::MalformedWireData)?;
        if end > tx_extra.len() {
            return Err(TxError::MalformedWireData);
        }
        elements.push(ExtraFieldElement::new(field_type, tx_extra[position..end].to_vec()));
        position = end;
    }

    Ok(elements)
}

/// Merge elements from another source (e.g. a partial memo) into a working
/// set; the final [`make_tx_extra`] re-sorts everything.
pub fn accumulate_extra_field_elements(
    elements_to_add: &[ExtraFieldElement],
    elements: &mut Vec<ExtraFieldElement>,
) {
    elements.extend_from_slice(elements_to_add);
}

/// Parse a serialized partial memo and merge its elements.
pub fn accumulate_partial_memo(
    partial_memo: &[u8],
    elements: &mut Vec<ExtraFieldElement>,
) -> Result<(), TxError> {
    let parsed = try_get_extra_field_elements(partial_memo)?;
    accumulate_extra_field_elements(&parsed, elements);
    Ok(())
}
