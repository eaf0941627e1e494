//! Transaction assembly.
//!
//! The pipeline, each step total:
//!
//! 1. payment proposals → output proposals ([`proposal`]);
//! 2. output-set finalization: dummy/change insertion and ephemeral-pubkey
//!    policy ([`outputs`]);
//! 3. input selection under a fee calculator ([`input_selection`], [`fee`]);
//! 4. proposal-prefix message, partial inputs, balance proof, partial tx
//!    ([`builder`], [`proofs`]);
//! 5. membership-proof reference sets for a later ring-selection step
//!    ([`membership`]).
//!
//! Multisig intermediate types live in [`multisig`]; the tx-extra TLV codec
//! in [`extra`].

pub mod builder;
pub mod error;
pub mod extra;
pub mod fee;
pub mod input_selection;
pub mod membership;
pub mod multisig;
pub mod outputs;
pub mod proofs;
pub mod proposal;

pub use builder::{PartialInput, PartialTx, Transaction, TxProposal};
pub use error::TxError;
pub use extra::ExtraFieldElement;
pub use fee::{FeeCalculator, FlatFeeCalculator, WeightFeeCalculator};
pub use input_selection::{InputSelector, StoreInputSelector};
pub use outputs::TxSupplement;
pub use proposal::{OutputProposal, PaymentProposal, SelfSendPaymentProposal};
