//! Wallet core: enote records, the enote store, and ledger scanning.
//!
//! Scanning is a pull-based state machine: the caller hands a
//! [`scanner::LedgerSource`] to [`scanner::refresh_enote_store`], which
//! consumes ledger chunks, extracts owned records through the three
//! recovery tiers, applies origin and spent contexts to the
//! [`store::EnoteStore`], and rewinds-and-retries on reorgs.

pub mod error;
pub mod mock_ledger;
pub mod record_utils;
pub mod records;
pub mod scanner;
pub mod store;

pub use error::WalletError;
pub use records::{
    BasicEnoteRecord, ContextualEnoteRecord, EnoteRecord, IntermediateEnoteRecord, OriginContext,
    OriginStatus, SpentContext, SpentStatus,
};
pub use scanner::{LedgerSource, RefreshConfig};
pub use store::EnoteStore;

/// Block identifier.
pub type BlockId = [u8; 32];

/// Transaction identifier.
pub type TxId = [u8; 32];
