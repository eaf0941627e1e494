//! Transaction assembly errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxError {
    #[error("input selection failed: not enough spendable funds")]
    InputSelectionFailed,

    #[error("amount overflow: {0}")]
    AmountOverflow(&'static str),

    #[error("invalid output set: {0}")]
    OutputSetInvalid(&'static str),

    #[error("proof failure: {0}")]
    ProofFailure(String),

    #[error("malformed wire data")]
    MalformedWireData,

    #[error("crypto error: {0}")]
    Crypto(#[from] seraphis_crypto::CryptoError),
}
