//! Wallet error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("ledger error: {0}")]
    Ledger(String),

    #[error("ledger chunk does not start at the requested height")]
    MisalignedChunk,

    #[error("chain reorg exceeded the partial-scan retry budget")]
    ReorgAttemptsExhausted,

    #[error("crypto error: {0}")]
    Crypto(#[from] seraphis_crypto::CryptoError),
}
