use thiserror::Error;

use crate::network::BtcNetwork;

/// Bitcoin chain operation errors.
#[derive(Debug, Error)]
pub enum BtcError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("address belongs to {found}, expected {expected}")]
    NetworkMismatch {
        expected: BtcNetwork,
        found: BtcNetwork,
    },

    #[error("no UTXOs available")]
    NoUtxos,

    #[error("insufficient funds: have {available} sat, need {required} sat")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("invalid fee rate: {0}")]
    InvalidFeeRate(f64),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),
}
