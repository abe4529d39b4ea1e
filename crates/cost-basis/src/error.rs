use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid amount: {0} BTC")]
    InvalidAmount(f64),

    #[error("invalid price: {0} USD")]
    InvalidPrice(f64),

    #[error("no price available for transaction {txid} at {timestamp}")]
    MissingPrice { txid: String, timestamp: u64 },

    #[error("ledger snapshot error: {0}")]
    Snapshot(String),
}
