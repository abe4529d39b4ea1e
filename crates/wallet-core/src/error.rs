use chain_btc::network::BtcNetwork;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Address is for {found}, wallet is on {expected}")]
    NetworkMismatch {
        expected: BtcNetwork,
        found: BtcNetwork,
    },

    #[error("Mnemonic and path derive {derived}, not the source address {expected}")]
    AddressMismatch { expected: String, derived: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("No spendable outputs")]
    NoUtxos,

    #[error("Insufficient funds: have {available} sat, need {required} sat")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("Chain data unavailable: {0}")]
    ChainDataUnavailable(String),

    #[error("Transaction build failed: {0}")]
    TransactionFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Provider rejected the transaction; the message is the provider's own.
    #[error("Broadcast failed: {0}")]
    BroadcastFailed(String),

    #[error("Broadcast of {txid} may or may not have succeeded: {reason}")]
    BroadcastUnknown { txid: String, reason: String },

    #[error("Cost basis error: {0}")]
    Ledger(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crypto_utils::error::CryptoError> for WalletError {
    fn from(e: crypto_utils::error::CryptoError) -> Self {
        use crypto_utils::error::CryptoError;
        let message = e.to_string();
        match e {
            CryptoError::UnsupportedEntropy(bits) => {
                WalletError::InvalidMnemonic(format!("unsupported entropy size: {bits} bits"))
            }
            CryptoError::InvalidBase58(_) | CryptoError::ChecksumMismatch => {
                WalletError::InvalidAddress(message)
            }
            CryptoError::InvalidLength { .. } => WalletError::Internal(message),
        }
    }
}

impl From<chain_btc::error::BtcError> for WalletError {
    fn from(e: chain_btc::error::BtcError) -> Self {
        use chain_btc::error::BtcError;
        match e {
            BtcError::InvalidAddress(msg) => WalletError::InvalidAddress(msg),
            BtcError::NetworkMismatch { expected, found } => {
                WalletError::NetworkMismatch { expected, found }
            }
            BtcError::NoUtxos => WalletError::NoUtxos,
            BtcError::InsufficientFunds {
                available,
                required,
            } => WalletError::InsufficientFunds {
                available,
                required,
            },
            BtcError::InvalidAmount(msg) => WalletError::InvalidAmount(msg),
            BtcError::InvalidFeeRate(rate) => {
                WalletError::InvalidAmount(format!("fee rate {rate} sat/vB"))
            }
            BtcError::InvalidPrivateKey(msg) | BtcError::SigningError(msg) => {
                WalletError::SigningFailed(msg)
            }
            BtcError::InvalidPublicKey(msg) => WalletError::DerivationFailed(msg),
            BtcError::TransactionBuildError(msg) => WalletError::TransactionFailed(msg),
            BtcError::UnknownNetwork(name) => {
                WalletError::Internal(format!("unknown network: {name}"))
            }
        }
    }
}

impl From<chain_data::GatewayError> for WalletError {
    fn from(e: chain_data::GatewayError) -> Self {
        use chain_data::GatewayError;
        match e {
            GatewayError::BroadcastRejected { message, .. } => WalletError::BroadcastFailed(message),
            GatewayError::BroadcastUnknown(reason) => WalletError::BroadcastUnknown {
                txid: String::new(),
                reason,
            },
            GatewayError::InvalidTransaction(msg) => WalletError::TransactionFailed(msg),
            other => WalletError::ChainDataUnavailable(other.to_string()),
        }
    }
}

impl From<cost_basis::LedgerError> for WalletError {
    fn from(e: cost_basis::LedgerError) -> Self {
        WalletError::Ledger(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_btc::error::BtcError;
    use chain_data::GatewayError;

    #[test]
    fn btc_errors_keep_their_kind() {
        assert!(matches!(WalletError::from(BtcError::NoUtxos), WalletError::NoUtxos));
        assert!(matches!(
            WalletError::from(BtcError::InsufficientFunds { available: 1, required: 2 }),
            WalletError::InsufficientFunds { available: 1, required: 2 }
        ));
        assert!(matches!(
            WalletError::from(BtcError::NetworkMismatch {
                expected: BtcNetwork::Mainnet,
                found: BtcNetwork::Testnet
            }),
            WalletError::NetworkMismatch { .. }
        ));
    }

    #[test]
    fn rejection_message_is_verbatim() {
        let err: WalletError = GatewayError::BroadcastRejected {
            status: 400,
            message: "bad-txns-inputs-missingorspent".into(),
        }
        .into();
        match err {
            WalletError::BroadcastFailed(msg) => assert_eq!(msg, "bad-txns-inputs-missingorspent"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn address_mismatch_display() {
        let err = WalletError::AddressMismatch {
            expected: "1A".into(),
            derived: "1B".into(),
        };
        assert_eq!(
            err.to_string(),
            "Mnemonic and path derive 1B, not the source address 1A"
        );
    }
}
