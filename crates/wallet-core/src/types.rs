use std::time::{SystemTime, UNIX_EPOCH};

use chain_btc::network::BtcNetwork;
use chain_data::{Balance, EnhancedTransaction};
use crypto_utils::entropy::random_bytes_fixed;
use serde::{Deserialize, Serialize};

/// Derived address together with the path it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedAddress {
    pub network: BtcNetwork,
    pub address: String,
    pub derivation_path: String,
}

/// Wallet metadata handed to the storage layer.
///
/// Holds no key material: there is no field a mnemonic or private key could
/// be written to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub balance: Balance,
    pub transactions: Vec<EnhancedTransaction>,
    pub network: BtcNetwork,
    pub derivation_path: String,
    /// Unix seconds.
    pub created_at: u64,
}

impl WalletRecord {
    /// Fresh record with zero balance and no history.
    pub fn new(name: impl Into<String>, derived: DerivedAddress) -> Self {
        Self {
            id: hex::encode(random_bytes_fixed::<16>()),
            name: name.into(),
            address: derived.address,
            balance: Balance::default(),
            transactions: Vec::new(),
            network: derived.network,
            derivation_path: derived.derivation_path,
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }
}
