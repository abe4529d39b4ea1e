use std::str::FromStr;

use bitcoin::Network;
use serde::{Deserialize, Serialize};

use crate::error::BtcError;

/// Default Esplora providers for Bitcoin mainnet, in fallback order.
pub const MAINNET_PROVIDERS: &[&str] = &["https://mempool.space/api", "https://blockstream.info/api"];

/// Default Esplora providers for Bitcoin testnet, in fallback order.
pub const TESTNET_PROVIDERS: &[&str] = &[
    "https://mempool.space/testnet/api",
    "https://blockstream.info/testnet/api",
];

/// Supported Bitcoin networks.
///
/// Mainnet and testnet address prefixes are mutually exclusive, so every
/// address maps to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BtcNetwork {
    Mainnet,
    Testnet,
}

impl BtcNetwork {
    /// Convert to the `bitcoin` crate's `Network` type.
    pub fn to_bitcoin_network(self) -> Network {
        match self {
            BtcNetwork::Mainnet => Network::Bitcoin,
            BtcNetwork::Testnet => Network::Testnet,
        }
    }

    /// Base58Check version byte for P2PKH addresses.
    pub fn p2pkh_version(self) -> u8 {
        match self {
            BtcNetwork::Mainnet => 0x00,
            BtcNetwork::Testnet => 0x6f,
        }
    }

    /// Base58Check version byte for P2SH addresses.
    pub fn p2sh_version(self) -> u8 {
        match self {
            BtcNetwork::Mainnet => 0x05,
            BtcNetwork::Testnet => 0xc4,
        }
    }

    /// Human-readable part of bech32 addresses.
    pub fn bech32_hrp(self) -> &'static str {
        match self {
            BtcNetwork::Mainnet => "bc",
            BtcNetwork::Testnet => "tb",
        }
    }

    /// BIP-44 coin type.
    pub fn coin_type(self) -> u32 {
        match self {
            BtcNetwork::Mainnet => 0,
            BtcNetwork::Testnet => 1,
        }
    }

    /// Default provider ring for this network.
    pub fn default_providers(self) -> &'static [&'static str] {
        match self {
            BtcNetwork::Mainnet => MAINNET_PROVIDERS,
            BtcNetwork::Testnet => TESTNET_PROVIDERS,
        }
    }
}

impl std::fmt::Display for BtcNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BtcNetwork::Mainnet => write!(f, "mainnet"),
            BtcNetwork::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for BtcNetwork {
    type Err = BtcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" | "bitcoin" => Ok(BtcNetwork::Mainnet),
            "testnet" | "test" | "testnet3" => Ok(BtcNetwork::Testnet),
            other => Err(BtcError::UnknownNetwork(other.to_string())),
        }
    }
}
