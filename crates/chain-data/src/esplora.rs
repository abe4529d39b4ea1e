//! Wire types for the Esplora REST API (mempool.space, blockstream.info).

use std::collections::HashMap;

use chain_btc::utxo::Utxo;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressStats {
    #[serde(default)]
    pub funded_txo_sum: u64,
    #[serde(default)]
    pub spent_txo_sum: u64,
    #[serde(default)]
    pub tx_count: u64,
}

/// `GET /address/{address}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressResponse {
    #[serde(default)]
    pub address: String,
    pub chain_stats: AddressStats,
    pub mempool_stats: AddressStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EsploraStatus {
    pub confirmed: bool,
    #[serde(default)]
    pub block_height: Option<u32>,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub block_time: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsploraVout {
    #[serde(default)]
    pub scriptpubkey_address: Option<String>,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsploraVin {
    pub txid: String,
    pub vout: u32,
    /// Absent for coinbase inputs.
    #[serde(default)]
    pub prevout: Option<EsploraVout>,
    #[serde(default)]
    pub is_coinbase: bool,
}

/// One element of `GET /address/{address}/txs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsploraTx {
    pub txid: String,
    pub vin: Vec<EsploraVin>,
    pub vout: Vec<EsploraVout>,
    #[serde(default)]
    pub fee: u64,
    pub status: EsploraStatus,
}

/// One element of `GET /address/{address}/utxo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsploraUtxo {
    pub txid: String,
    pub vout: u32,
    pub value: u64,
    pub status: EsploraStatus,
}

impl From<EsploraUtxo> for Utxo {
    fn from(u: EsploraUtxo) -> Self {
        Utxo {
            txid: u.txid,
            vout: u.vout,
            value: u.value,
            confirmed: u.status.confirmed,
        }
    }
}

/// `GET /fee-estimates`: confirmation target in blocks to sat/vB.
pub type FeeEstimateMap = HashMap<String, f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_address_response() {
        let body = r#"{
            "address": "mzBc4XEFSdzCDcTxAgf6EZXgsZWpztRhef",
            "chain_stats": {"funded_txo_count": 2, "funded_txo_sum": 150000, "spent_txo_count": 1, "spent_txo_sum": 50000, "tx_count": 3},
            "mempool_stats": {"funded_txo_count": 0, "funded_txo_sum": 0, "spent_txo_count": 1, "spent_txo_sum": 20000, "tx_count": 1}
        }"#;
        let parsed: AddressResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.chain_stats.funded_txo_sum, 150_000);
        assert_eq!(parsed.mempool_stats.spent_txo_sum, 20_000);
    }

    #[test]
    fn parse_coinbase_input() {
        let body = r#"{
            "txid": "aa",
            "vin": [{"txid": "0000000000000000000000000000000000000000000000000000000000000000", "vout": 4294967295, "prevout": null, "is_coinbase": true}],
            "vout": [{"scriptpubkey_address": "1abc", "value": 625000000}],
            "fee": 0,
            "status": {"confirmed": true, "block_height": 800000, "block_time": 1690000000}
        }"#;
        let tx: EsploraTx = serde_json::from_str(body).unwrap();
        assert!(tx.vin[0].is_coinbase);
        assert!(tx.vin[0].prevout.is_none());
        assert_eq!(tx.status.block_height, Some(800_000));
    }

    #[test]
    fn utxo_conversion_keeps_confirmation() {
        let body = r#"{"txid": "bb", "vout": 1, "value": 5000, "status": {"confirmed": false}}"#;
        let utxo: Utxo = serde_json::from_str::<EsploraUtxo>(body).unwrap().into();
        assert_eq!(utxo.vout, 1);
        assert_eq!(utxo.value, 5000);
        assert!(!utxo.confirmed);
    }
}
