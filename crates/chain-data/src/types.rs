use serde::{Deserialize, Serialize};

use crate::esplora::{EsploraStatus, EsploraTx, FeeEstimateMap};

/// Address balance in satoshis. Mempool deltas can be negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub confirmed: i64,
    pub unconfirmed: i64,
    pub total: i64,
}

impl Balance {
    pub fn new(confirmed: i64, unconfirmed: i64) -> Self {
        Self {
            confirmed,
            unconfirmed,
            total: confirmed + unconfirmed,
        }
    }
}

/// Fee rates in sat/vB for common confirmation targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeEstimates {
    /// Next block.
    pub fastest: f64,
    /// ~3 blocks.
    pub half_hour: f64,
    /// ~6 blocks.
    pub hour: f64,
    /// ~144 blocks.
    pub economy: f64,
    /// ~1008 blocks.
    pub minimum: f64,
}

impl FeeEstimates {
    /// Served when no provider and no cache entry is available.
    pub const FALLBACK: FeeEstimates = FeeEstimates {
        fastest: 20.0,
        half_hour: 15.0,
        hour: 10.0,
        economy: 5.0,
        minimum: 1.0,
    };

    /// Map Esplora block targets onto the five tiers. A missing target takes
    /// the estimate of the nearest lower target that is present. Returns
    /// `None` when the map has no usable entries.
    pub fn from_esplora(map: &FeeEstimateMap) -> Option<Self> {
        let mut targets: Vec<(u32, f64)> = map
            .iter()
            .filter_map(|(k, v)| Some((k.parse::<u32>().ok()?, *v)))
            .filter(|(_, v)| v.is_finite() && *v > 0.0)
            .collect();
        if targets.is_empty() {
            return None;
        }
        targets.sort_by_key(|(k, _)| *k);

        let rate_for = |blocks: u32| -> f64 {
            targets
                .iter()
                .rev()
                .find(|(k, _)| *k <= blocks)
                .or_else(|| targets.first())
                .map(|(_, v)| *v)
                .unwrap_or(Self::FALLBACK.minimum)
        };

        Some(Self {
            fastest: rate_for(1),
            half_hour: rate_for(3),
            hour: rate_for(6),
            economy: rate_for(144),
            minimum: rate_for(1008),
        })
    }
}

impl Default for FeeEstimates {
    fn default() -> Self {
        Self::FALLBACK
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxDirection {
    Received,
    Sent,
    #[serde(rename = "self")]
    SelfTransfer,
}

/// An input prevout or output, tagged with whether it pays the queried address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxParticipant {
    pub address: Option<String>,
    pub value: u64,
    pub is_mine: bool,
}

/// USD valuation attached by the cost basis ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBasisData {
    /// BTC price at the transaction time.
    pub price_usd: f64,
    /// `|amount| × price_usd`.
    pub value_usd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_basis_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realized_gain_usd: Option<f64>,
}

/// A transaction as seen from one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedTransaction {
    pub txid: String,
    pub direction: TxDirection,
    pub inputs: Vec<TxParticipant>,
    pub outputs: Vec<TxParticipant>,
    pub fee: u64,
    /// Received: sum paid to the address. Sent: sum paid elsewhere. Self: 0.
    pub amount: u64,
    /// Outputs to the address minus inputs from it.
    pub net_amount: i64,
    pub confirmed: bool,
    pub block_height: Option<u32>,
    /// Block time, unix seconds.
    pub timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_basis: Option<CostBasisData>,
}

impl EnhancedTransaction {
    /// Classify a raw transaction relative to `address`.
    pub fn from_esplora(tx: &EsploraTx, address: &str) -> Self {
        let inputs: Vec<TxParticipant> = tx
            .vin
            .iter()
            .filter_map(|vin| vin.prevout.as_ref())
            .map(|prev| participant(prev.scriptpubkey_address.as_deref(), prev.value, address))
            .collect();
        let outputs: Vec<TxParticipant> = tx
            .vout
            .iter()
            .map(|out| participant(out.scriptpubkey_address.as_deref(), out.value, address))
            .collect();

        let from_me: u64 = inputs.iter().filter(|p| p.is_mine).map(|p| p.value).sum();
        let to_me: u64 = outputs.iter().filter(|p| p.is_mine).map(|p| p.value).sum();
        let to_others: u64 = outputs.iter().filter(|p| !p.is_mine).map(|p| p.value).sum();
        let spends = inputs.iter().any(|p| p.is_mine);

        let (direction, amount) = if !spends {
            (TxDirection::Received, to_me)
        } else if to_others == 0 {
            (TxDirection::SelfTransfer, 0)
        } else {
            (TxDirection::Sent, to_others)
        };

        Self {
            txid: tx.txid.clone(),
            direction,
            inputs,
            outputs,
            fee: tx.fee,
            amount,
            net_amount: to_me as i64 - from_me as i64,
            confirmed: tx.status.confirmed,
            block_height: tx.status.block_height,
            timestamp: tx.status.block_time,
            cost_basis: None,
        }
    }
}

fn participant(addr: Option<&str>, value: u64, mine: &str) -> TxParticipant {
    TxParticipant {
        address: addr.map(str::to_string),
        value,
        is_mine: addr == Some(mine),
    }
}

/// Confirmation status of a single transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxStatus {
    pub confirmed: bool,
    pub block_height: Option<u32>,
    pub block_time: Option<u64>,
}

impl From<EsploraStatus> for TxStatus {
    fn from(s: EsploraStatus) -> Self {
        Self {
            confirmed: s.confirmed,
            block_height: s.block_height,
            block_time: s.block_time,
        }
    }
}

/// Where a read result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// Answered by a provider just now.
    Live,
    /// Served from a cache entry within its TTL.
    Cached,
    /// Every provider failed; served from an expired cache entry.
    Stale,
    /// Every provider failed and nothing was cached; a safe default.
    Fallback,
}

/// A read result with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub freshness: Freshness,
}

impl<T> Fetched<T> {
    pub fn new(value: T, freshness: Freshness) -> Self {
        Self { value, freshness }
    }

    pub fn fallback(value: T) -> Self {
        Self::new(value, Freshness::Fallback)
    }

    /// True when the value came from a provider, now or within the TTL.
    pub fn is_current(&self) -> bool {
        matches!(self.freshness, Freshness::Live | Freshness::Cached)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            value: f(self.value),
            freshness: self.freshness,
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}
