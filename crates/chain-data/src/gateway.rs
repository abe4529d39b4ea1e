use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chain_btc::address::address_network;
use chain_btc::network::BtcNetwork;
use chain_btc::utxo::Utxo;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, ResponseCache};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::esplora::{AddressResponse, EsploraStatus, EsploraTx, EsploraUtxo, FeeEstimateMap};
use crate::types::{Balance, EnhancedTransaction, FeeEstimates, Fetched, Freshness, TxStatus};

const EP_ADDRESS: &str = "address";
const EP_TXS: &str = "address/txs";
const EP_UTXO: &str = "address/utxo";
const EP_FEES: &str = "fee-estimates";

/// Esplora client over an ordered provider ring for one network.
///
/// Reads start at the last provider that answered and walk the ring once.
/// When all providers fail, reads fall back to an expired cache entry and
/// then to a safe default, so they never return an error. Broadcasts go to
/// the current provider and only move on when the connection itself was
/// refused.
pub struct ChainDataGateway {
    network: BtcNetwork,
    providers: Vec<String>,
    rotation: AtomicUsize,
    http: reqwest::Client,
    cache: Arc<ResponseCache>,
}

impl ChainDataGateway {
    pub fn new(
        network: BtcNetwork,
        config: &GatewayConfig,
        cache: Arc<ResponseCache>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;
        let providers = config
            .providers(network)
            .iter()
            .map(|url| url.trim_end_matches('/').to_string())
            .collect();

        Ok(Self {
            network,
            providers,
            rotation: AtomicUsize::new(0),
            http,
            cache,
        })
    }

    /// Gateway with its own cache, using the configured TTL.
    pub fn from_config(network: BtcNetwork, config: &GatewayConfig) -> Result<Self, GatewayError> {
        let cache = Arc::new(
            ResponseCache::new(config.cache_ttl()).with_max_stale(config.stale_max_age()),
        );
        Self::new(network, config, cache)
    }

    pub fn network(&self) -> BtcNetwork {
        self.network
    }

    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    /// Provider the next request will try first.
    pub fn current_provider(&self) -> &str {
        &self.providers[self.rotation.load(Ordering::Relaxed) % self.providers.len()]
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    // ─── Reads ──────────────────────────────────────────────────────

    pub async fn get_balance(&self, address: &str) -> Fetched<Balance> {
        if !self.accepts(address) {
            return Fetched::fallback(Balance::default());
        }
        let path = format!("/address/{address}");
        match self.read::<AddressResponse>(EP_ADDRESS, &path, address).await {
            Ok(fetched) => fetched.map(|info| {
                let chain = &info.chain_stats;
                let mempool = &info.mempool_stats;
                Balance::new(
                    chain.funded_txo_sum as i64 - chain.spent_txo_sum as i64,
                    mempool.funded_txo_sum as i64 - mempool.spent_txo_sum as i64,
                )
            }),
            Err(e) => {
                warn!(%address, error = %e, "balance unavailable, returning zero");
                Fetched::fallback(Balance::default())
            }
        }
    }

    pub async fn get_transactions(&self, address: &str) -> Fetched<Vec<EnhancedTransaction>> {
        if !self.accepts(address) {
            return Fetched::fallback(Vec::new());
        }
        let path = format!("/address/{address}/txs");
        match self.read::<Vec<EsploraTx>>(EP_TXS, &path, address).await {
            Ok(fetched) => fetched.map(|txs| {
                txs.iter()
                    .map(|tx| EnhancedTransaction::from_esplora(tx, address))
                    .collect()
            }),
            Err(e) => {
                warn!(%address, error = %e, "history unavailable, returning empty list");
                Fetched::fallback(Vec::new())
            }
        }
    }

    pub async fn get_utxos(&self, address: &str) -> Fetched<Vec<Utxo>> {
        if !self.accepts(address) {
            return Fetched::fallback(Vec::new());
        }
        let path = format!("/address/{address}/utxo");
        match self.read::<Vec<EsploraUtxo>>(EP_UTXO, &path, address).await {
            Ok(fetched) => fetched.map(|utxos| utxos.into_iter().map(Utxo::from).collect()),
            Err(e) => {
                warn!(%address, error = %e, "UTXOs unavailable, returning empty list");
                Fetched::fallback(Vec::new())
            }
        }
    }

    pub async fn get_fee_estimates(&self) -> Fetched<FeeEstimates> {
        match self.read::<FeeEstimateMap>(EP_FEES, "/fee-estimates", "").await {
            Ok(fetched) => match FeeEstimates::from_esplora(&fetched.value) {
                Some(fees) => Fetched::new(fees, fetched.freshness),
                None => {
                    warn!("fee estimate response was empty, using static rates");
                    Fetched::fallback(FeeEstimates::FALLBACK)
                }
            },
            Err(e) => {
                warn!(error = %e, "fee estimates unavailable, using static rates");
                Fetched::fallback(FeeEstimates::FALLBACK)
            }
        }
    }

    // ─── Writes ─────────────────────────────────────────────────────

    /// Submit a signed transaction. Returns the txid reported by the provider.
    ///
    /// A non-2xx answer is returned as [`GatewayError::BroadcastRejected`]
    /// carrying the provider's message unchanged. A timeout or any failure
    /// after the connection was established is
    /// [`GatewayError::BroadcastUnknown`]: the transaction may have been
    /// relayed, so it is not resent.
    pub async fn broadcast(&self, raw_tx_hex: &str) -> Result<String, GatewayError> {
        let raw_tx_hex = raw_tx_hex.trim();
        if raw_tx_hex.is_empty()
            || raw_tx_hex.len() % 2 != 0
            || !raw_tx_hex.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(GatewayError::InvalidTransaction("expected non-empty hex".into()));
        }

        let start = self.rotation.load(Ordering::Relaxed) % self.providers.len();
        let mut last_error = String::new();

        for offset in 0..self.providers.len() {
            let idx = (start + offset) % self.providers.len();
            let url = format!("{}/tx", self.providers[idx]);
            debug!(%url, "broadcasting transaction");

            let response = match self
                .http
                .post(&url)
                .header(CONTENT_TYPE, "text/plain")
                .body(raw_tx_hex.to_string())
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) if e.is_connect() => {
                    warn!(%url, error = %e, "broadcast provider unreachable, trying next");
                    last_error = e.to_string();
                    continue;
                }
                Err(e) => {
                    warn!(%url, error = %e, "broadcast outcome unknown");
                    return Err(GatewayError::BroadcastUnknown(e.to_string()));
                }
            };

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| GatewayError::BroadcastUnknown(e.to_string()))?;

            if !status.is_success() {
                warn!(%url, status = status.as_u16(), "broadcast rejected");
                return Err(GatewayError::BroadcastRejected {
                    status: status.as_u16(),
                    message: body,
                });
            }

            self.promote(start, idx);
            let txid = body.trim().to_string();
            info!(%txid, provider = %self.providers[idx], "transaction broadcast");
            return Ok(txid);
        }

        Err(GatewayError::ProvidersExhausted {
            endpoint: "/tx".into(),
            attempted: self.providers.len(),
            last_error,
        })
    }

    /// Look up a transaction's confirmation status. `Ok(None)` when no
    /// provider knows the txid.
    pub async fn get_tx_status(&self, txid: &str) -> Result<Option<TxStatus>, GatewayError> {
        if txid.len() != 64 || !txid.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(GatewayError::InvalidTransaction(format!("malformed txid: {txid}")));
        }
        let path = format!("/tx/{txid}/status");
        let start = self.rotation.load(Ordering::Relaxed) % self.providers.len();
        let mut last_error = String::new();

        for offset in 0..self.providers.len() {
            let idx = (start + offset) % self.providers.len();
            match self.get_json(idx, &path).await {
                Ok(value) => {
                    let status: EsploraStatus = serde_json::from_value(value)
                        .map_err(|e| GatewayError::Decode(e.to_string()))?;
                    self.promote(start, idx);
                    return Ok(Some(status.into()));
                }
                Err(GatewayError::Status { status: 404, .. }) => {
                    self.promote(start, idx);
                    return Ok(None);
                }
                Err(e) => {
                    warn!(provider = %self.providers[idx], error = %e, "status lookup failed");
                    last_error = e.to_string();
                }
            }
        }

        Err(GatewayError::ProvidersExhausted {
            endpoint: path,
            attempted: self.providers.len(),
            last_error,
        })
    }

    // ─── Internals ──────────────────────────────────────────────────

    fn accepts(&self, address: &str) -> bool {
        match address_network(address) {
            Some(network) if network == self.network => true,
            found => {
                warn!(
                    %address,
                    expected = %self.network,
                    found = ?found,
                    "address does not belong to this network, skipping request"
                );
                false
            }
        }
    }

    /// Fresh cache, then each provider once, then stale cache.
    async fn read<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        params: &str,
    ) -> Result<Fetched<T>, GatewayError> {
        let key = CacheKey::new(self.network, endpoint, params);

        if let Some(value) = self.cache.get_fresh(&key) {
            match serde_json::from_value(value) {
                Ok(parsed) => {
                    debug!(endpoint, %params, "cache hit");
                    return Ok(Fetched::new(parsed, Freshness::Cached));
                }
                Err(e) => {
                    warn!(endpoint, error = %e, "discarding undecodable cache entry");
                    self.cache.remove(&key);
                }
            }
        }

        let start = self.rotation.load(Ordering::Relaxed) % self.providers.len();
        let mut last_error = String::new();

        for offset in 0..self.providers.len() {
            let idx = (start + offset) % self.providers.len();
            let result = self.get_json(idx, path).await.and_then(|value| {
                serde_json::from_value::<T>(value.clone())
                    .map(|parsed| (parsed, value))
                    .map_err(|e| GatewayError::Decode(e.to_string()))
            });
            match result {
                Ok((parsed, raw)) => {
                    self.promote(start, idx);
                    self.cache.insert(key, raw);
                    return Ok(Fetched::new(parsed, Freshness::Live));
                }
                Err(e) => {
                    warn!(provider = %self.providers[idx], %path, error = %e, "provider request failed");
                    last_error = e.to_string();
                }
            }
        }

        if let Some((value, age)) = self.cache.get_any(&key) {
            if let Ok(parsed) = serde_json::from_value(value) {
                warn!(endpoint, %params, age_ms = age.as_millis() as u64, "all providers failed, serving stale cache");
                return Ok(Fetched::new(parsed, Freshness::Stale));
            }
        }

        Err(GatewayError::ProvidersExhausted {
            endpoint: path.to_string(),
            attempted: self.providers.len(),
            last_error,
        })
    }

    async fn get_json(&self, idx: usize, path: &str) -> Result<Value, GatewayError> {
        let url = format!("{}{}", self.providers[idx], path);
        debug!(%url, "GET");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Err(GatewayError::Decode("empty response".into()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    fn promote(&self, previous: usize, idx: usize) {
        if previous != idx {
            info!(
                from = %self.providers[previous],
                to = %self.providers[idx],
                "switched chain data provider"
            );
        }
        self.rotation.store(idx, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(providers: &[&str]) -> ChainDataGateway {
        let config = GatewayConfig::default().with_providers(
            BtcNetwork::Testnet,
            providers.iter().map(|p| p.to_string()).collect(),
        );
        ChainDataGateway::from_config(BtcNetwork::Testnet, &config).unwrap()
    }

    #[test]
    fn trailing_slashes_trimmed() {
        let gw = gateway(&["http://a.example/api/", "http://b.example/api"]);
        assert_eq!(gw.providers(), ["http://a.example/api", "http://b.example/api"]);
        assert_eq!(gw.current_provider(), "http://a.example/api");
    }

    #[test]
    fn promote_moves_rotation() {
        let gw = gateway(&["http://a.example", "http://b.example"]);
        gw.promote(0, 1);
        assert_eq!(gw.current_provider(), "http://b.example");
    }

    #[test]
    fn accepts_only_own_network() {
        let gw = gateway(&["http://a.example"]);
        let testnet =
            chain_btc::address::pubkey_to_p2pkh_address(&[0x02; 33], BtcNetwork::Testnet).unwrap();
        assert!(gw.accepts(&testnet));
        assert!(gw.accepts("tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx"));
        assert!(!gw.accepts("1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"));
        assert!(!gw.accepts("not-an-address"));
    }

    #[tokio::test]
    async fn broadcast_rejects_non_hex_without_request() {
        let gw = gateway(&["http://127.0.0.1:1"]);
        assert!(matches!(
            gw.broadcast("zz").await,
            Err(GatewayError::InvalidTransaction(_))
        ));
        assert!(matches!(
            gw.broadcast("").await,
            Err(GatewayError::InvalidTransaction(_))
        ));
    }

    #[tokio::test]
    async fn tx_status_rejects_malformed_txid() {
        let gw = gateway(&["http://127.0.0.1:1"]);
        assert!(gw.get_tx_status("abc").await.is_err());
    }
}
