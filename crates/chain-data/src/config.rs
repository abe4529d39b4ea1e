use std::time::Duration;

use chain_btc::network::BtcNetwork;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Gateway settings. Every field has a default, so a partial TOML file is
/// enough:
///
/// ```toml
/// request_timeout_ms = 3000
/// testnet_providers = ["http://localhost:3002"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Esplora base URLs for mainnet, in fallback order.
    pub mainnet_providers: Vec<String>,
    /// Esplora base URLs for testnet, in fallback order.
    pub testnet_providers: Vec<String>,
    /// Per-request timeout.
    pub request_timeout_ms: u64,
    /// How long a cached response counts as fresh.
    pub cache_ttl_ms: u64,
    /// How long an expired response may still be served when every
    /// provider fails. Older entries are dropped.
    pub stale_max_age_ms: u64,
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            mainnet_providers: to_owned(BtcNetwork::Mainnet.default_providers()),
            testnet_providers: to_owned(BtcNetwork::Testnet.default_providers()),
            request_timeout_ms: 5_000,
            cache_ttl_ms: 10_000,
            stale_max_age_ms: 86_400_000,
            user_agent: concat!("btc-wallet-core/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

fn to_owned(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|u| u.to_string()).collect()
}

impl GatewayConfig {
    /// Parse a TOML document, filling missing fields with defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, GatewayError> {
        let config: Self = toml::from_str(s).map_err(|e| GatewayError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the provider ring for one network.
    pub fn with_providers(mut self, network: BtcNetwork, providers: Vec<String>) -> Self {
        match network {
            BtcNetwork::Mainnet => self.mainnet_providers = providers,
            BtcNetwork::Testnet => self.testnet_providers = providers,
        }
        self
    }

    pub fn providers(&self, network: BtcNetwork) -> &[String] {
        match network {
            BtcNetwork::Mainnet => &self.mainnet_providers,
            BtcNetwork::Testnet => &self.testnet_providers,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn stale_max_age(&self) -> Duration {
        Duration::from_millis(self.stale_max_age_ms)
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        for network in [BtcNetwork::Mainnet, BtcNetwork::Testnet] {
            let providers = self.providers(network);
            if providers.is_empty() {
                return Err(GatewayError::Config(format!("no {network} providers configured")));
            }
            if let Some(bad) = providers
                .iter()
                .find(|u| !(u.starts_with("http://") || u.starts_with("https://")))
            {
                return Err(GatewayError::Config(format!("provider URL must be http(s): {bad}")));
            }
        }
        if self.request_timeout_ms == 0 {
            return Err(GatewayError::Config("request timeout must be positive".into()));
        }
        if self.stale_max_age_ms < self.cache_ttl_ms {
            return Err(GatewayError::Config(
                "stale_max_age_ms must not be shorter than cache_ttl_ms".into(),
            ));
        }
        Ok(())
    }
}
