//! Short-lived response cache shared by gateways.

use std::time::{Duration, Instant};

use chain_btc::network::BtcNetwork;
use dashmap::DashMap;
use serde_json::Value;

/// Cache key: one entry per network, endpoint and parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub network: BtcNetwork,
    pub endpoint: &'static str,
    pub params: String,
}

impl CacheKey {
    pub fn new(network: BtcNetwork, endpoint: &'static str, params: impl Into<String>) -> Self {
        Self {
            network,
            endpoint,
            params: params.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}

/// How long an expired entry may still be served as stale data.
pub const DEFAULT_MAX_STALE: Duration = Duration::from_secs(24 * 60 * 60);

/// Raw provider responses keyed by [`CacheKey`].
///
/// Expired entries are kept, not evicted on read: when every provider fails,
/// the gateway serves them as stale data until they pass `max_stale`. Each
/// insert drops entries past that horizon, so the map holds at most one
/// entry per (network, endpoint, params) seen within it. Entries are
/// replaced wholesale on insert, never mutated in place.
#[derive(Debug)]
pub struct ResponseCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
    max_stale: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_stale: DEFAULT_MAX_STALE.max(ttl),
        }
    }

    /// Set the stale horizon. Never shorter than the TTL.
    pub fn with_max_stale(mut self, max_stale: Duration) -> Self {
        self.max_stale = max_stale.max(self.ttl);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_stale(&self) -> Duration {
        self.max_stale
    }

    /// Entry younger than the TTL.
    pub fn get_fresh(&self, key: &CacheKey) -> Option<Value> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(self.ttl))
            .map(|entry| entry.value.clone())
    }

    /// Entry within the stale horizon, with its age.
    pub fn get_any(&self, key: &CacheKey) -> Option<(Value, Duration)> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(self.max_stale))
            .map(|entry| (entry.value.clone(), entry.stored_at.elapsed()))
    }

    pub fn insert(&self, key: CacheKey, value: Value) {
        self.purge_older_than(self.max_stale);
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn remove(&self, key: &CacheKey) {
        self.entries.remove(key);
    }

    /// Drop entries older than `max_age`. Returns how many were removed.
    pub fn purge_older_than(&self, max_age: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(max_age));
        before - self.entries.len()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(params: &str) -> CacheKey {
        CacheKey::new(BtcNetwork::Testnet, "address", params)
    }

    #[test]
    fn fresh_hit() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert(key("a"), json!({"x": 1}));
        assert_eq!(cache.get_fresh(&key("a")), Some(json!({"x": 1})));
        assert!(cache.get_fresh(&key("b")).is_none());
    }

    #[test]
    fn expired_entry_is_not_fresh_but_still_available() {
        let cache = ResponseCache::new(Duration::ZERO);
        cache.insert(key("a"), json!(42));
        assert!(cache.get_fresh(&key("a")).is_none());
        let (value, _age) = cache.get_any(&key("a")).unwrap();
        assert_eq!(value, json!(42));
    }

    #[test]
    fn keys_are_network_scoped() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert(key("a"), json!(1));
        let mainnet = CacheKey::new(BtcNetwork::Mainnet, "address", "a");
        assert!(cache.get_fresh(&mainnet).is_none());
    }

    #[test]
    fn insert_replaces() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert(key("a"), json!(1));
        cache.insert(key("a"), json!(2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_fresh(&key("a")), Some(json!(2)));
    }

    #[test]
    fn entries_past_stale_horizon_are_dropped() {
        let cache = ResponseCache::new(Duration::ZERO).with_max_stale(Duration::from_millis(20));
        cache.insert(key("a"), json!(1));
        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get_any(&key("a")).is_none());

        cache.insert(key("b"), json!(2));
        assert_eq!(cache.len(), 1);
        assert!(cache.get_any(&key("b")).is_some());
    }

    #[test]
    fn stale_horizon_never_below_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(60)).with_max_stale(Duration::ZERO);
        assert_eq!(cache.max_stale(), Duration::from_secs(60));
        assert_eq!(ResponseCache::default().max_stale(), DEFAULT_MAX_STALE);
    }

    #[test]
    fn purge() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert(key("a"), json!(1));
        cache.insert(key("b"), json!(2));
        assert_eq!(cache.purge_older_than(Duration::from_secs(60)), 0);
        assert_eq!(cache.purge_older_than(Duration::ZERO), 2);
        assert!(cache.is_empty());
    }
}
