//! Redundant Esplora-compatible chain data access.
//!
//! [`ChainDataGateway`] queries an ordered ring of REST providers, remembers
//! the last one that answered, caches responses for a short TTL, and degrades
//! reads to stale cache or safe defaults when every provider fails. Broadcasts
//! never degrade.

pub mod cache;
pub mod config;
pub mod error;
pub mod esplora;
pub mod gateway;
pub mod source;
pub mod types;

pub use cache::ResponseCache;
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway::ChainDataGateway;
pub use source::ChainDataSource;
pub use types::{
    Balance, CostBasisData, EnhancedTransaction, FeeEstimates, Fetched, Freshness, TxDirection,
    TxParticipant, TxStatus,
};
