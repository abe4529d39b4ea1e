use async_trait::async_trait;
use chain_btc::network::BtcNetwork;
use chain_btc::utxo::Utxo;

use crate::error::GatewayError;
use crate::gateway::ChainDataGateway;
use crate::types::{Balance, EnhancedTransaction, FeeEstimates, Fetched, TxStatus};

/// Chain data consumed by the send flow and wallet refresh.
///
/// [`ChainDataGateway`] is the production implementation; tests substitute
/// in-memory sources.
#[async_trait]
pub trait ChainDataSource: Send + Sync {
    fn network(&self) -> BtcNetwork;

    async fn balance(&self, address: &str) -> Fetched<Balance>;

    async fn transactions(&self, address: &str) -> Fetched<Vec<EnhancedTransaction>>;

    async fn utxos(&self, address: &str) -> Fetched<Vec<Utxo>>;

    async fn fee_estimates(&self) -> Fetched<FeeEstimates>;

    async fn broadcast(&self, raw_tx_hex: &str) -> Result<String, GatewayError>;

    async fn tx_status(&self, txid: &str) -> Result<Option<TxStatus>, GatewayError>;
}

#[async_trait]
impl ChainDataSource for ChainDataGateway {
    fn network(&self) -> BtcNetwork {
        ChainDataGateway::network(self)
    }

    async fn balance(&self, address: &str) -> Fetched<Balance> {
        self.get_balance(address).await
    }

    async fn transactions(&self, address: &str) -> Fetched<Vec<EnhancedTransaction>> {
        self.get_transactions(address).await
    }

    async fn utxos(&self, address: &str) -> Fetched<Vec<Utxo>> {
        self.get_utxos(address).await
    }

    async fn fee_estimates(&self) -> Fetched<FeeEstimates> {
        self.get_fee_estimates().await
    }

    async fn broadcast(&self, raw_tx_hex: &str) -> Result<String, GatewayError> {
        ChainDataGateway::broadcast(self, raw_tx_hex).await
    }

    async fn tx_status(&self, txid: &str) -> Result<Option<TxStatus>, GatewayError> {
        self.get_tx_status(txid).await
    }
}
