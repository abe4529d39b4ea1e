use chain_data::{ChainDataSource, Freshness};
use cost_basis::{rebuild_from_history, CostBasisLedger, CostBasisMethod, PortfolioSummary, PriceOracle};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::WalletError;
use crate::types::WalletRecord;

/// Result of refreshing one wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReport {
    pub wallet_id: String,
    /// Least fresh of the balance and history reads.
    pub freshness: Freshness,
    /// Whether the record was overwritten.
    pub updated: bool,
}

fn least_fresh(a: Freshness, b: Freshness) -> Freshness {
    let rank = |f: Freshness| match f {
        Freshness::Live => 0,
        Freshness::Cached => 1,
        Freshness::Stale => 2,
        Freshness::Fallback => 3,
    };
    if rank(a) >= rank(b) {
        a
    } else {
        b
    }
}

/// Fetch balance and history for every wallet concurrently and write them
/// into the records. Wallets on another network are skipped. A wallet whose
/// reads fell back to defaults keeps its previous data.
pub async fn refresh_wallets<S>(source: &S, records: &mut [WalletRecord]) -> Vec<RefreshReport>
where
    S: ChainDataSource + ?Sized,
{
    let network = source.network();
    let fetches = records.iter().map(|record| {
        let address = record.address.clone();
        let on_network = record.network == network;
        async move {
            if !on_network {
                return None;
            }
            let balance = source.balance(&address).await;
            let history = source.transactions(&address).await;
            Some((balance, history))
        }
    });
    let results = join_all(fetches).await;

    records
        .iter_mut()
        .zip(results)
        .map(|(record, result)| {
            let Some((balance, history)) = result else {
                warn!(wallet = %record.id, network = %record.network, "wallet not on gateway network, skipped");
                return RefreshReport {
                    wallet_id: record.id.clone(),
                    freshness: Freshness::Fallback,
                    updated: false,
                };
            };

            let freshness = least_fresh(balance.freshness, history.freshness);
            let updated = freshness != Freshness::Fallback;
            if updated {
                record.balance = balance.value;
                record.transactions = history.value;
            }
            debug!(wallet = %record.id, ?freshness, updated, "wallet refreshed");
            RefreshReport {
                wallet_id: record.id.clone(),
                freshness,
                updated,
            }
        })
        .collect()
}

/// Rebuild the cost basis ledger from a wallet's stored history, annotate
/// its transactions and summarize at `current_price`.
pub fn portfolio(
    record: &mut WalletRecord,
    method: CostBasisMethod,
    oracle: &dyn PriceOracle,
    current_price: f64,
) -> Result<(CostBasisLedger, PortfolioSummary), WalletError> {
    let ledger = rebuild_from_history(method, &mut record.transactions, oracle)?;
    let summary = ledger.portfolio_summary(current_price);
    Ok((ledger, summary))
}
