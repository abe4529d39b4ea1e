//! Rebuilding a ledger from normalized transaction history.

use chain_data::{CostBasisData, EnhancedTransaction, TxDirection};
use tracing::{info, warn};

use crate::error::LedgerError;
use crate::ledger::CostBasisLedger;
use crate::lot::CostBasisMethod;

const SATS_PER_BTC: f64 = 100_000_000.0;

/// Historical BTC/USD price source.
pub trait PriceOracle {
    /// USD per BTC at `timestamp` (unix seconds).
    fn price_at(&self, timestamp: u64) -> Option<f64>;
}

impl<F> PriceOracle for F
where
    F: Fn(u64) -> Option<f64>,
{
    fn price_at(&self, timestamp: u64) -> Option<f64> {
        self(timestamp)
    }
}

/// The same price at every timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FlatPrice(pub f64);

impl PriceOracle for FlatPrice {
    fn price_at(&self, _timestamp: u64) -> Option<f64> {
        Some(self.0)
    }
}

/// Replay confirmed history oldest-first into a fresh ledger and attach a
/// [`CostBasisData`] to each replayed transaction.
///
/// Received transactions become acquisitions of the received amount. Sent
/// transactions dispose of everything that left the address including the
/// fee. Self-transfers dispose of the fee only. Unconfirmed transactions are
/// left untouched.
pub fn rebuild_from_history(
    method: CostBasisMethod,
    transactions: &mut [EnhancedTransaction],
    oracle: &dyn PriceOracle,
) -> Result<CostBasisLedger, LedgerError> {
    let mut ledger = CostBasisLedger::new(method);

    let mut order: Vec<usize> = (0..transactions.len())
        .filter(|&i| transactions[i].confirmed)
        .collect();
    order.sort_by_key(|&i| {
        let tx = &transactions[i];
        (tx.timestamp.unwrap_or(u64::MAX), tx.block_height.unwrap_or(u32::MAX))
    });

    for i in order {
        let tx = &mut transactions[i];
        let Some(timestamp) = tx.timestamp else {
            warn!(txid = %tx.txid, "confirmed transaction without block time, skipping");
            continue;
        };
        let price = oracle
            .price_at(timestamp)
            .ok_or_else(|| LedgerError::MissingPrice {
                txid: tx.txid.clone(),
                timestamp,
            })?;

        let sats = match tx.direction {
            TxDirection::Received => tx.amount,
            TxDirection::Sent => tx.net_amount.unsigned_abs(),
            TxDirection::SelfTransfer => tx.fee,
        };
        if sats == 0 {
            continue;
        }
        let amount = sats as f64 / SATS_PER_BTC;

        tx.cost_basis = Some(match tx.direction {
            TxDirection::Received => {
                ledger.record_acquisition(&tx.txid, amount, price, timestamp)?;
                CostBasisData {
                    price_usd: price,
                    value_usd: amount * price,
                    cost_basis_usd: Some(amount * price),
                    realized_gain_usd: None,
                }
            }
            TxDirection::Sent | TxDirection::SelfTransfer => {
                let result = ledger.record_disposal(&tx.txid, amount, price, timestamp)?;
                CostBasisData {
                    price_usd: price,
                    value_usd: result.proceeds,
                    cost_basis_usd: Some(result.consumed_cost),
                    realized_gain_usd: Some(result.realized_gain),
                }
            }
        });
    }

    info!(
        %method,
        lots = ledger.lot_count(),
        held = ledger.total_held(),
        "cost basis ledger rebuilt from history"
    );
    Ok(ledger)
}

/// Restore a saved ledger, or rebuild from history when there is no usable
/// blob.
pub fn load_or_rebuild(
    blob: Option<&str>,
    method: CostBasisMethod,
    transactions: &mut [EnhancedTransaction],
    oracle: &dyn PriceOracle,
) -> Result<CostBasisLedger, LedgerError> {
    if let Some(blob) = blob {
        match CostBasisLedger::from_blob(blob) {
            Ok(mut ledger) => {
                ledger.set_method(method);
                return Ok(ledger);
            }
            Err(e) => warn!(error = %e, "saved ledger unreadable, rebuilding from history"),
        }
    }
    rebuild_from_history(method, transactions, oracle)
}
