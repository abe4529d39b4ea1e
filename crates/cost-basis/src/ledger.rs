use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LedgerError;
use crate::lot::{AverageLots, CostBasisLot, CostBasisMethod, LOT_EPSILON};

const SNAPSHOT_VERSION: u32 = 1;

/// Txid recorded on the lot that pooled average-cost holdings collapse into.
pub const POOLED_LOT_TXID: &str = "average-pool";

/// Proceeds minus consumed cost.
pub fn realized_gain_loss(proceeds_usd: f64, consumed_cost_usd: f64) -> f64 {
    proceeds_usd - consumed_cost_usd
}

/// Outcome of one disposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisposalResult {
    pub txid: String,
    pub method: CostBasisMethod,
    /// BTC disposed of, as requested.
    pub amount: f64,
    /// BTC matched against held lots.
    pub matched_amount: f64,
    /// BTC beyond holdings, treated as zero basis.
    pub unmatched_amount: f64,
    /// Cost basis of the matched amount.
    pub consumed_cost: f64,
    /// `amount × price`.
    pub proceeds: f64,
    pub realized_gain: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_held: f64,
    pub total_cost: f64,
    pub current_value: f64,
    pub unrealized_pnl: f64,
    /// Cost per BTC held; zero when nothing is held.
    pub average_cost: f64,
    pub lot_count: usize,
    pub realized_pnl: f64,
}

/// Serializable ledger state. Totals are derived from `lots` on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: u32,
    pub method: CostBasisMethod,
    pub average_lots: AverageLots,
    pub lots: VecDeque<CostBasisLot>,
    pub realized_pnl: f64,
}

/// Acquisition lots plus running totals.
///
/// Lots are kept in consumption order: FIFO appends new lots at the back,
/// LIFO pushes them to the front, and disposals always walk front to back.
/// `total_held` and `total_cost` always equal the sums over remaining lots.
#[derive(Debug, Clone, PartialEq)]
pub struct CostBasisLedger {
    method: CostBasisMethod,
    average_lots: AverageLots,
    lots: VecDeque<CostBasisLot>,
    total_held: f64,
    total_cost: f64,
    realized_pnl: f64,
}

impl Default for CostBasisLedger {
    fn default() -> Self {
        Self::new(CostBasisMethod::default())
    }
}

impl CostBasisLedger {
    pub fn new(method: CostBasisMethod) -> Self {
        Self {
            method,
            average_lots: AverageLots::default(),
            lots: VecDeque::new(),
            total_held: 0.0,
            total_cost: 0.0,
            realized_pnl: 0.0,
        }
    }

    pub fn with_average_lots(mut self, mode: AverageLots) -> Self {
        self.average_lots = mode;
        self
    }

    pub fn method(&self) -> CostBasisMethod {
        self.method
    }

    pub fn average_lots(&self) -> AverageLots {
        self.average_lots
    }

    pub fn lots(&self) -> impl Iterator<Item = &CostBasisLot> {
        self.lots.iter()
    }

    pub fn lot_count(&self) -> usize {
        self.lots.len()
    }

    pub fn total_held(&self) -> f64 {
        self.total_held
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    /// Change method. Moving to FIFO or LIFO re-sorts lots by acquisition
    /// date so the front-to-back walk matches the new method.
    pub fn set_method(&mut self, method: CostBasisMethod) {
        if method == self.method {
            return;
        }
        let lots = self.lots.make_contiguous();
        match method {
            CostBasisMethod::Fifo => lots.sort_by_key(|lot| lot.acquisition_date),
            CostBasisMethod::Lifo => {
                lots.sort_by_key(|lot| std::cmp::Reverse(lot.acquisition_date))
            }
            CostBasisMethod::Average => {}
        }
        debug!(from = %self.method, to = %method, "cost basis method changed");
        self.method = method;
    }

    pub fn record_acquisition(
        &mut self,
        txid: &str,
        amount_btc: f64,
        price_usd: f64,
        timestamp: u64,
    ) -> Result<(), LedgerError> {
        check_amount(amount_btc)?;
        check_price(price_usd)?;

        let lot = CostBasisLot::new(txid, amount_btc, price_usd, timestamp);
        self.total_held += lot.remaining_amount;
        self.total_cost += lot.acquisition_cost;
        match self.method {
            CostBasisMethod::Lifo => self.lots.push_front(lot),
            CostBasisMethod::Fifo | CostBasisMethod::Average => self.lots.push_back(lot),
        }
        debug!(%txid, amount_btc, price_usd, "lot acquired");
        Ok(())
    }

    /// Consume holdings and return the realized result. An amount beyond
    /// current holdings is matched as far as possible; the rest is reported
    /// as `unmatched_amount` with zero basis.
    pub fn record_disposal(
        &mut self,
        txid: &str,
        amount_btc: f64,
        price_usd: f64,
        timestamp: u64,
    ) -> Result<DisposalResult, LedgerError> {
        check_amount(amount_btc)?;
        check_price(price_usd)?;

        let matched = amount_btc.min(self.total_held).max(0.0);
        let mut unmatched = amount_btc - matched;
        if unmatched < LOT_EPSILON {
            unmatched = 0.0;
        }

        let consumed_cost = match self.method {
            CostBasisMethod::Fifo | CostBasisMethod::Lifo => self.consume_in_order(matched),
            CostBasisMethod::Average => self.consume_average(matched, timestamp),
        };
        self.lots.retain(|lot| !lot.is_exhausted());
        self.recompute_totals();

        let proceeds = amount_btc * price_usd;
        let realized_gain = realized_gain_loss(proceeds, consumed_cost);
        self.realized_pnl += realized_gain;

        debug!(%txid, amount_btc, consumed_cost, realized_gain, "lot disposal");
        Ok(DisposalResult {
            txid: txid.to_string(),
            method: self.method,
            amount: amount_btc,
            matched_amount: matched,
            unmatched_amount: unmatched,
            consumed_cost,
            proceeds,
            realized_gain,
        })
    }

    pub fn portfolio_summary(&self, current_price_usd: f64) -> PortfolioSummary {
        let current_value = self.total_held * current_price_usd;
        PortfolioSummary {
            total_held: self.total_held,
            total_cost: self.total_cost,
            current_value,
            unrealized_pnl: current_value - self.total_cost,
            average_cost: if self.total_held >= LOT_EPSILON {
                self.total_cost / self.total_held
            } else {
                0.0
            },
            lot_count: self.lots.len(),
            realized_pnl: self.realized_pnl,
        }
    }

    /// Serialize lots, method and realized P&L to an opaque JSON blob.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            version: SNAPSHOT_VERSION,
            method: self.method,
            average_lots: self.average_lots,
            lots: self.lots.clone(),
            realized_pnl: self.realized_pnl,
        }
    }

    /// Restore from a snapshot, rejecting unknown versions and corrupt lots.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, LedgerError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(LedgerError::Snapshot(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        if let Some(bad) = snapshot
            .lots
            .iter()
            .find(|lot| !lot.remaining_amount.is_finite() || lot.remaining_amount < 0.0)
        {
            return Err(LedgerError::Snapshot(format!("corrupt lot {}", bad.txid)));
        }

        let mut ledger = Self {
            method: snapshot.method,
            average_lots: snapshot.average_lots,
            lots: snapshot.lots,
            total_held: 0.0,
            total_cost: 0.0,
            realized_pnl: snapshot.realized_pnl,
        };
        ledger.recompute_totals();
        Ok(ledger)
    }

    pub fn to_blob(&self) -> Result<String, LedgerError> {
        serde_json::to_string(&self.snapshot()).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    pub fn from_blob(blob: &str) -> Result<Self, LedgerError> {
        let snapshot: LedgerSnapshot =
            serde_json::from_str(blob).map_err(|e| LedgerError::Snapshot(e.to_string()))?;
        Self::from_snapshot(snapshot)
    }

    fn consume_in_order(&mut self, amount: f64) -> f64 {
        let mut left = amount;
        let mut cost = 0.0;
        for lot in self.lots.iter_mut() {
            if left < LOT_EPSILON {
                break;
            }
            let take = lot.remaining_amount.min(left);
            lot.remaining_amount -= take;
            cost += take * lot.acquisition_price;
            left -= take;
        }
        cost
    }

    fn consume_average(&mut self, amount: f64, timestamp: u64) -> f64 {
        if self.total_held < LOT_EPSILON {
            return 0.0;
        }
        let average_price = self.total_cost / self.total_held;
        let consumed = amount * average_price;
        let left = self.total_held - amount;

        match self.average_lots {
            AverageLots::Pooled => {
                let since = self
                    .lots
                    .iter()
                    .map(|lot| lot.acquisition_date)
                    .min()
                    .unwrap_or(timestamp);
                self.lots.clear();
                if left >= LOT_EPSILON {
                    self.lots
                        .push_back(CostBasisLot::new(POOLED_LOT_TXID, left, average_price, since));
                }
            }
            AverageLots::Proportional => {
                let keep = left / self.total_held;
                for lot in self.lots.iter_mut() {
                    lot.remaining_amount *= keep;
                }
            }
        }
        consumed
    }

    fn recompute_totals(&mut self) {
        self.total_held = self.lots.iter().map(|lot| lot.remaining_amount).sum();
        self.total_cost = self.lots.iter().map(CostBasisLot::remaining_cost).sum();
    }
}

fn check_amount(amount: f64) -> Result<(), LedgerError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

fn check_price(price: f64) -> Result<(), LedgerError> {
    if !price.is_finite() || price < 0.0 {
        return Err(LedgerError::InvalidPrice(price));
    }
    Ok(())
}
