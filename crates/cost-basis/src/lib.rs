//! Tax-lot accounting for a single-asset BTC portfolio.
//!
//! Acquisitions create lots; disposals consume them first-in-first-out,
//! last-in-first-out or at pooled average cost. The ledger reports realized
//! gain per disposal and an unrealized position at any price.

pub mod error;
pub mod history;
pub mod ledger;
pub mod lot;

pub use error::LedgerError;
pub use history::{load_or_rebuild, rebuild_from_history, FlatPrice, PriceOracle};
pub use ledger::{
    realized_gain_loss, CostBasisLedger, DisposalResult, LedgerSnapshot, PortfolioSummary,
};
pub use lot::{AverageLots, CostBasisLot, CostBasisMethod, LOT_EPSILON};
