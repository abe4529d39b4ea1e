use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Remaining amounts below this are treated as fully consumed.
pub const LOT_EPSILON: f64 = 1e-8;

/// Lot consumption method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostBasisMethod {
    #[default]
    Fifo,
    Lifo,
    Average,
}

impl std::fmt::Display for CostBasisMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostBasisMethod::Fifo => write!(f, "fifo"),
            CostBasisMethod::Lifo => write!(f, "lifo"),
            CostBasisMethod::Average => write!(f, "average"),
        }
    }
}

impl FromStr for CostBasisMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" => Ok(CostBasisMethod::Fifo),
            "lifo" => Ok(CostBasisMethod::Lifo),
            "average" | "avg" => Ok(CostBasisMethod::Average),
            other => Err(format!("unknown cost basis method: {other}")),
        }
    }
}

/// How lots are kept under [`CostBasisMethod::Average`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AverageLots {
    /// A disposal collapses all holdings into one lot at the average price.
    #[default]
    Pooled,
    /// Every lot shrinks by the disposal's share of holdings and keeps its
    /// own price and date.
    Proportional,
}

/// One acquisition and whatever is left of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBasisLot {
    pub txid: String,
    /// BTC acquired.
    pub amount: f64,
    /// USD per BTC at acquisition.
    pub acquisition_price: f64,
    /// `amount × acquisition_price`.
    pub acquisition_cost: f64,
    /// Unix seconds.
    pub acquisition_date: u64,
    pub remaining_amount: f64,
}

impl CostBasisLot {
    pub fn new(txid: impl Into<String>, amount: f64, price: f64, date: u64) -> Self {
        Self {
            txid: txid.into(),
            amount,
            acquisition_price: price,
            acquisition_cost: amount * price,
            acquisition_date: date,
            remaining_amount: amount,
        }
    }

    pub fn remaining_cost(&self) -> f64 {
        self.remaining_amount * self.acquisition_price
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_amount < LOT_EPSILON
    }
}
