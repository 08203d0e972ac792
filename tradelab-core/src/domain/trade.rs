//! Trade: one entry in the append-only trade ledger of a run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Buy opens a position, sell closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// A single buy or sell event at a bar close.
///
/// Serializes in the export shape: `{date, type, price, size, profit, cost}`
/// with an ISO date and `profit: null` on buys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub side: TradeSide,
    pub price: f64,
    pub size: f64,
    /// `(sell - buy) * size`, present only on a sell that closes a buy.
    #[serde(rename = "profit")]
    pub realized_profit: Option<f64>,
    /// Transaction cost attributed to this trade. Informational only.
    #[serde(default)]
    pub cost: f64,
}

impl Trade {
    pub fn buy(date: NaiveDate, price: f64, size: f64, cost: f64) -> Self {
        Self {
            date,
            side: TradeSide::Buy,
            price,
            size,
            realized_profit: None,
            cost,
        }
    }

    pub fn sell(date: NaiveDate, price: f64, size: f64, entry_price: f64, cost: f64) -> Self {
        Self {
            date,
            side: TradeSide::Sell,
            price,
            size,
            realized_profit: Some((price - entry_price) * size),
            cost,
        }
    }

    pub fn is_sell(&self) -> bool {
        self.side == TradeSide::Sell
    }

    /// Notional value of the trade.
    pub fn value(&self) -> f64 {
        self.price * self.size
    }
}
