//! Backtest output.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{PositionIntent, SignalStatus, Trade};
use crate::metrics::Metrics;

/// Everything one simulated run produced. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub strategy: String,
    pub dates: Vec<NaiveDate>,
    /// Intents as produced by the provider, one per bar.
    pub signals: Vec<PositionIntent>,
    pub period_returns: Vec<f64>,
    pub equity_curve: Vec<f64>,
    pub drawdown_curve: Vec<f64>,
    pub trades: Vec<Trade>,
    pub metrics: Metrics,
    pub initial_capital: f64,
    pub signal_status: SignalStatus,
    /// Per-constituent runs; only populated for composite providers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constituents: BTreeMap<String, BacktestResult>,
}

impl BacktestResult {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .copied()
            .unwrap_or(self.initial_capital)
    }

    /// Raw -1/0/1 position values.
    pub fn positions(&self) -> Vec<i8> {
        self.signals.iter().map(|s| s.value()).collect()
    }

    pub fn total_cost(&self) -> f64 {
        self.trades.iter().map(|t| t.cost).sum()
    }

    pub fn with_constituents(mut self, constituents: BTreeMap<String, BacktestResult>) -> Self {
        self.constituents = constituents;
        self
    }
}
