//! Position sizing.
//!
//! Base size risks a fixed fraction of capital between entry and stop:
//! `size = capital × risk_per_trade / |entry - stop|`, optionally scaled by
//! the Kelly edge `f* = (p × rr - (1 - p)) / rr` times a Kelly fraction.
//! Sizes are floored to whole units.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Inputs to the Kelly adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KellyParams {
    pub win_rate: f64,
    pub risk_reward: f64,
    /// Fraction of full Kelly to bet (0.5 = half Kelly).
    pub fraction: f64,
}

impl KellyParams {
    /// Full-Kelly edge; non-positive means no bet.
    pub fn edge(&self) -> f64 {
        if self.risk_reward <= 0.0 {
            return 0.0;
        }
        (self.win_rate * self.risk_reward - (1.0 - self.win_rate)) / self.risk_reward
    }
}

impl Default for KellyParams {
    fn default() -> Self {
        Self {
            win_rate: 0.5,
            risk_reward: 2.0,
            fraction: 0.5,
        }
    }
}

/// Result of a sizing request. `size == 0` always carries a reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeDecision {
    pub size: f64,
    pub value: f64,
    pub risk_amount: f64,
    pub reason: Option<String>,
}

impl SizeDecision {
    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            size: 0.0,
            value: 0.0,
            risk_amount: 0.0,
            reason: Some(reason.into()),
        }
    }
}

fn risk_budget_size(
    capital: f64,
    risk_per_trade: f64,
    entry: f64,
    stop: f64,
    kelly: Option<KellyParams>,
) -> SizeDecision {
    let risk_amount = capital * risk_per_trade;
    let stop_distance = (entry - stop).abs();
    if stop_distance == 0.0 || !stop_distance.is_finite() {
        return SizeDecision::rejected("stop distance is zero");
    }

    let mut raw = risk_amount / stop_distance;
    if let Some(k) = kelly {
        let edge = k.edge();
        if edge <= 0.0 {
            return SizeDecision::rejected(format!("non-positive Kelly edge {edge:.4}"));
        }
        raw *= edge * k.fraction;
    }

    let size = raw.floor().max(0.0);
    if size == 0.0 {
        return SizeDecision::rejected("risk budget buys less than one unit");
    }
    SizeDecision {
        size,
        value: size * entry,
        risk_amount,
        reason: None,
    }
}

// ─── Stateless policy (simulator) ───────────────────────────────────

/// Sizing rule evaluated by the simulator at each buy bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SizingPolicy {
    /// Always trade the same number of units.
    Fixed { units: f64 },
    /// Risk a fraction of current equity against a percentage stop below entry.
    RiskBudget {
        risk_per_trade: f64,
        stop_loss_pct: f64,
        #[serde(default)]
        kelly: Option<KellyParams>,
    },
}

impl SizingPolicy {
    pub fn size(&self, capital: f64, entry: f64) -> f64 {
        match *self {
            Self::Fixed { units } => units.max(0.0),
            Self::RiskBudget {
                risk_per_trade,
                stop_loss_pct,
                kelly,
            } => {
                let stop = entry * (1.0 - stop_loss_pct);
                risk_budget_size(capital, risk_per_trade, entry, stop, kelly).size
            }
        }
    }
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self::Fixed { units: 1.0 }
    }
}

// ─── Stateful sizer (callers managing several positions) ────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub size: f64,
    pub entry_price: f64,
    pub value: f64,
}

/// Capital and open-position bookkeeping around [`risk_budget_size`].
///
/// Not internally synchronized: share across threads behind a lock.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    pub initial_capital: f64,
    current_capital: f64,
    pub risk_per_trade: f64,
    pub max_trades: usize,
    pub kelly_fraction: f64,
    open_positions: BTreeMap<String, OpenPosition>,
}

impl PositionSizer {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            current_capital: initial_capital,
            risk_per_trade: 0.02,
            max_trades: 5,
            kelly_fraction: 0.5,
            open_positions: BTreeMap::new(),
        }
    }

    pub fn with_risk_per_trade(mut self, risk_per_trade: f64) -> Self {
        self.risk_per_trade = risk_per_trade;
        self
    }

    pub fn with_max_trades(mut self, max_trades: usize) -> Self {
        self.max_trades = max_trades;
        self
    }

    pub fn with_kelly_fraction(mut self, kelly_fraction: f64) -> Self {
        self.kelly_fraction = kelly_fraction;
        self
    }

    pub fn calculate_position_size(
        &self,
        price: f64,
        stop_loss: f64,
        win_rate: f64,
        risk_reward: f64,
    ) -> SizeDecision {
        if self.open_positions.len() >= self.max_trades {
            return SizeDecision::rejected(format!(
                "max open positions reached ({})",
                self.max_trades
            ));
        }
        let kelly = KellyParams {
            win_rate,
            risk_reward,
            fraction: self.kelly_fraction,
        };
        risk_budget_size(
            self.current_capital,
            self.risk_per_trade,
            price,
            stop_loss,
            Some(kelly),
        )
    }

    pub fn update_capital(&mut self, pnl: f64) {
        self.current_capital += pnl;
    }

    pub fn current_capital(&self) -> f64 {
        self.current_capital
    }

    pub fn add_position(&mut self, symbol: impl Into<String>, size: f64, price: f64) {
        self.open_positions.insert(
            symbol.into(),
            OpenPosition {
                size,
                entry_price: price,
                value: size * price,
            },
        );
    }

    pub fn remove_position(&mut self, symbol: &str) -> Option<OpenPosition> {
        self.open_positions.remove(symbol)
    }

    pub fn open_positions(&self) -> &BTreeMap<String, OpenPosition> {
        &self.open_positions
    }
}
