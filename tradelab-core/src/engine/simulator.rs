//! Trade simulator: walks an intent series against close prices.
//!
//! Per bar t >= 1:
//! 1. `period_return[t] = (close[t] / close[t-1] - 1) * intent[t-1]`
//! 2. On an intent change, +1 while flat opens a buy at close[t] and -1 while
//!    long closes it with a sell. Every other transition is a no-op.
//! 3. `equity[t] = initial_capital * prod(1 + period_return[..=t])`
//!
//! `period_return[0]` is 0, so `equity[0]` is the initial capital.

use serde::{Deserialize, Serialize};

use crate::domain::{IntentSeries, PositionIntent, PriceSeries, Trade, TradeSide};
use crate::error::BacktestError;
use crate::metrics::{drawdown_curve, finite_or_zero, PerformanceEvaluator};
use crate::risk::{CostSchedule, SizingPolicy};

use super::result::BacktestResult;

/// Configuration for a single simulated run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub initial_capital: f64,
    pub risk_free_rate: f64,
    /// Fees attributed to each trade's `cost`. Informational only.
    #[serde(default)]
    pub cost_schedule: CostSchedule,
    #[serde(default)]
    pub sizing: SizingPolicy,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            risk_free_rate: 0.02,
            cost_schedule: CostSchedule::default(),
            sizing: SizingPolicy::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn with_initial_capital(mut self, initial_capital: f64) -> Self {
        self.initial_capital = initial_capital;
        self
    }

    pub fn with_cost_schedule(mut self, cost_schedule: CostSchedule) -> Self {
        self.cost_schedule = cost_schedule;
        self
    }

    pub fn with_sizing(mut self, sizing: SizingPolicy) -> Self {
        self.sizing = sizing;
        self
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(BacktestError::InvalidInput(format!(
                "initial capital must be positive and finite, got {}",
                self.initial_capital
            )));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(BacktestError::InvalidInput(
                "risk-free rate must be finite".into(),
            ));
        }
        Ok(())
    }
}

/// Converts intents into trades, equity, and metrics.
#[derive(Debug, Clone, Default)]
pub struct TradeSimulator {
    config: SimulatorConfig,
    evaluator: PerformanceEvaluator,
}

/// The one open long, if any.
struct OpenLong {
    price: f64,
    size: f64,
}

impl TradeSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            evaluator: PerformanceEvaluator,
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn run(
        &self,
        strategy: &str,
        series: &PriceSeries,
        signals: &IntentSeries,
    ) -> Result<BacktestResult, BacktestError> {
        self.config.validate()?;
        if series.is_empty() {
            return Err(BacktestError::InvalidInput("empty price series".into()));
        }
        if signals.len() != series.len() {
            return Err(BacktestError::InvalidInput(format!(
                "{} intents for a {}-bar series",
                signals.len(),
                series.len()
            )));
        }

        let bars = series.bars();
        let intents = &signals.intents;
        let n = bars.len();
        let capital = self.config.initial_capital;

        let mut period_returns = Vec::with_capacity(n);
        let mut equity_curve = Vec::with_capacity(n);
        let mut trades = Vec::new();
        let mut open: Option<OpenLong> = None;

        period_returns.push(0.0);
        equity_curve.push(capital);

        for t in 1..n {
            let (prev, curr) = (&bars[t - 1], &bars[t]);
            let price_change = curr.close / prev.close - 1.0;
            let r = finite_or_zero(price_change * intents[t - 1].as_f64());
            let equity = equity_curve[t - 1] * (1.0 + r);
            period_returns.push(r);
            equity_curve.push(equity);

            if intents[t] == intents[t - 1] {
                continue;
            }
            match (intents[t], open.as_ref()) {
                (PositionIntent::Long, None) => {
                    let size = self.config.sizing.size(equity, curr.close);
                    if size <= 0.0 {
                        tracing::debug!(bar = t, "sizing returned zero, buy suppressed");
                        continue;
                    }
                    let cost = self
                        .config
                        .cost_schedule
                        .cost(TradeSide::Buy, curr.close, size)
                        .total;
                    trades.push(Trade::buy(curr.date, curr.close, size, cost));
                    open = Some(OpenLong {
                        price: curr.close,
                        size,
                    });
                }
                (PositionIntent::Short, Some(long)) => {
                    let cost = self
                        .config
                        .cost_schedule
                        .cost(TradeSide::Sell, curr.close, long.size)
                        .total;
                    trades.push(Trade::sell(curr.date, curr.close, long.size, long.price, cost));
                    open = None;
                }
                _ => {}
            }
        }

        let drawdown = drawdown_curve(&equity_curve);
        let metrics = self.evaluator.evaluate(
            &period_returns,
            &equity_curve,
            &trades,
            capital,
            self.config.risk_free_rate,
        );

        tracing::debug!(
            strategy,
            symbol = series.symbol(),
            bars = n,
            trades = trades.len(),
            total_return = metrics.total_return,
            "simulation complete"
        );

        Ok(BacktestResult {
            symbol: series.symbol().to_string(),
            strategy: strategy.to_string(),
            dates: series.dates(),
            signals: intents.clone(),
            period_returns,
            equity_curve,
            drawdown_curve: drawdown,
            trades,
            metrics,
            initial_capital: capital,
            signal_status: signals.status,
            constituents: Default::default(),
        })
    }
}
