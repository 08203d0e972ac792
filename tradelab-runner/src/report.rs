//! Serializable run report: the export shape of a [`BacktestResult`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tradelab_core::metrics::realized_returns;
use tradelab_core::risk::RiskReport;
use tradelab_core::{BacktestResult, Metrics, SignalStatus, Trade};

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Complete, self-describing output of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: String,
    pub symbol: String,
    pub strategy: String,
    pub initial_capital: f64,
    /// ISO `YYYY-MM-DD` strings once serialized.
    pub dates: Vec<NaiveDate>,
    pub trades: Vec<Trade>,
    pub metrics: Metrics,
    pub equity_curve: Vec<f64>,
    pub drawdown_curve: Vec<f64>,
    /// -1 / 0 / 1 per bar.
    pub positions: Vec<i8>,
    pub signal_status: SignalStatus,
    pub risk: RiskReport,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constituents: BTreeMap<String, BacktestReport>,
}

impl BacktestReport {
    /// Wrap a result. Constituent reports get `<run_id>/<key>` ids.
    pub fn from_result(result: &BacktestResult, run_id: &str, risk_free_rate: f64) -> Self {
        let constituents = result
            .constituents
            .iter()
            .map(|(key, sub)| {
                let sub_id = format!("{run_id}/{key}");
                (key.clone(), Self::from_result(sub, &sub_id, risk_free_rate))
            })
            .collect();

        Self {
            schema_version: SCHEMA_VERSION,
            run_id: run_id.to_string(),
            symbol: result.symbol.clone(),
            strategy: result.strategy.clone(),
            initial_capital: result.initial_capital,
            dates: result.dates.clone(),
            trades: result.trades.clone(),
            metrics: result.metrics,
            equity_curve: result.equity_curve.clone(),
            drawdown_curve: result.drawdown_curve.clone(),
            positions: result.positions(),
            signal_status: result.signal_status,
            risk: RiskReport::from_returns(
                realized_returns(&result.period_returns),
                risk_free_rate,
            ),
            constituents,
        }
    }

    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .copied()
            .unwrap_or(self.initial_capital)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradelab_core::components::signal::ReplaySignal;
    use tradelab_core::{CompositeSignalProvider, PriceSeries, SignalProvider, SimulatorConfig};

    fn series() -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        PriceSeries::from_closes("TEST", start, &[100.0, 110.0, 90.0, 110.0, 90.0]).unwrap()
    }

    #[test]
    fn report_mirrors_result() {
        let provider = ReplaySignal::from_values("replay", &[0, 1, -1, 1, 0]);
        let result = provider
            .backtest(&series(), &SimulatorConfig::default())
            .unwrap();
        let report = BacktestReport::from_result(&result, "abc", 0.02);

        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.positions, vec![0, 1, -1, 1, 0]);
        assert_eq!(report.trades, result.trades);
        assert_eq!(report.metrics, result.metrics);
        assert_eq!(report.final_equity(), result.final_equity());
        assert!(report.constituents.is_empty());
    }

    #[test]
    fn risk_volatility_matches_metrics() {
        let provider = ReplaySignal::from_values("replay", &[0, 1, -1, 1, 0]);
        let result = provider
            .backtest(&series(), &SimulatorConfig::default())
            .unwrap();
        let report = BacktestReport::from_result(&result, "abc", 0.02);

        assert!(result.metrics.volatility > 0.0);
        assert!((report.risk.annualized_volatility - result.metrics.volatility).abs() < 1e-12);
    }

    #[test]
    fn report_json_shape() {
        let provider = ReplaySignal::from_values("replay", &[0, 1, -1, 0, 0]);
        let result = provider
            .backtest(&series(), &SimulatorConfig::default())
            .unwrap();
        let json = serde_json::to_value(BacktestReport::from_result(&result, "abc", 0.02)).unwrap();

        assert_eq!(json["dates"][0], "2024-01-02");
        assert_eq!(json["trades"][0]["type"], "buy");
        assert!(json["trades"][0]["profit"].is_null());
        assert_eq!(json["trades"][1]["type"], "sell");
        assert_eq!(json["signal_status"]["state"], "ready");
        assert!(json.get("constituents").is_none());
        assert!(json["risk"]["var_95"].is_number());
    }

    #[test]
    fn composite_report_nests_constituents() {
        let a: Box<dyn SignalProvider> = Box::new(ReplaySignal::from_values("a", &[0, 1, 0, 0, 0]));
        let b: Box<dyn SignalProvider> = Box::new(ReplaySignal::from_values("b", &[0, 1, 0, 0, 0]));
        let composite = CompositeSignalProvider::new(vec![a, b], None).unwrap();
        let result = composite
            .backtest(&series(), &SimulatorConfig::default())
            .unwrap();
        let report = BacktestReport::from_result(&result, "run", 0.02);

        let keys: Vec<&String> = report.constituents.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(report.constituents["a"].run_id, "run/a");
    }
}
