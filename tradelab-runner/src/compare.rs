//! Side-by-side comparison of several strategies on one series.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use tradelab_core::{BacktestError, BacktestResult, PriceSeries, SimulatorConfig, StrategyRegistry};

use crate::config::StrategySpec;

/// Keys for a strategy list: the id, suffixed `#2`, `#3`… on repeats.
pub fn comparison_keys(specs: &[StrategySpec]) -> Vec<String> {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    specs
        .iter()
        .map(|s| {
            let count = seen.entry(s.id.as_str()).or_insert(0);
            *count += 1;
            if *count == 1 {
                s.id.clone()
            } else {
                format!("{}#{}", s.id, count)
            }
        })
        .collect()
}

/// Backtest every spec on `series` in parallel.
///
/// All providers are constructed up front, so a bad id or parameter fails
/// the whole comparison before any simulation runs.
pub fn compare_strategies(
    registry: &StrategyRegistry,
    series: &PriceSeries,
    specs: &[StrategySpec],
    config: &SimulatorConfig,
) -> Result<BTreeMap<String, BacktestResult>, BacktestError> {
    let providers = specs
        .iter()
        .map(|s| s.build(registry))
        .collect::<Result<Vec<_>, _>>()?;

    let results = providers
        .par_iter()
        .map(|p| p.backtest(series, config))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        symbol = series.symbol(),
        strategies = results.len(),
        "comparison complete"
    );
    Ok(comparison_keys(specs).into_iter().zip(results).collect())
}

/// One line of a comparison table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub key: String,
    pub total_return: f64,
    pub annual_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub trades_count: usize,
}

/// Rows sorted by Sharpe ratio, best first; ties keep key order.
pub fn summary_rows(results: &BTreeMap<String, BacktestResult>) -> Vec<ComparisonRow> {
    let mut rows: Vec<ComparisonRow> = results
        .iter()
        .map(|(key, r)| ComparisonRow {
            key: key.clone(),
            total_return: r.metrics.total_return,
            annual_return: r.metrics.annual_return,
            sharpe_ratio: r.metrics.sharpe_ratio,
            max_drawdown: r.metrics.max_drawdown,
            win_rate: r.metrics.win_rate,
            trades_count: r.metrics.trades_count,
        })
        .collect();
    rows.sort_by(|a, b| b.sharpe_ratio.total_cmp(&a.sharpe_ratio));
    rows
}
