//! Backtest runner: wires config, data, registry and simulator together.
//!
//! Entry points:
//! - [`run_backtest`]: one strategy by id over an already-loaded series.
//! - [`run_on_series`]: a full [`BacktestConfig`] over a loaded series.
//! - [`run_from_config`]: loads data per the config, then runs. Used by the CLI.

use std::collections::BTreeMap;

use thiserror::Error;

use tradelab_core::{
    BacktestError, BacktestResult, ErrorKind, PriceSeries, SimulatorConfig, StrategyRegistry,
};

use crate::config::{BacktestConfig, ConfigError, DataConfig};
use crate::data_loader::{load_series, CsvProvider, DataProvider, RetryingProvider, SyntheticProvider};
use crate::report::BacktestReport;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backtest(#[from] BacktestError),
}

impl RunError {
    /// Config failures classify as invalid configuration.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::InvalidConfiguration,
            Self::Backtest(e) => e.kind(),
        }
    }
}

/// Run one registered strategy over `series`.
pub fn run_backtest(
    registry: &StrategyRegistry,
    series: &PriceSeries,
    strategy_id: &str,
    params: &BTreeMap<String, f64>,
    config: &SimulatorConfig,
) -> Result<BacktestResult, BacktestError> {
    let provider = registry.create(strategy_id, params)?;
    provider.backtest(series, config)
}

/// Data provider for a config, wrapped in the retry policy.
pub fn data_provider(config: &BacktestConfig) -> Box<dyn DataProvider> {
    match &config.data {
        DataConfig::Csv { dir } => Box::new(RetryingProvider::new(
            CsvProvider::new(dir.clone()),
            config.max_retries,
        )),
        DataConfig::Synthetic { seed } => Box::new(SyntheticProvider::new(*seed)),
    }
}

/// Run a validated config over an already-loaded series.
pub fn run_on_series(
    config: &BacktestConfig,
    series: &PriceSeries,
    registry: &StrategyRegistry,
) -> Result<BacktestReport, RunError> {
    config.validate()?;
    let provider = config.build_provider(registry)?;
    let sim_config = config.simulator_config();
    let run_id = config.run_id();

    let result = provider.backtest(series, &sim_config)?;
    tracing::info!(
        run_id = %run_id,
        symbol = series.symbol(),
        strategy = provider.name(),
        bars = series.len(),
        trades = result.trades.len(),
        total_return = result.metrics.total_return,
        "backtest complete"
    );
    if result.signal_status.is_degraded() {
        tracing::warn!(status = ?result.signal_status, "signals degraded");
    }
    Ok(BacktestReport::from_result(&result, &run_id, config.risk_free_rate))
}

/// Load data per `config.data`, then run.
pub fn run_from_config(
    config: &BacktestConfig,
    registry: &StrategyRegistry,
) -> Result<BacktestReport, RunError> {
    config.validate()?;
    let provider = data_provider(config);
    tracing::info!(
        symbol = %config.symbol,
        source = provider.name(),
        start = ?config.start,
        end = ?config.end,
        "loading data"
    );
    let series = load_series(provider.as_ref(), &config.symbol, config.start, config.end)?;
    run_on_series(config, &series, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategySpec;
    use chrono::NaiveDate;

    fn rising(n: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        PriceSeries::from_closes("UP", start, &closes).unwrap()
    }

    #[test]
    fn run_backtest_by_id() {
        let registry = StrategyRegistry::new();
        let mut params = BTreeMap::new();
        params.insert("short_window".to_string(), 2.0);
        params.insert("long_window".to_string(), 5.0);
        let result = run_backtest(
            &registry,
            &rising(20),
            "moving_average",
            &params,
            &SimulatorConfig::default(),
        )
        .unwrap();
        assert_eq!(result.strategy, "moving_average");
        assert_eq!(result.len(), 20);
        assert!(result.metrics.total_return > 0.0);
    }

    #[test]
    fn unknown_strategy_kind() {
        let err = run_backtest(
            &StrategyRegistry::new(),
            &rising(5),
            "nope",
            &BTreeMap::new(),
            &SimulatorConfig::default(),
        )
        .unwrap_err();
        assert_eq!(RunError::from(err).kind(), ErrorKind::UnknownStrategy);
    }

    #[test]
    fn run_on_series_attaches_run_id() {
        let config = BacktestConfig::for_strategy("UP", StrategySpec::new("momentum"));
        let report = run_on_series(&config, &rising(40), &StrategyRegistry::new()).unwrap();
        assert_eq!(report.run_id, config.run_id());
        assert_eq!(report.strategy, "momentum");
        assert_eq!(report.positions.len(), 40);
    }

    #[test]
    fn run_from_config_synthetic() {
        let mut config = BacktestConfig::for_strategy("SPY", StrategySpec::new("macd"));
        config.data = DataConfig::Synthetic { seed: 3 };
        config.start = NaiveDate::from_ymd_opt(2023, 1, 1);
        config.end = NaiveDate::from_ymd_opt(2023, 12, 31);
        let a = run_from_config(&config, &StrategyRegistry::new()).unwrap();
        let b = run_from_config(&config, &StrategyRegistry::new()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.symbol, "SPY");
    }

    #[test]
    fn missing_csv_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BacktestConfig::for_strategy("GONE", StrategySpec::new("macd"));
        config.data = DataConfig::Csv {
            dir: dir.path().to_path_buf(),
        };
        let err = run_from_config(&config, &StrategyRegistry::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataUnavailable);
    }

    #[test]
    fn invalid_config_kind() {
        let mut config = BacktestConfig::for_strategy("X", StrategySpec::new("macd"));
        config.strategy = None;
        let err = run_on_series(&config, &rising(5), &StrategyRegistry::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn bad_parameter_kind() {
        let config = BacktestConfig::for_strategy(
            "UP",
            StrategySpec::new("moving_average")
                .with_param("short_window", 30.0)
                .with_param("long_window", 10.0),
        );
        let err = run_on_series(&config, &rising(5), &StrategyRegistry::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }
}
