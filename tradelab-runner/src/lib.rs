//! TradeLab Runner: configuration, data loading and run orchestration.
//!
//! This crate builds on `tradelab-core` to provide:
//! - TOML backtest configs with content-addressed run ids
//! - Data providers (CSV directory, synthetic walk, retry wrapper)
//! - Single-run and multi-strategy comparison entry points
//! - Serializable reports with risk statistics, JSON/CSV export
//! - Portfolio weight optimizers

pub mod compare;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod optimizer;
pub mod report;
pub mod runner;

pub use compare::{compare_strategies, summary_rows, ComparisonRow};
pub use config::{BacktestConfig, CompositeSpec, ConfigError, DataConfig, RunId, StrategySpec};
pub use data_loader::{
    load_series, CsvProvider, DataError, DataProvider, RetryingProvider, SyntheticProvider,
};
pub use export::{load_report, save_report};
pub use optimizer::{InverseVolatilityOptimizer, PortfolioOptimizer};
pub use report::{BacktestReport, SCHEMA_VERSION};
pub use runner::{data_provider, run_backtest, run_from_config, run_on_series, RunError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<StrategySpec>();
        assert_sync::<StrategySpec>();
    }

    #[test]
    fn report_is_send_sync() {
        assert_send::<BacktestReport>();
        assert_sync::<BacktestReport>();
    }

    #[test]
    fn providers_are_send_sync() {
        assert_send::<CsvProvider>();
        assert_sync::<CsvProvider>();
        assert_send::<RetryingProvider<SyntheticProvider>>();
        assert_sync::<RetryingProvider<SyntheticProvider>>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<DataError>();
        assert_sync::<DataError>();
    }
}
