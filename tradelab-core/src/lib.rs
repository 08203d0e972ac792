//! TradeLab Core: signal providers, trade simulator, metrics, cost model.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, price series, position intents, trades)
//! - Indicators shared by the rule-based providers
//! - The `SignalProvider` trait, concrete providers, and the weighted composite
//! - Strategy registry with parameter-schema validation
//! - Bar-close trade simulator and performance metrics
//! - Money/risk helpers: position sizing, risk limits, transaction costs
//!
//! Everything here is synchronous pure computation. Data loading and report
//! export live in `tradelab-runner`.

pub mod components;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod risk;

pub use components::{CompositeSignalProvider, SignalProvider, StrategyRegistry};
pub use domain::{Bar, IntentSeries, PositionIntent, PriceSeries, SignalStatus, Trade, TradeSide};
pub use engine::{BacktestResult, SimulatorConfig, TradeSimulator};
pub use error::{BacktestError, ErrorKind};
pub use metrics::{Metrics, PerformanceEvaluator};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: domain types and providers are Send + Sync, so
    /// composite constituents and comparisons can fan out over rayon.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<domain::IntentSeries>();
        require_sync::<domain::IntentSeries>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();

        // Engine types
        require_send::<engine::SimulatorConfig>();
        require_sync::<engine::SimulatorConfig>();
        require_send::<engine::BacktestResult>();
        require_sync::<engine::BacktestResult>();
        require_send::<error::BacktestError>();
        require_sync::<error::BacktestError>();

        // Providers
        require_send::<Box<dyn SignalProvider>>();
        require_sync::<Box<dyn SignalProvider>>();
        require_send::<CompositeSignalProvider>();
        require_sync::<CompositeSignalProvider>();
        require_send::<components::signal::ModelSignal<components::signal::Perceptron>>();
        require_sync::<components::signal::ModelSignal<components::signal::Perceptron>>();
        require_send::<StrategyRegistry>();
        require_sync::<StrategyRegistry>();
    }

    /// Providers see bars only; `generate_signals` has no access to
    /// positions, capital, or fills.
    #[test]
    fn signal_provider_trait_has_no_portfolio_parameter() {
        fn _check_trait_object_builds(
            provider: &dyn SignalProvider,
            series: &PriceSeries,
        ) -> Result<IntentSeries, BacktestError> {
            provider.generate_signals(series)
        }
    }
}
