//! Component traits and implementations: the strategy abstraction layer.
//!
//! - Indicator: pure numeric series over bars, shared by providers
//! - Signal provider: turns a price series into a position-intent series
//! - Composite: weighted vote over several providers
//! - Registry: strategy id + parameter map to a validated provider

pub mod composite;
pub mod factory;
pub mod indicator;
pub mod signal;

pub use composite::CompositeSignalProvider;
pub use factory::{ParamKind, ParamSpec, StrategyInfo, StrategyRegistry};
pub use indicator::Indicator;
pub use signal::{ReplaySignal, SignalProvider};
