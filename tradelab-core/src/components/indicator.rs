//! Indicator trait.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! Providers compute them once over the whole series and then read them by
//! bar index.

use crate::domain::Bar;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. Indices without enough history hold `f64::NAN`.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}
