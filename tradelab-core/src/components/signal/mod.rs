//! Signal providers: turn a price series into a position-intent series.
//!
//! Providers are portfolio-agnostic: they see bars only, never positions,
//! capital, or fills. Output is aligned 1:1 with the input series, and the
//! value at bar t may only depend on bars 0..=t.

pub mod bar_pattern;
pub mod bollinger;
pub mod channel;
pub mod consecutive;
pub mod greedy;
pub mod ma_crossover;
pub mod macd;
pub mod model;
pub mod momentum;
pub mod pattern;

pub use bar_pattern::{BarUpDown, InsideBar, OutsideBar};
pub use bollinger::BollingerReversion;
pub use channel::ChannelBreakout;
pub use consecutive::ConsecutiveCloses;
pub use greedy::GreedyVote;
pub use ma_crossover::MaCrossover;
pub use macd::MacdCrossover;
pub use model::{LinearRegression, ModelSignal, Perceptron, Predictor};
pub use momentum::MomentumSign;
pub use pattern::PatternBreakout;

use crate::domain::{IntentSeries, PositionIntent, PriceSeries};
use crate::engine::{BacktestResult, SimulatorConfig, TradeSimulator};
use crate::error::BacktestError;

/// Trait for signal providers.
///
/// # Architecture invariant
/// `generate_signals` must be deterministic for identical input (and seed),
/// and must never read bars after the one it is producing an intent for.
pub trait SignalProvider: std::fmt::Debug + Send + Sync {
    /// Human-readable name (e.g., "moving_average").
    fn name(&self) -> &str;

    /// Number of bars needed before output is meaningful. Shorter series
    /// produce an all-flat [`IntentSeries`] flagged `InsufficientHistory`.
    fn lookback(&self) -> usize;

    /// Produce one intent per bar.
    fn generate_signals(&self, series: &PriceSeries) -> Result<IntentSeries, BacktestError>;

    /// Generate signals and run them through the trade simulator.
    fn backtest(
        &self,
        series: &PriceSeries,
        config: &SimulatorConfig,
    ) -> Result<BacktestResult, BacktestError> {
        let signals = self.generate_signals(series)?;
        TradeSimulator::new(*config).run(self.name(), series, &signals)
    }
}

impl<P: SignalProvider + ?Sized> SignalProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn lookback(&self) -> usize {
        (**self).lookback()
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<IntentSeries, BacktestError> {
        (**self).generate_signals(series)
    }

    fn backtest(
        &self,
        series: &PriceSeries,
        config: &SimulatorConfig,
    ) -> Result<BacktestResult, BacktestError> {
        (**self).backtest(series, config)
    }
}

/// Degraded-mode guard shared by every provider: `Some(all-flat)` when the
/// series is shorter than `lookback`.
pub fn insufficient_history(series: &PriceSeries, lookback: usize) -> Option<IntentSeries> {
    if series.len() < lookback {
        tracing::warn!(
            symbol = series.symbol(),
            required = lookback,
            available = series.len(),
            "insufficient history, emitting flat intents"
        );
        Some(IntentSeries::insufficient(lookback, series.len()))
    } else {
        None
    }
}

/// Edge-triggered crossover of `fast` over `slow`.
///
/// +1 at t when fast[t] > slow[t] and fast[t-1] <= slow[t-1];
/// -1 when fast[t] < slow[t] and fast[t-1] >= slow[t-1]. NaN never fires.
pub fn crossover(fast: &[f64], slow: &[f64]) -> Vec<PositionIntent> {
    let n = fast.len().min(slow.len());
    let mut out = vec![PositionIntent::Flat; n];
    for t in 1..n {
        let (f, s, fp, sp) = (fast[t], slow[t], fast[t - 1], slow[t - 1]);
        if f > s && fp <= sp {
            out[t] = PositionIntent::Long;
        } else if f < s && fp >= sp {
            out[t] = PositionIntent::Short;
        }
    }
    out
}

/// Edge-triggered band touch.
///
/// +1 when price[t] <= lower[t] and price[t-1] > lower[t-1];
/// -1 when price[t] >= upper[t] and price[t-1] < upper[t-1].
/// NaN comparisons are false.
pub fn band_touch(price: &[f64], lower: &[f64], upper: &[f64]) -> Vec<PositionIntent> {
    let n = price.len().min(lower.len()).min(upper.len());
    let mut out = vec![PositionIntent::Flat; n];
    for t in 1..n {
        if price[t] <= lower[t] && price[t - 1] > lower[t - 1] {
            out[t] = PositionIntent::Long;
        } else if price[t] >= upper[t] && price[t - 1] < upper[t - 1] {
            out[t] = PositionIntent::Short;
        }
    }
    out
}

/// Replays a precomputed intent sequence.
///
/// Useful for signals produced outside the engine and for tests that need an
/// exact intent stream. Series of a different length are rejected.
#[derive(Debug, Clone)]
pub struct ReplaySignal {
    name: String,
    intents: Vec<PositionIntent>,
}

impl ReplaySignal {
    pub fn new(name: impl Into<String>, intents: Vec<PositionIntent>) -> Self {
        Self {
            name: name.into(),
            intents,
        }
    }

    /// Build from raw -1/0/1 values; anything else maps by sign.
    pub fn from_values(name: impl Into<String>, values: &[i8]) -> Self {
        let intents = values
            .iter()
            .map(|&v| PositionIntent::from_sign(f64::from(v)))
            .collect();
        Self::new(name, intents)
    }
}

impl SignalProvider for ReplaySignal {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<IntentSeries, BacktestError> {
        if self.intents.len() != series.len() {
            return Err(BacktestError::InvalidInput(format!(
                "replay '{}' holds {} intents for a {}-bar series",
                self.name,
                self.intents.len(),
                series.len()
            )));
        }
        Ok(IntentSeries::ready(self.intents.clone()))
    }
}
