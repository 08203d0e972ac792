//! Channel breakout signal: close leaves the prior N-bar high/low range.
//!
//! Level signal, not edge-triggered: every bar closing above the highest
//! high of the previous `window` bars reads Long, every bar closing below
//! the lowest low reads Short.

use crate::components::indicator::Indicator;
use crate::domain::{IntentSeries, PositionIntent, PriceSeries};
use crate::error::BacktestError;
use crate::indicators::Donchian;

use super::{insufficient_history, SignalProvider};

#[derive(Debug, Clone)]
pub struct ChannelBreakout {
    pub window: usize,
    upper: Donchian,
    lower: Donchian,
}

impl ChannelBreakout {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            upper: Donchian::upper(window),
            lower: Donchian::lower(window),
        }
    }

    pub fn default_params() -> Self {
        Self::new(20)
    }
}

impl SignalProvider for ChannelBreakout {
    fn name(&self) -> &str {
        "channel_breakout"
    }

    fn lookback(&self) -> usize {
        self.window + 1
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<IntentSeries, BacktestError> {
        if let Some(flat) = insufficient_history(series, self.lookback()) {
            return Ok(flat);
        }
        let bars = series.bars();
        let upper = self.upper.compute(bars);
        let lower = self.lower.compute(bars);

        let intents = bars
            .iter()
            .enumerate()
            .map(|(t, bar)| {
                if bar.close > upper[t] {
                    PositionIntent::Long
                } else if bar.close < lower[t] {
                    PositionIntent::Short
                } else {
                    PositionIntent::Flat
                }
            })
            .collect();
        Ok(IntentSeries::ready(intents))
    }
}
