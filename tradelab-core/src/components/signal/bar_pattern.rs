//! Candle-shape signals: bar up/down runs, inside bars, outside bars.

use crate::domain::{Bar, IntentSeries, PositionIntent, PriceSeries};
use crate::error::BacktestError;

use super::{insufficient_history, SignalProvider};

// ─── Bar up/down ────────────────────────────────────────────────────

/// Long after `n_bars` bearish candles in a row (ending the bar before),
/// Short after `n_bars` bullish ones. Doji candles break the run.
#[derive(Debug, Clone)]
pub struct BarUpDown {
    pub n_bars: usize,
}

impl BarUpDown {
    pub fn new(n_bars: usize) -> Self {
        Self { n_bars }
    }

    pub fn default_params() -> Self {
        Self::new(3)
    }
}

impl SignalProvider for BarUpDown {
    fn name(&self) -> &str {
        "bar_up_down"
    }

    fn lookback(&self) -> usize {
        self.n_bars + 1
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<IntentSeries, BacktestError> {
        if let Some(flat) = insufficient_history(series, self.lookback()) {
            return Ok(flat);
        }
        let bars = series.bars();
        let mut intents = vec![PositionIntent::Flat; bars.len()];
        for t in self.n_bars..bars.len() {
            let run = &bars[t - self.n_bars..t];
            if run.iter().all(Bar::is_bearish) {
                intents[t] = PositionIntent::Long;
            } else if run.iter().all(Bar::is_bullish) {
                intents[t] = PositionIntent::Short;
            }
        }
        Ok(IntentSeries::ready(intents))
    }
}

// ─── Inside bar ─────────────────────────────────────────────────────

/// A bar whose range sits within the previous bar's range. Direction comes
/// from close versus the previous close.
#[derive(Debug, Clone, Default)]
pub struct InsideBar;

impl SignalProvider for InsideBar {
    fn name(&self) -> &str {
        "inside_bar"
    }

    fn lookback(&self) -> usize {
        2
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<IntentSeries, BacktestError> {
        if let Some(flat) = insufficient_history(series, self.lookback()) {
            return Ok(flat);
        }
        let bars = series.bars();
        let mut intents = vec![PositionIntent::Flat; bars.len()];
        for t in 1..bars.len() {
            let (prev, cur) = (&bars[t - 1], &bars[t]);
            if cur.high <= prev.high && cur.low >= prev.low {
                intents[t] = PositionIntent::from_sign(cur.close - prev.close);
            }
        }
        Ok(IntentSeries::ready(intents))
    }
}

// ─── Outside bar ────────────────────────────────────────────────────

/// A bar whose range engulfs the previous bar's range. Direction comes from
/// the candle body (close versus open).
#[derive(Debug, Clone, Default)]
pub struct OutsideBar;

impl SignalProvider for OutsideBar {
    fn name(&self) -> &str {
        "outside_bar"
    }

    fn lookback(&self) -> usize {
        2
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<IntentSeries, BacktestError> {
        if let Some(flat) = insufficient_history(series, self.lookback()) {
            return Ok(flat);
        }
        let bars = series.bars();
        let mut intents = vec![PositionIntent::Flat; bars.len()];
        for t in 1..bars.len() {
            let (prev, cur) = (&bars[t - 1], &bars[t]);
            if cur.high > prev.high && cur.low < prev.low {
                intents[t] = PositionIntent::from_sign(cur.close - cur.open);
            }
        }
        Ok(IntentSeries::ready(intents))
    }
}
