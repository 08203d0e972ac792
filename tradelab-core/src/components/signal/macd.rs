//! MACD crossover signal.
//!
//! Long when the MACD line crosses above its signal line, Short when it
//! crosses below.

use crate::components::indicator::Indicator;
use crate::domain::{IntentSeries, PriceSeries};
use crate::error::BacktestError;
use crate::indicators::{Macd, MacdLine};

use super::{crossover, insufficient_history, SignalProvider};

#[derive(Debug, Clone)]
pub struct MacdCrossover {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
    line: Macd,
    signal: Macd,
}

impl MacdCrossover {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            signal_period,
            line: Macd::new(fast_period, slow_period, signal_period, MacdLine::Macd),
            signal: Macd::new(fast_period, slow_period, signal_period, MacdLine::Signal),
        }
    }

    pub fn default_params() -> Self {
        Self::new(12, 26, 9)
    }
}

impl SignalProvider for MacdCrossover {
    fn name(&self) -> &str {
        "macd"
    }

    fn lookback(&self) -> usize {
        self.slow_period
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<IntentSeries, BacktestError> {
        if let Some(flat) = insufficient_history(series, self.lookback()) {
            return Ok(flat);
        }
        let macd = self.line.compute(series.bars());
        let signal = self.signal.compute(series.bars());
        Ok(IntentSeries::ready(crossover(&macd, &signal)))
    }
}
