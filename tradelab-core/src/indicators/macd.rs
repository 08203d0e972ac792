//! MACD: Moving Average Convergence/Divergence.
//!
//! - MACD line: EMA(close, fast) - EMA(close, slow)
//! - Signal line: EMA(MACD line, signal)
//! - Histogram: MACD line - signal line
//!
//! All EMAs are recursive and seeded at the first value, so every index
//! carries a value.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

use super::ema::ema_of_series;

/// Which MACD line to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        let label = match line {
            MacdLine::Macd => "line",
            MacdLine::Signal => "signal",
            MacdLine::Histogram => "hist",
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name: format!("macd_{label}_{fast}_{slow}_{signal}"),
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let (macd, signal) = macd_lines(&closes, self.fast, self.slow, self.signal);
        match self.line {
            MacdLine::Macd => macd,
            MacdLine::Signal => signal,
            MacdLine::Histogram => macd.iter().zip(&signal).map(|(m, s)| m - s).collect(),
        }
    }
}

/// MACD and signal lines for a raw close series.
pub fn macd_lines(closes: &[f64], fast: usize, slow: usize, signal: usize) -> (Vec<f64>, Vec<f64>) {
    let fast_ema = ema_of_series(closes, fast);
    let slow_ema = ema_of_series(closes, slow);
    let macd: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ema_of_series(&macd, signal);
    (macd, signal_line)
}
