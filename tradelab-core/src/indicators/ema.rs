//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1]
//! with alpha = 2 / (period + 1).
//! Seed: EMA[0] = close[0]; every index carries a value.
//! Lookback: 0 (values are biased toward the seed until ~period bars in).

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        ema_of_series(&closes, self.period)
    }
}

/// EMA of an arbitrary series, seeded at the first value.
///
/// A NaN input taints every value from that index on. Used by MACD for the
/// signal line (EMA of the MACD line).
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n == 0 {
        return result;
    }

    let alpha = 2.0 / (period.max(1) as f64 + 1.0);
    let mut prev = values[0];
    if prev.is_nan() {
        return result;
    }
    result[0] = prev;

    for i in 1..n {
        if values[i].is_nan() {
            return result;
        }
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = ema;
        prev = ema;
    }

    result
}
