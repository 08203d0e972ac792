//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window. Two warm-up modes:
//! - `Strict`: first valid value at index period-1, NaN before.
//! - `Expanding`: bars before period-1 average whatever history exists,
//!   so every index has a value.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

/// How the first `period - 1` values are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warmup {
    Strict,
    Expanding,
}

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    warmup: Warmup,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            warmup: Warmup::Strict,
            name: format!("sma_{period}"),
        }
    }

    pub fn expanding(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            warmup: Warmup::Expanding,
            name: format!("sma_{period}_exp"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.warmup {
            Warmup::Strict => self.period.saturating_sub(1),
            Warmup::Expanding => 0,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        rolling_mean(&closes, self.period, self.warmup)
    }
}

/// Rolling mean of an arbitrary series. NaN inside a window yields NaN.
pub fn rolling_mean(values: &[f64], period: usize, warmup: Warmup) -> Vec<f64> {
    let n = values.len();
    let period = period.max(1);
    let mut result = vec![f64::NAN; n];

    let mut sum = 0.0;
    let mut nan_count = 0usize;
    for i in 0..n {
        let entering = values[i];
        if entering.is_nan() {
            nan_count += 1;
        } else {
            sum += entering;
        }
        if i >= period {
            let leaving = values[i - period];
            if leaving.is_nan() {
                nan_count -= 1;
            } else {
                sum -= leaving;
            }
        }

        let count = (i + 1).min(period);
        if count < period && warmup == Warmup::Strict {
            continue;
        }
        if nan_count == 0 {
            result[i] = sum / count as f64;
        }
    }

    result
}
