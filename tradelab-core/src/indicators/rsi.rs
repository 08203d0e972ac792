//! Relative Strength Index (RSI), Wilder smoothing.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Seeded with the plain mean of the first `period` changes.
//! Lookback: period. A flat window reads 50.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        rsi_of_series(&closes, self.period)
    }
}

pub fn rsi_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let period = period.max(1);
    let mut result = vec![f64::NAN; n];
    if n <= period {
        return result;
    }

    let split = |change: f64| (change.max(0.0), (-change).max(0.0));

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = values[i] - values[i - 1];
        if change.is_nan() {
            return result;
        }
        let (g, l) = split(change);
        avg_gain += g;
        avg_loss += l;
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    result[period] = rsi_value(avg_gain, avg_loss);

    let alpha = 1.0 / period as f64;
    for i in (period + 1)..n {
        let change = values[i] - values[i - 1];
        if change.is_nan() {
            break;
        }
        let (g, l) = split(change);
        avg_gain += alpha * (g - avg_gain);
        avg_loss += alpha * (l - avg_loss);
        result[i] = rsi_value(avg_gain, avg_loss);
    }

    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    match (avg_gain == 0.0, avg_loss == 0.0) {
        (true, true) => 50.0,
        (false, true) => 100.0,
        (true, false) => 0.0,
        (false, false) => 100.0 - 100.0 / (1.0 + avg_gain / avg_loss),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn rsi_all_gains_is_100() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let result = Rsi::new(3).compute(&bars);
        assert!(result[2].is_nan());
        assert_approx(result[3], 100.0, 1e-6);
        assert_approx(result[5], 100.0, 1e-6);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let bars = make_bars(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3], 0.0, 1e-6);
    }

    #[test]
    fn rsi_flat_is_50() {
        let result = rsi_of_series(&[10.0; 6], 3);
        assert_approx(result[4], 50.0, 1e-9);
    }

    #[test]
    fn rsi_seed_value() {
        // changes: +0.34, -0.25, -0.48 → RSI = 100 - 100 / (1 + 0.34/0.73)
        let result = rsi_of_series(&[44.0, 44.34, 44.09, 43.61], 3);
        let expected = 100.0 - 100.0 / (1.0 + 0.34 / 0.73);
        assert_approx(result[3], expected, 1e-6);
    }

    #[test]
    fn rsi_bounds() {
        let closes = [100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0];
        for (i, v) in rsi_of_series(&closes, 3).into_iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "RSI out of bounds at bar {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_short_series_all_nan() {
        assert!(rsi_of_series(&[1.0, 2.0, 3.0], 3).iter().all(|v| v.is_nan()));
    }
}
