//! Momentum: percent change over a lookback window.
//!
//! momentum[t] = close[t] / close[t-period] - 1
//! Lookback: period.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Momentum {
    period: usize,
    name: String,
}

impl Momentum {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("momentum_{period}"),
        }
    }
}

impl Indicator for Momentum {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        for i in self.period..n {
            let prev = bars[i - self.period].close;
            let curr = bars[i].close;
            if prev.is_nan() || curr.is_nan() || prev == 0.0 {
                continue;
            }
            result[i] = curr / prev - 1.0;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn momentum_basic() {
        let bars = make_bars(&[100.0, 110.0, 105.0, 121.0]);
        let result = Momentum::new(2).compute(&bars);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        // 105 / 100 - 1
        assert_approx(result[2], 0.05, DEFAULT_EPSILON);
        // 121 / 110 - 1
        assert_approx(result[3], 0.1, DEFAULT_EPSILON);
    }

    #[test]
    fn momentum_negative() {
        let bars = make_bars(&[100.0, 90.0]);
        let result = Momentum::new(1).compute(&bars);
        assert_approx(result[1], -0.1, DEFAULT_EPSILON);
    }

    #[test]
    fn momentum_nan_propagation() {
        let mut bars = make_bars(&[100.0, 101.0, 102.0]);
        bars[0].close = f64::NAN;
        let result = Momentum::new(1).compute(&bars);
        assert!(result[1].is_nan());
        assert!(!result[2].is_nan());
    }
}
