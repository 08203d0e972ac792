//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! Three bands (separate Indicator instances):
//! - Middle: rolling mean(close, period)
//! - Upper: middle + mult * stddev(close, period)
//! - Lower: middle - mult * stddev(close, period)
//!
//! Expanding warm-up: before `period` bars the window is whatever history
//! exists. Uses sample stddev (divide by N-1), so the first bar has no
//! upper/lower band (NaN).

use crate::components::indicator::Indicator;
use crate::domain::Bar;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    fn with_band(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        let period = period.max(1);
        let label = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
        };
        Self {
            period,
            multiplier,
            band,
            name: format!("bollinger_{label}_{period}_{multiplier}"),
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Upper)
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Middle)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Lower)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.band {
            BollingerBand::Middle => 0,
            BollingerBand::Upper | BollingerBand::Lower => 1,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        for i in 0..n {
            let start = (i + 1).saturating_sub(self.period);
            let window = &bars[start..=i];
            let count = window.len() as f64;

            if window.iter().any(|bar| bar.close.is_nan()) {
                continue;
            }

            let mean = window.iter().map(|bar| bar.close).sum::<f64>() / count;

            if self.band == BollingerBand::Middle {
                result[i] = mean;
                continue;
            }

            if window.len() < 2 {
                continue;
            }
            let variance = window
                .iter()
                .map(|bar| {
                    let diff = bar.close - mean;
                    diff * diff
                })
                .sum::<f64>()
                / (count - 1.0);
            let stddev = variance.sqrt();

            result[i] = match self.band {
                BollingerBand::Upper => mean + self.multiplier * stddev,
                BollingerBand::Lower => mean - self.multiplier * stddev,
                BollingerBand::Middle => mean,
            };
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn bollinger_constant_price_bands_collapse() {
        let bars = make_bars(&[50.0; 10]);
        let upper = Bollinger::upper(5, 2.0).compute(&bars);
        let middle = Bollinger::middle(5, 2.0).compute(&bars);
        let lower = Bollinger::lower(5, 2.0).compute(&bars);
        for i in 1..10 {
            assert_approx(upper[i], 50.0, DEFAULT_EPSILON);
            assert_approx(middle[i], 50.0, DEFAULT_EPSILON);
            assert_approx(lower[i], 50.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn bollinger_first_bar_has_middle_only() {
        let bars = make_bars(&[10.0, 12.0, 14.0]);
        assert_approx(Bollinger::middle(3, 2.0).compute(&bars)[0], 10.0, DEFAULT_EPSILON);
        assert!(Bollinger::upper(3, 2.0).compute(&bars)[0].is_nan());
        assert!(Bollinger::lower(3, 2.0).compute(&bars)[0].is_nan());
    }

    #[test]
    fn bollinger_uses_sample_stddev() {
        // window [2, 4, 6]: mean 4, sample var = (4+0+4)/2 = 4, sd = 2
        let bars = make_bars(&[2.0, 4.0, 6.0]);
        let upper = Bollinger::upper(3, 1.5).compute(&bars);
        let lower = Bollinger::lower(3, 1.5).compute(&bars);
        assert_approx(upper[2], 7.0, DEFAULT_EPSILON);
        assert_approx(lower[2], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_expanding_window_before_period() {
        // bar 1 window [2, 4]: mean 3, sample sd = sqrt(2)
        let bars = make_bars(&[2.0, 4.0, 6.0, 8.0]);
        let upper = Bollinger::upper(20, 1.0).compute(&bars);
        assert_approx(upper[1], 3.0 + 2f64.sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_upper_above_lower() {
        let bars = make_bars(&[100.0, 103.0, 98.0, 105.0, 97.0, 110.0]);
        let upper = Bollinger::upper(4, 2.0).compute(&bars);
        let lower = Bollinger::lower(4, 2.0).compute(&bars);
        for i in 1..bars.len() {
            assert!(upper[i] > lower[i]);
        }
    }
}
