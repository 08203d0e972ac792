//! Bollinger reversion signal: price tags a band from inside.
//!
//! Fires Long when close drops onto or below the lower band after being
//! above it, Short when close rises onto or above the upper band after
//! being below it.

use crate::components::indicator::Indicator;
use crate::domain::{IntentSeries, PriceSeries};
use crate::error::BacktestError;
use crate::indicators::Bollinger;

use super::{band_touch, insufficient_history, SignalProvider};

/// Bollinger Band mean-reversion provider.
///
/// Middle band is a rolling mean with expanding warm-up; band width is
/// `num_std` sample standard deviations.
#[derive(Debug, Clone)]
pub struct BollingerReversion {
    pub window: usize,
    pub num_std: f64,
    upper: Bollinger,
    lower: Bollinger,
}

impl BollingerReversion {
    pub fn new(window: usize, num_std: f64) -> Self {
        Self {
            window,
            num_std,
            upper: Bollinger::upper(window, num_std),
            lower: Bollinger::lower(window, num_std),
        }
    }

    pub fn default_params() -> Self {
        Self::new(20, 2.0)
    }
}

impl SignalProvider for BollingerReversion {
    fn name(&self) -> &str {
        "bollinger_bands"
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<IntentSeries, BacktestError> {
        if let Some(flat) = insufficient_history(series, self.lookback()) {
            return Ok(flat);
        }
        let bars = series.bars();
        let upper = self.upper.compute(bars);
        let lower = self.lower.compute(bars);
        Ok(IntentSeries::ready(band_touch(&series.closes(), &lower, &upper)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::signal::test_support::series_from_closes;
    use crate::domain::PositionIntent;

    fn oscillating(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + if i % 2 == 0 { 1.0 } else { -1.0 }).collect()
    }

    #[test]
    fn crash_below_lower_band_goes_long() {
        let mut closes = oscillating(20);
        closes.push(80.0);
        let series = series_from_closes(&closes);
        let out = BollingerReversion::new(10, 2.0).generate_signals(&series).unwrap();
        assert_eq!(out.intents[20], PositionIntent::Long);
    }

    #[test]
    fn spike_above_upper_band_goes_short() {
        let mut closes = oscillating(20);
        closes.push(120.0);
        let series = series_from_closes(&closes);
        let out = BollingerReversion::new(10, 2.0).generate_signals(&series).unwrap();
        assert_eq!(out.intents[20], PositionIntent::Short);
    }

    #[test]
    fn quiet_market_stays_flat() {
        let series = series_from_closes(&oscillating(40));
        let out = BollingerReversion::new(10, 2.0).generate_signals(&series).unwrap();
        assert!(out.intents.iter().all(|i| *i == PositionIntent::Flat));
    }

    #[test]
    fn first_bar_never_fires() {
        let series = series_from_closes(&oscillating(25));
        let out = BollingerReversion::new(5, 0.1).generate_signals(&series).unwrap();
        assert_eq!(out.intents[0], PositionIntent::Flat);
    }
}
