//! Moving average crossover signal: golden cross and death cross detection.
//!
//! Fires Long when the fast MA crosses above the slow MA (golden cross).
//! Fires Short when the fast MA crosses below the slow MA (death cross).

use crate::components::indicator::Indicator;
use crate::domain::{IntentSeries, PriceSeries};
use crate::error::BacktestError;
use crate::indicators::Sma;

use super::{crossover, insufficient_history, SignalProvider};

/// Moving average crossover signal provider.
///
/// Both averages are simple moving averages with expanding warm-up, so the
/// early bars average whatever history is available instead of being NaN.
#[derive(Debug, Clone)]
pub struct MaCrossover {
    pub short_window: usize,
    pub long_window: usize,
    fast: Sma,
    slow: Sma,
}

impl MaCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Self {
        Self {
            short_window,
            long_window,
            fast: Sma::expanding(short_window),
            slow: Sma::expanding(long_window),
        }
    }

    pub fn default_params() -> Self {
        Self::new(5, 20)
    }
}

impl SignalProvider for MaCrossover {
    fn name(&self) -> &str {
        "moving_average"
    }

    fn lookback(&self) -> usize {
        self.long_window
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<IntentSeries, BacktestError> {
        if let Some(flat) = insufficient_history(series, self.lookback()) {
            return Ok(flat);
        }
        let fast = self.fast.compute(series.bars());
        let slow = self.slow.compute(series.bars());
        Ok(IntentSeries::ready(crossover(&fast, &slow)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::signal::test_support::series_from_closes;
    use crate::domain::{PositionIntent, SignalStatus};

    #[test]
    fn golden_cross_on_rally() {
        // fast(2): 10, 9.5, 8.5, 7.5, 6.5, 7.5, 10.5, 13.5
        // slow(4): 10, 9.5, 9, 8.5, 7.5, 7.5, 8.75, 10.5
        let series = series_from_closes(&[10.0, 9.0, 8.0, 7.0, 6.0, 9.0, 12.0, 15.0]);
        let out = MaCrossover::new(2, 4).generate_signals(&series).unwrap();
        assert_eq!(out.values(), vec![0, 0, -1, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn death_cross_on_selloff() {
        // fast(2): 10, 10.5, 11.5, 12.5, 13.5, 12.5, 9.5, 6.5
        // slow(4): 10, 10.5, 11, 11.5, 12.5, 12.5, 11.5, 9.5
        let series = series_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0, 11.0, 8.0, 5.0]);
        let out = MaCrossover::new(2, 4).generate_signals(&series).unwrap();
        assert_eq!(out.values(), vec![0, 0, 1, 0, 0, 0, -1, 0]);
    }

    #[test]
    fn first_bar_is_always_flat() {
        let series = series_from_closes(&[1.0, 5.0, 2.0, 6.0, 3.0, 7.0]);
        let out = MaCrossover::new(1, 2).generate_signals(&series).unwrap();
        assert_eq!(out.intents[0], PositionIntent::Flat);
    }

    #[test]
    fn alternating_prices_alternate_intents() {
        let series = series_from_closes(&[100.0, 110.0, 90.0, 110.0, 90.0, 110.0, 90.0]);
        let out = MaCrossover::new(1, 2).generate_signals(&series).unwrap();
        assert_eq!(out.values(), vec![0, 1, -1, 1, -1, 1, -1]);
    }

    #[test]
    fn short_series_is_degraded() {
        let series = series_from_closes(&[1.0, 2.0, 3.0]);
        let out = MaCrossover::default_params().generate_signals(&series).unwrap();
        assert_eq!(
            out.status,
            SignalStatus::InsufficientHistory {
                required: 20,
                available: 3
            }
        );
        assert!(out.intents.iter().all(|i| *i == PositionIntent::Flat));
    }

    #[test]
    fn constant_prices_never_fire() {
        let series = series_from_closes(&[100.0; 40]);
        let out = MaCrossover::default_params().generate_signals(&series).unwrap();
        assert!(out.intents.iter().all(|i| *i == PositionIntent::Flat));
    }
}
