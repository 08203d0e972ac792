//! Greedy multi-indicator vote.
//!
//! Three indicators each cast a buy or sell vote per bar:
//! - RSI below 30 buys, above 70 sells
//! - short MA above long MA buys, below sells
//! - close below the lower Bollinger band buys, above the upper sells
//!
//! Two or more buy votes go Long; otherwise two or more sell votes go Short.

use crate::components::indicator::Indicator;
use crate::domain::{IntentSeries, PositionIntent, PriceSeries};
use crate::error::BacktestError;
use crate::indicators::{Bollinger, Rsi, Sma};

use super::{insufficient_history, SignalProvider};

const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
const MIN_VOTES: u8 = 2;

#[derive(Debug, Clone)]
pub struct GreedyVote {
    pub rsi_period: usize,
    pub ma_short: usize,
    pub ma_long: usize,
    pub bb_period: usize,
    pub bb_std: f64,
}

impl GreedyVote {
    pub fn new(rsi_period: usize, ma_short: usize, ma_long: usize, bb_period: usize, bb_std: f64) -> Self {
        Self {
            rsi_period,
            ma_short,
            ma_long,
            bb_period,
            bb_std,
        }
    }

    pub fn default_params() -> Self {
        Self::new(14, 5, 20, 20, 2.0)
    }

    fn first_bar(&self) -> usize {
        self.rsi_period.max(self.ma_long).max(self.bb_period)
    }
}

impl SignalProvider for GreedyVote {
    fn name(&self) -> &str {
        "greedy"
    }

    fn lookback(&self) -> usize {
        self.first_bar() + 1
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<IntentSeries, BacktestError> {
        if let Some(flat) = insufficient_history(series, self.lookback()) {
            return Ok(flat);
        }
        let bars = series.bars();
        let rsi = Rsi::new(self.rsi_period).compute(bars);
        let short = Sma::new(self.ma_short).compute(bars);
        let long = Sma::new(self.ma_long).compute(bars);
        let upper = Bollinger::upper(self.bb_period, self.bb_std).compute(bars);
        let lower = Bollinger::lower(self.bb_period, self.bb_std).compute(bars);

        let mut intents = vec![PositionIntent::Flat; bars.len()];
        for t in self.first_bar()..bars.len() {
            let close = bars[t].close;
            let mut buys = 0u8;
            let mut sells = 0u8;

            if rsi[t] < RSI_OVERSOLD {
                buys += 1;
            } else if rsi[t] > RSI_OVERBOUGHT {
                sells += 1;
            }

            if short[t] > long[t] {
                buys += 1;
            } else if short[t] < long[t] {
                sells += 1;
            }

            if close < lower[t] {
                buys += 1;
            } else if close > upper[t] {
                sells += 1;
            }

            if buys >= MIN_VOTES {
                intents[t] = PositionIntent::Long;
            } else if sells >= MIN_VOTES {
                intents[t] = PositionIntent::Short;
            }
        }

        tracing::debug!(
            symbol = series.symbol(),
            long = intents.iter().filter(|i| **i == PositionIntent::Long).count(),
            short = intents.iter().filter(|i| **i == PositionIntent::Short).count(),
            "greedy vote complete"
        );
        Ok(IntentSeries::ready(intents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::signal::test_support::series_from_closes;

    #[test]
    fn strong_rally_votes_short() {
        // Steady rise: RSI 100 (sell) and short MA above long MA (buy).
        // Final spike adds the Bollinger sell vote.
        let mut closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64 * 0.5).collect();
        closes.push(140.0);
        let series = series_from_closes(&closes);
        let out = GreedyVote::default_params().generate_signals(&series).unwrap();
        assert_eq!(out.intents[40], PositionIntent::Short);
    }

    #[test]
    fn crash_votes_long() {
        // Steady decline: RSI 0 (buy), short MA below long MA (sell).
        // Final crash adds the Bollinger buy vote.
        let mut closes: Vec<f64> = (0..40).map(|i| 200.0 - i as f64 * 0.5).collect();
        closes.push(150.0);
        let series = series_from_closes(&closes);
        let out = GreedyVote::default_params().generate_signals(&series).unwrap();
        assert_eq!(out.intents[40], PositionIntent::Long);
    }

    #[test]
    fn warmup_bars_are_flat() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let series = series_from_closes(&closes);
        let out = GreedyVote::default_params().generate_signals(&series).unwrap();
        assert!(out.intents[..20].iter().all(|i| *i == PositionIntent::Flat));
    }

    #[test]
    fn lookback_covers_slowest_indicator() {
        assert_eq!(GreedyVote::new(14, 5, 50, 20, 2.0).lookback(), 51);
    }
}
