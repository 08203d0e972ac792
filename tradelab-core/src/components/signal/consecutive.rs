//! Consecutive closes: fade a run of same-direction closes.
//!
//! Long after `n_days` consecutive lower closes, Short after `n_days`
//! consecutive higher closes. An unchanged close breaks the run.

use crate::domain::{IntentSeries, PositionIntent, PriceSeries};
use crate::error::BacktestError;

use super::{insufficient_history, SignalProvider};

#[derive(Debug, Clone)]
pub struct ConsecutiveCloses {
    pub n_days: usize,
}

impl ConsecutiveCloses {
    pub fn new(n_days: usize) -> Self {
        Self { n_days }
    }

    pub fn default_params() -> Self {
        Self::new(3)
    }
}

impl SignalProvider for ConsecutiveCloses {
    fn name(&self) -> &str {
        "consecutive"
    }

    fn lookback(&self) -> usize {
        self.n_days + 1
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<IntentSeries, BacktestError> {
        if let Some(flat) = insufficient_history(series, self.lookback()) {
            return Ok(flat);
        }
        let closes = series.closes();
        let mut intents = vec![PositionIntent::Flat; closes.len()];
        let (mut ups, mut downs) = (0usize, 0usize);

        for t in 1..closes.len() {
            let change = closes[t] - closes[t - 1];
            if change > 0.0 {
                ups += 1;
                downs = 0;
            } else if change < 0.0 {
                downs += 1;
                ups = 0;
            } else {
                ups = 0;
                downs = 0;
            }

            if downs >= self.n_days {
                intents[t] = PositionIntent::Long;
            } else if ups >= self.n_days {
                intents[t] = PositionIntent::Short;
            }
        }
        Ok(IntentSeries::ready(intents))
    }
}
