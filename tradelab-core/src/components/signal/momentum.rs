//! Momentum sign: follow the direction of the N-bar percent change.

use crate::components::indicator::Indicator;
use crate::domain::{IntentSeries, PositionIntent, PriceSeries};
use crate::error::BacktestError;
use crate::indicators::Momentum;

use super::{insufficient_history, SignalProvider};

#[derive(Debug, Clone)]
pub struct MomentumSign {
    pub lookback_period: usize,
    momentum: Momentum,
}

impl MomentumSign {
    pub fn new(lookback_period: usize) -> Self {
        Self {
            lookback_period,
            momentum: Momentum::new(lookback_period),
        }
    }

    pub fn default_params() -> Self {
        Self::new(12)
    }
}

impl SignalProvider for MomentumSign {
    fn name(&self) -> &str {
        "momentum"
    }

    fn lookback(&self) -> usize {
        self.lookback_period + 1
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<IntentSeries, BacktestError> {
        if let Some(flat) = insufficient_history(series, self.lookback()) {
            return Ok(flat);
        }
        let intents = self
            .momentum
            .compute(series.bars())
            .into_iter()
            .map(PositionIntent::from_sign)
            .collect();
        Ok(IntentSeries::ready(intents))
    }
}
