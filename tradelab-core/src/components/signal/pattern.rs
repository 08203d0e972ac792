//! Pattern breakout: range breakouts plus four-bar reversal patterns.
//!
//! A close beyond the prior `window`-bar range (resistance = highest high,
//! support = lowest low) reads as a breakout. When no breakout is under way,
//! a four-bar reversal pattern ending at the current bar sets the intent,
//! provided it formed in the matching half of the prior range: bottoms near
//! support, tops near resistance.

use crate::domain::{Bar, IntentSeries, PositionIntent, PriceSeries};
use crate::error::BacktestError;

use super::{insufficient_history, SignalProvider};

/// Relative tolerance for "equal" peaks and troughs.
const LEVEL_TOLERANCE: f64 = 0.01;

/// Bars in a reversal pattern.
const PATTERN_LEN: usize = 4;

#[derive(Debug, Clone)]
pub struct PatternBreakout {
    pub window: usize,
}

impl PatternBreakout {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn default_params() -> Self {
        Self::new(20)
    }

    fn intent_at(&self, bars: &[Bar], t: usize) -> PositionIntent {
        let prior = &bars[t - self.window..t];
        let resistance = prior.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let support = prior.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let close = bars[t].close;

        if close > resistance {
            return PositionIntent::Long;
        }
        if close < support {
            return PositionIntent::Short;
        }

        let midpoint = (support + resistance) / 2.0;
        let quad = &bars[t + 1 - PATTERN_LEN..=t];
        let highs = [quad[0].high, quad[1].high, quad[2].high, quad[3].high];
        let lows = [quad[0].low, quad[1].low, quad[2].low, quad[3].low];

        if is_bottom(&lows) && lows.iter().copied().fold(f64::INFINITY, f64::min) <= midpoint {
            PositionIntent::Long
        } else if is_top(&highs) && highs.iter().copied().fold(f64::NEG_INFINITY, f64::max) >= midpoint {
            PositionIntent::Short
        } else {
            PositionIntent::Flat
        }
    }
}

fn near(a: f64, b: f64) -> bool {
    (a - b).abs() < LEVEL_TOLERANCE * a.abs()
}

/// Two peaks at bars 1 and 3 with a trough between them: double top when
/// the peaks match, head-and-shoulders when the troughs either side of the
/// head match instead.
fn is_top(h: &[f64; 4]) -> bool {
    let two_peaks = h[0] < h[1] && h[1] > h[2] && h[2] < h[3];
    two_peaks && (near(h[1], h[3]) || (h[1] > h[3] && near(h[0], h[2])))
}

/// Mirror image of [`is_top`] on the lows.
fn is_bottom(l: &[f64; 4]) -> bool {
    let two_troughs = l[0] > l[1] && l[1] < l[2] && l[2] > l[3];
    two_troughs && (near(l[1], l[3]) || (l[1] < l[3] && near(l[0], l[2])))
}

impl SignalProvider for PatternBreakout {
    fn name(&self) -> &str {
        "pattern_breakout"
    }

    fn lookback(&self) -> usize {
        self.window.max(PATTERN_LEN) + 1
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<IntentSeries, BacktestError> {
        if let Some(flat) = insufficient_history(series, self.lookback()) {
            return Ok(flat);
        }
        let bars = series.bars();
        let start = self.window.max(PATTERN_LEN - 1);
        let mut intents = vec![PositionIntent::Flat; bars.len()];
        for (t, intent) in intents.iter_mut().enumerate().skip(start) {
            *intent = self.intent_at(bars, t);
        }
        Ok(IntentSeries::ready(intents))
    }
}
