//! Donchian Channel: highest high / lowest low of the bars *before* t.
//!
//! Produces two series (exposed as separate Indicator instances):
//! - Upper: max(high[t-period..t])
//! - Lower: min(low[t-period..t])
//!
//! The current bar is excluded so that a close can actually exceed the
//! channel it is compared against. Lookback: period.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

/// Which band of the Donchian channel to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonchianBand {
    Upper,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Donchian {
    period: usize,
    band: DonchianBand,
    name: String,
}

impl Donchian {
    pub fn upper(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            band: DonchianBand::Upper,
            name: format!("donchian_upper_{period}"),
        }
    }

    pub fn lower(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            band: DonchianBand::Lower,
            name: format!("donchian_lower_{period}"),
        }
    }
}

impl Indicator for Donchian {
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
            let window = &bars[i - self.period..i];
            result[i] = match self.band {
                DonchianBand::Upper => extreme(window.iter().map(|b| b.high), f64::max),
                DonchianBand::Lower => extreme(window.iter().map(|b| b.low), f64::min),
            };
        }

        result
    }
}

fn extreme(values: impl Iterator<Item = f64>, pick: fn(f64, f64) -> f64) -> f64 {
    let mut acc: Option<f64> = None;
    for v in values {
        if v.is_nan() {
            return f64::NAN;
        }
        acc = Some(match acc {
            Some(a) => pick(a, v),
            None => v,
        });
    }
    acc.unwrap_or(f64::NAN)
}
