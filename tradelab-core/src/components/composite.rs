//! Weighted vote over several signal providers.
//!
//! `blended[t] = sum(w_i * intent_i[t])`; the composite goes long above 0.5,
//! short below -0.5, and stays flat otherwise.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::domain::{IntentSeries, PositionIntent, PriceSeries, SignalStatus};
use crate::engine::{BacktestResult, SimulatorConfig, TradeSimulator};
use crate::error::BacktestError;

use super::signal::SignalProvider;

/// Weights must sum to one within this tolerance.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

const VOTE_THRESHOLD: f64 = 0.5;

pub struct CompositeSignalProvider {
    providers: Vec<Box<dyn SignalProvider>>,
    weights: Vec<f64>,
}

impl std::fmt::Debug for CompositeSignalProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("CompositeSignalProvider")
            .field("providers", &names)
            .field("weights", &self.weights)
            .finish()
    }
}

impl CompositeSignalProvider {
    /// Equal weights when `weights` is `None`.
    pub fn new(
        providers: Vec<Box<dyn SignalProvider>>,
        weights: Option<Vec<f64>>,
    ) -> Result<Self, BacktestError> {
        if providers.is_empty() {
            return Err(BacktestError::InvalidConfiguration(
                "composite needs at least one provider".into(),
            ));
        }
        let n = providers.len();
        let weights = match weights {
            None => vec![1.0 / n as f64; n],
            Some(w) => {
                if w.len() != n {
                    return Err(BacktestError::InvalidConfiguration(format!(
                        "{} weights for {n} providers",
                        w.len()
                    )));
                }
                if w.iter().any(|x| !x.is_finite()) {
                    return Err(BacktestError::InvalidConfiguration(
                        "weights must be finite".into(),
                    ));
                }
                let sum: f64 = w.iter().sum();
                if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
                    return Err(BacktestError::InvalidConfiguration(format!(
                        "weights sum to {sum}, expected 1"
                    )));
                }
                w
            }
        };
        Ok(Self { providers, weights })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn providers(&self) -> &[Box<dyn SignalProvider>] {
        &self.providers
    }

    /// Constituent names, suffixed `#2`, `#3`… on repeats.
    pub fn constituent_keys(&self) -> Vec<String> {
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        self.providers
            .iter()
            .map(|p| {
                let count = seen.entry(p.name()).or_insert(0);
                *count += 1;
                if *count == 1 {
                    p.name().to_string()
                } else {
                    format!("{}#{}", p.name(), count)
                }
            })
            .collect()
    }
}

fn blend(outputs: &[IntentSeries], weights: &[f64], len: usize) -> Vec<PositionIntent> {
    (0..len)
        .map(|t| {
            let blended: f64 = outputs
                .iter()
                .zip(weights)
                .map(|(s, w)| w * s.intents[t].as_f64())
                .sum();
            if blended > VOTE_THRESHOLD {
                PositionIntent::Long
            } else if blended < -VOTE_THRESHOLD {
                PositionIntent::Short
            } else {
                PositionIntent::Flat
            }
        })
        .collect()
}

/// The degraded constituent with the largest shortfall, if any.
fn worst_status(outputs: &[IntentSeries]) -> SignalStatus {
    outputs
        .iter()
        .filter_map(|s| match s.status {
            SignalStatus::InsufficientHistory {
                required,
                available,
            } => Some((required.saturating_sub(available), s.status)),
            SignalStatus::Ready => None,
        })
        .max_by_key(|(shortfall, _)| *shortfall)
        .map(|(_, status)| status)
        .unwrap_or(SignalStatus::Ready)
}

impl SignalProvider for CompositeSignalProvider {
    fn name(&self) -> &str {
        "composite"
    }

    fn lookback(&self) -> usize {
        self.providers.iter().map(|p| p.lookback()).max().unwrap_or(0)
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<IntentSeries, BacktestError> {
        let outputs = self
            .providers
            .iter()
            .map(|p| p.generate_signals(series))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(bad) = outputs.iter().position(|s| s.len() != series.len()) {
            return Err(BacktestError::InvalidInput(format!(
                "constituent '{}' returned {} intents for {} bars",
                self.providers[bad].name(),
                outputs[bad].len(),
                series.len()
            )));
        }
        Ok(IntentSeries {
            intents: blend(&outputs, &self.weights, series.len()),
            status: worst_status(&outputs),
        })
    }

    /// Runs the blend, then every constituent on its own in parallel.
    fn backtest(
        &self,
        series: &PriceSeries,
        config: &SimulatorConfig,
    ) -> Result<BacktestResult, BacktestError> {
        let signals = self.generate_signals(series)?;
        let composite = TradeSimulator::new(*config).run(self.name(), series, &signals)?;

        let results = self
            .providers
            .par_iter()
            .map(|p| p.backtest(series, config))
            .collect::<Result<Vec<_>, _>>()?;
        let constituents: BTreeMap<String, BacktestResult> =
            self.constituent_keys().into_iter().zip(results).collect();

        tracing::debug!(
            constituents = constituents.len(),
            total_return = composite.metrics.total_return,
            "composite backtest complete"
        );
        Ok(composite.with_constituents(constituents))
    }
}
