//! Model-backed signal adapter.
//!
//! [`ModelSignal`] wraps any [`Predictor`] behind the [`SignalProvider`]
//! trait. Features at bar t are the trailing `lookback_period` one-bar
//! returns ending at t; the label is the next bar's direction (classifier)
//! or return (regressor).
//!
//! Walk-forward split: the predictor is fitted on rows whose label lies
//! inside the first `train_fraction` of the series, then predicts the
//! out-of-sample remainder. In-sample bars are always flat. Training rows
//! never see a bar at or after the first traded bar.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::domain::{IntentSeries, PositionIntent, PriceSeries};
use crate::error::BacktestError;

use super::{insufficient_history, SignalProvider};

/// Fewest training rows a model is fitted on.
pub const MIN_TRAIN_ROWS: usize = 10;

/// What a predictor learns to output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// +1 / -1 next-bar direction; predictions map by sign.
    Direction,
    /// Next-bar return; predictions map through a dead zone.
    Return,
}

/// A trainable model. Implementations must be deterministic for a given
/// seed and training set.
pub trait Predictor: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn target(&self) -> Target;

    fn fit(&mut self, features: &[Vec<f64>], labels: &[f64]) -> Result<(), BacktestError>;

    fn predict(&self, features: &[f64]) -> f64;
}

fn check_training_set(features: &[Vec<f64>], labels: &[f64]) -> Result<usize, BacktestError> {
    if features.is_empty() || features.len() != labels.len() {
        return Err(BacktestError::InvalidInput(format!(
            "training set has {} rows and {} labels",
            features.len(),
            labels.len()
        )));
    }
    let dim = features[0].len();
    if features.iter().any(|row| row.len() != dim) {
        return Err(BacktestError::InvalidInput(
            "training rows have inconsistent width".into(),
        ));
    }
    if features.iter().flatten().chain(labels).any(|v| !v.is_finite()) {
        return Err(BacktestError::InvalidInput(
            "training set contains non-finite values".into(),
        ));
    }
    Ok(dim)
}

fn dot(w: &[f64], x: &[f64]) -> f64 {
    w.iter().zip(x).map(|(a, b)| a * b).sum()
}

// ─── Perceptron ─────────────────────────────────────────────────────

/// Linear classifier trained with the perceptron rule.
#[derive(Debug, Clone)]
pub struct Perceptron {
    pub epochs: usize,
    pub learning_rate: f64,
    pub seed: u64,
    weights: Vec<f64>,
    bias: f64,
}

impl Perceptron {
    pub fn new(epochs: usize, learning_rate: f64, seed: u64) -> Self {
        Self {
            epochs,
            learning_rate,
            seed,
            weights: Vec::new(),
            bias: 0.0,
        }
    }
}

impl Predictor for Perceptron {
    fn name(&self) -> &str {
        "perceptron"
    }

    fn target(&self) -> Target {
        Target::Direction
    }

    fn fit(&mut self, features: &[Vec<f64>], labels: &[f64]) -> Result<(), BacktestError> {
        let dim = check_training_set(features, labels)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.weights = (0..dim).map(|_| rng.gen_range(-0.01..0.01)).collect();
        self.bias = 0.0;

        let mut order: Vec<usize> = (0..features.len()).collect();
        for epoch in 0..self.epochs {
            order.shuffle(&mut rng);
            let mut mistakes = 0usize;
            for &i in &order {
                let y = labels[i];
                let x = &features[i];
                if y * (dot(&self.weights, x) + self.bias) <= 0.0 {
                    for (w, xi) in self.weights.iter_mut().zip(x) {
                        *w += self.learning_rate * y * xi;
                    }
                    self.bias += self.learning_rate * y;
                    mistakes += 1;
                }
            }
            if mistakes == 0 {
                tracing::debug!(epoch, "perceptron converged");
                break;
            }
        }
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> f64 {
        dot(&self.weights, features) + self.bias
    }
}

// ─── Linear regression ──────────────────────────────────────────────

/// Least-squares regressor trained by stochastic gradient descent.
#[derive(Debug, Clone)]
pub struct LinearRegression {
    pub epochs: usize,
    pub learning_rate: f64,
    pub seed: u64,
    weights: Vec<f64>,
    bias: f64,
}

impl LinearRegression {
    pub fn new(epochs: usize, learning_rate: f64, seed: u64) -> Self {
        Self {
            epochs,
            learning_rate,
            seed,
            weights: Vec::new(),
            bias: 0.0,
        }
    }
}

impl Predictor for LinearRegression {
    fn name(&self) -> &str {
        "linear_regression"
    }

    fn target(&self) -> Target {
        Target::Return
    }

    fn fit(&mut self, features: &[Vec<f64>], labels: &[f64]) -> Result<(), BacktestError> {
        let dim = check_training_set(features, labels)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.weights = (0..dim).map(|_| rng.gen_range(-0.01..0.01)).collect();
        self.bias = 0.0;

        let mut order: Vec<usize> = (0..features.len()).collect();
        for _ in 0..self.epochs {
            order.shuffle(&mut rng);
            for &i in &order {
                let x = &features[i];
                let err = dot(&self.weights, x) + self.bias - labels[i];
                for (w, xi) in self.weights.iter_mut().zip(x) {
                    *w -= self.learning_rate * err * xi;
                }
                self.bias -= self.learning_rate * err;
            }
        }
        if self.weights.iter().any(|w| !w.is_finite()) || !self.bias.is_finite() {
            return Err(BacktestError::InvalidInput(format!(
                "regression diverged with learning_rate {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> f64 {
        dot(&self.weights, features) + self.bias
    }
}

// ─── Feature scaling ────────────────────────────────────────────────

/// Per-column z-scoring fitted on the training rows only.
#[derive(Debug, Clone)]
struct Standardizer {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl Standardizer {
    fn fit(rows: &[Vec<f64>]) -> Self {
        let dim = rows.first().map_or(0, Vec::len);
        let n = rows.len().max(1) as f64;
        let mut means = vec![0.0; dim];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v / n;
            }
        }
        let mut scales = vec![0.0; dim];
        for row in rows {
            for ((s, v), m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (v - m).powi(2) / n;
            }
        }
        for s in scales.iter_mut() {
            *s = if *s > 0.0 { s.sqrt() } else { 1.0 };
        }
        Self { means, scales }
    }

    fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((v, m), s)| (v - m) / s)
            .collect()
    }
}

// ─── Adapter ────────────────────────────────────────────────────────

/// Signal provider backed by a [`Predictor`].
///
/// The predictor passed in is a template: each call to `generate_signals`
/// fits a fresh clone, so the provider itself stays immutable and `Sync`.
#[derive(Debug, Clone)]
pub struct ModelSignal<P> {
    template: P,
    pub lookback_period: usize,
    pub train_fraction: f64,
    pub dead_zone: f64,
}

impl<P: Predictor + Clone> ModelSignal<P> {
    pub fn new(template: P, lookback_period: usize, train_fraction: f64) -> Self {
        Self {
            template,
            lookback_period,
            train_fraction,
            dead_zone: 0.0,
        }
    }

    /// Regressor predictions inside `[-dead_zone, dead_zone]` stay flat.
    pub fn with_dead_zone(mut self, dead_zone: f64) -> Self {
        self.dead_zone = dead_zone;
        self
    }

    fn train_end(&self, n: usize) -> usize {
        (n as f64 * self.train_fraction).floor() as usize
    }

    fn map_prediction(&self, pred: f64) -> PositionIntent {
        match self.template.target() {
            Target::Direction => PositionIntent::from_sign(pred),
            Target::Return => {
                if pred > self.dead_zone {
                    PositionIntent::Long
                } else if pred < -self.dead_zone {
                    PositionIntent::Short
                } else {
                    PositionIntent::Flat
                }
            }
        }
    }
}

impl<P: Predictor + Clone> SignalProvider for ModelSignal<P> {
    fn name(&self) -> &str {
        self.template.name()
    }

    fn lookback(&self) -> usize {
        let needed = (self.lookback_period + MIN_TRAIN_ROWS + 1) as f64;
        (needed / self.train_fraction).ceil() as usize + 1
    }

    fn generate_signals(&self, series: &PriceSeries) -> Result<IntentSeries, BacktestError> {
        if let Some(flat) = insufficient_history(series, self.lookback()) {
            return Ok(flat);
        }
        let closes = series.closes();
        let n = closes.len();
        let lb = self.lookback_period;

        let mut returns = vec![0.0; n];
        for t in 1..n {
            returns[t] = closes[t] / closes[t - 1] - 1.0;
        }
        let window = |t: usize| returns[t + 1 - lb..=t].to_vec();

        let train_end = self.train_end(n);
        let rows: Vec<usize> = (lb..train_end.saturating_sub(1)).collect();
        if rows.len() < MIN_TRAIN_ROWS {
            return Ok(IntentSeries::insufficient(self.lookback(), n));
        }

        let raw: Vec<Vec<f64>> = rows.iter().map(|&t| window(t)).collect();
        let scaler = Standardizer::fit(&raw);
        let features: Vec<Vec<f64>> = raw.iter().map(|r| scaler.transform(r)).collect();
        let labels: Vec<f64> = rows
            .iter()
            .map(|&t| match self.template.target() {
                Target::Direction if returns[t + 1] > 0.0 => 1.0,
                Target::Direction => -1.0,
                Target::Return => returns[t + 1],
            })
            .collect();

        let mut model = self.template.clone();
        model
            .fit(&features, &labels)
            .map_err(|e| BacktestError::provider(self.name(), e))?;

        let mut intents = vec![PositionIntent::Flat; n];
        for (t, intent) in intents.iter_mut().enumerate().skip(train_end) {
            let pred = model.predict(&scaler.transform(&window(t)));
            *intent = self.map_prediction(pred);
        }

        tracing::debug!(
            model = self.name(),
            train_rows = rows.len(),
            predicted = n - train_end,
            "model signal generated"
        );
        Ok(IntentSeries::ready(intents))
    }
}
