//! Portfolio weight optimizers.
//!
//! Optimizers take a returns matrix (one row per asset, columns aligned in
//! time) and return weights summing to 1. Progress is reported through the
//! callback passed to each call.

use tradelab_core::metrics::std_dev;
use tradelab_core::BacktestError;

/// Progress callback: `(assets_done, assets_total)`.
pub type Progress<'a> = &'a mut dyn FnMut(usize, usize);

pub trait PortfolioOptimizer: Send + Sync {
    fn name(&self) -> &str;

    fn optimize(
        &self,
        returns: &[Vec<f64>],
        risk_free_rate: f64,
        progress: Progress<'_>,
    ) -> Result<Vec<f64>, BacktestError>;
}

fn check_matrix(returns: &[Vec<f64>]) -> Result<(), BacktestError> {
    let Some(first) = returns.first() else {
        return Err(BacktestError::InvalidInput("returns matrix has no assets".into()));
    };
    if let Some((i, row)) = returns.iter().enumerate().find(|(_, r)| r.len() != first.len()) {
        return Err(BacktestError::InvalidInput(format!(
            "asset {i} has {} returns, expected {}",
            row.len(),
            first.len()
        )));
    }
    Ok(())
}

/// Weights proportional to 1 / volatility.
///
/// Assets with zero or non-finite volatility get weight 0; when no asset
/// has usable volatility the weights are equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct InverseVolatilityOptimizer;

impl PortfolioOptimizer for InverseVolatilityOptimizer {
    fn name(&self) -> &str {
        "inverse_volatility"
    }

    fn optimize(
        &self,
        returns: &[Vec<f64>],
        _risk_free_rate: f64,
        progress: Progress<'_>,
    ) -> Result<Vec<f64>, BacktestError> {
        check_matrix(returns)?;
        let total = returns.len();

        let mut inverse = Vec::with_capacity(total);
        for (i, row) in returns.iter().enumerate() {
            let vol = std_dev(row);
            inverse.push(if vol.is_finite() && vol > 0.0 { 1.0 / vol } else { 0.0 });
            progress(i + 1, total);
        }

        let sum: f64 = inverse.iter().sum();
        if sum > 0.0 && sum.is_finite() {
            Ok(inverse.iter().map(|w| w / sum).collect())
        } else {
            tracing::warn!(assets = total, "no asset has usable volatility, using equal weights");
            Ok(vec![1.0 / total as f64; total])
        }
    }
}
