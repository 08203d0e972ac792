//! Risk limits and tail-risk reporting.

use serde::{Deserialize, Serialize};

use crate::metrics::{drawdown_curve, finite_or_zero, max_drawdown, mean_f64, std_dev, TRADING_DAYS_PER_YEAR};

/// Threshold predicates over prices, positions, and equity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Largest position as a fraction of portfolio value.
    pub max_position_size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub max_drawdown: f64,
    /// Largest acceptable one-period 95% VaR loss, as a positive fraction.
    pub var_limit: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_size: 0.2,
            stop_loss: 0.05,
            take_profit: 0.1,
            max_drawdown: 0.2,
            var_limit: 0.02,
        }
    }
}

impl RiskLimits {
    /// True once the price has fallen `stop_loss` below entry.
    pub fn check_stop_loss(&self, entry_price: f64, current_price: f64) -> bool {
        entry_price > 0.0 && (entry_price - current_price) / entry_price >= self.stop_loss
    }

    /// True once the price has risen `take_profit` above entry.
    pub fn check_take_profit(&self, entry_price: f64, current_price: f64) -> bool {
        entry_price > 0.0 && (current_price - entry_price) / entry_price >= self.take_profit
    }

    /// True while the position stays within its share of the portfolio.
    pub fn check_position_size(&self, position_value: f64, portfolio_value: f64) -> bool {
        portfolio_value > 0.0 && position_value / portfolio_value <= self.max_position_size
    }

    /// True while the curve's worst drawdown stays within the limit.
    pub fn check_drawdown(&self, equity_curve: &[f64]) -> bool {
        max_drawdown(&drawdown_curve(equity_curve)) <= self.max_drawdown
    }

    /// True while the 95% VaR loss stays within `var_limit`.
    pub fn check_var(&self, returns: &[f64]) -> bool {
        -value_at_risk(returns, 0.95) <= self.var_limit
    }
}

// ─── Tail-risk report ───────────────────────────────────────────────

/// Distribution statistics of period returns.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskReport {
    pub var_95: f64,
    pub cvar_95: f64,
    pub annualized_volatility: f64,
    pub skewness: f64,
    pub excess_kurtosis: f64,
    pub sortino_ratio: f64,
}

impl RiskReport {
    pub fn from_returns(returns: &[f64], risk_free_rate: f64) -> Self {
        if returns.is_empty() {
            return Self::default();
        }
        Self {
            var_95: finite_or_zero(value_at_risk(returns, 0.95)),
            cvar_95: finite_or_zero(conditional_value_at_risk(returns, 0.95)),
            annualized_volatility: finite_or_zero(std_dev(returns) * TRADING_DAYS_PER_YEAR.sqrt()),
            skewness: finite_or_zero(skewness(returns)),
            excess_kurtosis: finite_or_zero(excess_kurtosis(returns)),
            sortino_ratio: finite_or_zero(sortino_ratio(returns, risk_free_rate)),
        }
    }
}

/// Linear-interpolated percentile, `q` in [0, 1].
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Historical VaR: the `(1 - confidence)` return quantile (negative = loss).
pub fn value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    percentile(returns, 1.0 - confidence)
}

/// Mean of returns at or below the VaR quantile.
pub fn conditional_value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    let var = value_at_risk(returns, confidence);
    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= var).collect();
    mean_f64(&tail)
}

fn central_moment(values: &[f64], mean: f64, k: i32) -> f64 {
    values.iter().map(|v| (v - mean).powi(k)).sum::<f64>() / values.len() as f64
}

/// Bias-corrected sample skewness; 0 with fewer than 3 values.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 3 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let m2 = central_moment(values, mean, 2);
    if m2 == 0.0 {
        return 0.0;
    }
    let g1 = central_moment(values, mean, 3) / m2.powf(1.5);
    (n * (n - 1.0)).sqrt() / (n - 2.0) * g1
}

/// Bias-corrected sample excess kurtosis; 0 with fewer than 4 values.
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 4 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let m2 = central_moment(values, mean, 2);
    if m2 == 0.0 {
        return 0.0;
    }
    let g2 = central_moment(values, mean, 4) / (m2 * m2) - 3.0;
    ((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0))
}

/// Annualized mean excess return over annualized downside deviation.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    let daily_rf = (1.0 + risk_free_rate).powf(1.0 / TRADING_DAYS_PER_YEAR) - 1.0;
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let downside_std = std_dev(&downside) * TRADING_DAYS_PER_YEAR.sqrt();
    if downside_std == 0.0 {
        return 0.0;
    }
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    mean_f64(&excess) * TRADING_DAYS_PER_YEAR / downside_std
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_loss_and_take_profit_thresholds() {
        let limits = RiskLimits::default();
        assert!(limits.check_stop_loss(100.0, 95.0));
        assert!(!limits.check_stop_loss(100.0, 96.0));
        assert!(limits.check_take_profit(100.0, 110.0));
        assert!(!limits.check_take_profit(100.0, 109.0));
        assert!(!limits.check_stop_loss(0.0, -1.0));
    }

    #[test]
    fn position_size_limit() {
        let limits = RiskLimits::default();
        assert!(limits.check_position_size(20_000.0, 100_000.0));
        assert!(!limits.check_position_size(20_001.0, 100_000.0));
        assert!(!limits.check_position_size(1.0, 0.0));
    }

    #[test]
    fn drawdown_limit() {
        let limits = RiskLimits::default();
        assert!(limits.check_drawdown(&[100.0, 120.0, 100.0]));
        assert!(!limits.check_drawdown(&[100.0, 120.0, 90.0]));
    }

    #[test]
    fn percentile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((percentile(&v, 0.5) - 3.0).abs() < 1e-12);
        assert!((percentile(&v, 0.1) - 1.4).abs() < 1e-12);
        assert!((percentile(&v, 1.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn var_and_cvar_on_known_tail() {
        let mut returns = vec![0.01; 19];
        returns.push(-0.10);
        // 5th percentile: rank 0.95 between -0.10 and 0.01
        let var = value_at_risk(&returns, 0.95);
        assert!((var - (-0.10 + 0.11 * 0.95)).abs() < 1e-12);
        let cvar = conditional_value_at_risk(&returns, 0.95);
        assert!((cvar + 0.10).abs() < 1e-12);
        // A single outlier in twenty leaves the quantile at +0.0045.
        assert!(RiskLimits::default().check_var(&returns));
    }

    #[test]
    fn var_limit_breached_by_heavy_tail() {
        let mut returns = vec![0.01; 8];
        returns.extend([-0.05, -0.04]);
        // rank 0.45 between -0.05 and -0.04
        assert!((value_at_risk(&returns, 0.95) + 0.0455).abs() < 1e-12);
        assert!(!RiskLimits::default().check_var(&returns));
    }

    #[test]
    fn symmetric_returns_have_zero_skew() {
        let returns = [-0.02, -0.01, 0.0, 0.01, 0.02];
        assert!(skewness(&returns).abs() < 1e-12);
    }

    #[test]
    fn left_tail_is_negatively_skewed() {
        let returns = [0.01, 0.01, 0.01, 0.01, -0.05];
        assert!(skewness(&returns) < 0.0);
        assert!(excess_kurtosis(&returns) > 0.0);
    }

    #[test]
    fn sortino_zero_without_downside() {
        assert_eq!(sortino_ratio(&[0.01, 0.02, 0.03], 0.02), 0.0);
    }

    #[test]
    fn report_is_finite_and_empty_safe() {
        assert_eq!(RiskReport::from_returns(&[], 0.02), RiskReport::default());
        let r = RiskReport::from_returns(&[0.0, 0.01, -0.02, 0.015, -0.005, 0.0], 0.02);
        assert!(r.var_95 < 0.0);
        assert!(r.annualized_volatility > 0.0);
        assert!(r.sortino_ratio.is_finite());
    }
}
