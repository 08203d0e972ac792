//! Performance metrics: pure functions that score a simulated run.
//!
//! Every metric is a pure function of period returns, the equity curve, and
//! the trade ledger. No metric ever returns NaN or infinity: degenerate
//! inputs (no trades, zero variance, a single bar) score 0.0.

use serde::{Deserialize, Serialize};

use crate::domain::Trade;

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Volatility at or below this is treated as zero.
pub const VOLATILITY_EPSILON: f64 = 1e-12;

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub total_return: f64,
    pub annual_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_loss_ratio: f64,
    /// Completed round trips (number of sells).
    pub trades_count: usize,
}

/// Stateless evaluator; the struct exists so callers can hold it next to a
/// simulator and swap it in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceEvaluator;

impl PerformanceEvaluator {
    /// `period_returns[0]` is the placeholder for the first bar, which has
    /// no prior close; it is excluded from volatility.
    pub fn evaluate(
        &self,
        period_returns: &[f64],
        equity_curve: &[f64],
        trades: &[Trade],
        initial_capital: f64,
        risk_free_rate: f64,
    ) -> Metrics {
        let total = total_return(equity_curve, initial_capital);
        let annual = annual_return(total, equity_curve.len());
        let vol = volatility(realized_returns(period_returns));
        Metrics {
            total_return: total,
            annual_return: annual,
            volatility: vol,
            sharpe_ratio: sharpe_ratio(annual, vol, risk_free_rate),
            max_drawdown: max_drawdown(&drawdown_curve(equity_curve)),
            win_rate: win_rate(trades),
            profit_loss_ratio: profit_loss_ratio(trades),
            trades_count: trades.iter().filter(|t| t.is_sell()).count(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// NaN and infinities collapse to 0.0.
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Total return as a fraction: final equity / initial capital - 1.
pub fn total_return(equity_curve: &[f64], initial_capital: f64) -> f64 {
    match equity_curve.last() {
        Some(&last) if initial_capital > 0.0 => finite_or_zero(last / initial_capital - 1.0),
        _ => 0.0,
    }
}

/// Annualized return, assuming 252 trading days per year and one bar per day.
pub fn annual_return(total_return: f64, trading_days: usize) -> f64 {
    if trading_days == 0 {
        return 0.0;
    }
    let exponent = TRADING_DAYS_PER_YEAR / trading_days as f64;
    finite_or_zero((1.0 + total_return).powf(exponent) - 1.0)
}

/// Returns from bar 1 onward. Bar 0 has no prior close, so its zero is
/// not an observation.
pub fn realized_returns(period_returns: &[f64]) -> &[f64] {
    period_returns.get(1..).unwrap_or(&[])
}

/// Annualized volatility: sample stddev of returns × √252.
/// Zero with fewer than two returns or when the returns are constant.
pub fn volatility(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let vol = finite_or_zero(std_dev(returns) * TRADING_DAYS_PER_YEAR.sqrt());
    if vol <= VOLATILITY_EPSILON {
        0.0
    } else {
        vol
    }
}

/// (annual_return - rf) / volatility; 0.0 when volatility is zero.
pub fn sharpe_ratio(annual_return: f64, volatility: f64, risk_free_rate: f64) -> f64 {
    if volatility.abs() <= VOLATILITY_EPSILON {
        return 0.0;
    }
    finite_or_zero((annual_return - risk_free_rate) / volatility)
}

/// Running drawdown from peak: `1 - equity / max(equity so far)`, in [0, 1].
pub fn drawdown_curve(equity_curve: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    equity_curve
        .iter()
        .map(|&eq| {
            if eq > peak {
                peak = eq;
            }
            if peak > 0.0 {
                finite_or_zero(1.0 - eq / peak).clamp(0.0, 1.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// Largest drawdown as a positive fraction (0.15 = 15% below peak).
pub fn max_drawdown(drawdown_curve: &[f64]) -> f64 {
    drawdown_curve.iter().copied().fold(0.0, f64::max)
}

fn sell_profits(trades: &[Trade]) -> impl Iterator<Item = f64> + '_ {
    trades
        .iter()
        .filter(|t| t.is_sell())
        .filter_map(|t| t.realized_profit)
}

/// Fraction of sells that closed at a profit.
pub fn win_rate(trades: &[Trade]) -> f64 {
    let sells = trades.iter().filter(|t| t.is_sell()).count();
    if sells == 0 {
        return 0.0;
    }
    let winners = sell_profits(trades).filter(|p| *p > 0.0).count();
    winners as f64 / sells as f64
}

/// Mean winning profit over the absolute mean losing profit.
/// Zero without losing trades.
pub fn profit_loss_ratio(trades: &[Trade]) -> f64 {
    let wins: Vec<f64> = sell_profits(trades).filter(|p| *p > 0.0).collect();
    let losses: Vec<f64> = sell_profits(trades).filter(|p| *p < 0.0).collect();
    if losses.is_empty() {
        return 0.0;
    }
    let avg_loss = mean_f64(&losses).abs();
    if avg_loss == 0.0 {
        return 0.0;
    }
    finite_or_zero(mean_f64(&wins) / avg_loss)
}

// ─── Helpers ────────────────────────────────────────────────────────

pub fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn round_trip(day: u32, buy: f64, sell: f64) -> [Trade; 2] {
        [
            Trade::buy(d(day), buy, 1.0, 0.0),
            Trade::sell(d(day + 1), sell, 1.0, buy, 0.0),
        ]
    }

    // ─── total / annual return ──────────────────────────────────────

    #[test]
    fn total_return_against_initial_capital() {
        assert!((total_return(&[100.0, 110.0, 120.0], 100.0) - 0.2).abs() < 1e-12);
        assert_eq!(total_return(&[], 100.0), 0.0);
        assert_eq!(total_return(&[100.0], 0.0), 0.0);
    }

    #[test]
    fn annual_return_one_year_equals_total() {
        assert!((annual_return(0.1, 252) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn annual_return_half_year_compounds() {
        // 10% in 126 days → 1.1^2 - 1 = 21%
        assert!((annual_return(0.1, 126) - 0.21).abs() < 1e-12);
    }

    #[test]
    fn annual_return_total_loss() {
        assert!((annual_return(-1.0, 100) + 1.0).abs() < 1e-12);
        assert_eq!(annual_return(-2.0, 100), 0.0);
    }

    // ─── volatility / sharpe ────────────────────────────────────────

    #[test]
    fn volatility_zero_for_constant_returns() {
        assert_eq!(volatility(&[0.01; 10]), 0.0);
        assert_eq!(volatility(&[0.05]), 0.0);
    }

    #[test]
    fn volatility_is_annualized_sample_stddev() {
        // sample sd of [0, 0.02] = 0.014142...
        let v = volatility(&[0.0, 0.02]);
        assert!((v - 0.02f64.sqrt() * 0.1 * 252f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn sharpe_zero_without_volatility() {
        assert_eq!(sharpe_ratio(0.5, 0.0, 0.02), 0.0);
        assert_eq!(sharpe_ratio(0.5, 3e-17, 0.02), 0.0);
        assert!((sharpe_ratio(0.22, 0.2, 0.02) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn evaluate_constant_returns_has_zero_sharpe() {
        let returns = [0.01; 10];
        let equity: Vec<f64> = (0..10).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let m = PerformanceEvaluator.evaluate(&returns, &equity, &[], 100.0, 0.02);
        assert_eq!(m.volatility, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert!(m.total_return > 0.0);
    }

    #[test]
    fn realized_returns_skip_first_bar() {
        assert_eq!(realized_returns(&[0.0, 0.1, -0.1]), &[0.1, -0.1]);
        assert!(realized_returns(&[0.0]).is_empty());
        assert!(realized_returns(&[]).is_empty());
    }

    #[test]
    fn evaluate_excludes_first_bar_from_volatility() {
        // sample sd of [0.01, 0.03] = 0.0141421...
        let m = PerformanceEvaluator.evaluate(
            &[0.0, 0.01, 0.03],
            &[100.0, 101.0, 104.03],
            &[],
            100.0,
            0.0,
        );
        assert!((m.volatility - 0.02f64.sqrt() * 0.1 * 252f64.sqrt()).abs() < 1e-12);
    }

    // ─── drawdown ───────────────────────────────────────────────────

    #[test]
    fn drawdown_tracks_running_peak() {
        let dd = drawdown_curve(&[100.0, 120.0, 90.0, 130.0, 117.0]);
        assert_eq!(dd[0], 0.0);
        assert_eq!(dd[1], 0.0);
        assert!((dd[2] - 0.25).abs() < 1e-12);
        assert_eq!(dd[3], 0.0);
        assert!((dd[4] - 0.1).abs() < 1e-12);
        assert!((max_drawdown(&dd) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn drawdown_clamped_for_negative_equity() {
        let dd = drawdown_curve(&[100.0, -50.0]);
        assert_eq!(dd[1], 1.0);
    }

    // ─── trade quality ──────────────────────────────────────────────

    #[test]
    fn win_rate_counts_profitable_sells() {
        let mut trades = Vec::new();
        trades.extend(round_trip(1, 100.0, 110.0));
        trades.extend(round_trip(3, 100.0, 90.0));
        trades.extend(round_trip(5, 100.0, 120.0));
        assert!((win_rate(&trades) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn win_rate_zero_without_sells() {
        assert_eq!(win_rate(&[Trade::buy(d(1), 100.0, 1.0, 0.0)]), 0.0);
        assert_eq!(win_rate(&[]), 0.0);
    }

    #[test]
    fn profit_loss_ratio_means() {
        let mut trades = Vec::new();
        trades.extend(round_trip(1, 100.0, 110.0)); // +10
        trades.extend(round_trip(3, 100.0, 130.0)); // +30
        trades.extend(round_trip(5, 100.0, 90.0)); // -10
        // mean win 20 / mean loss 10
        assert!((profit_loss_ratio(&trades) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn profit_loss_ratio_zero_without_losers() {
        let trades = round_trip(1, 100.0, 110.0);
        assert_eq!(profit_loss_ratio(&trades), 0.0);
    }

    // ─── evaluator ──────────────────────────────────────────────────

    #[test]
    fn evaluate_flat_run_is_all_zero() {
        let m = PerformanceEvaluator.evaluate(&[0.0; 5], &[1000.0; 5], &[], 1000.0, 0.02);
        assert_eq!(m, Metrics::default());
    }

    #[test]
    fn evaluate_counts_sells_only() {
        let mut trades = Vec::new();
        trades.extend(round_trip(1, 100.0, 110.0));
        trades.push(Trade::buy(d(5), 100.0, 1.0, 0.0));
        let m = PerformanceEvaluator.evaluate(&[0.0, 0.1], &[100.0, 110.0], &trades, 100.0, 0.0);
        assert_eq!(m.trades_count, 1);
        assert_eq!(m.win_rate, 1.0);
    }

    #[test]
    fn evaluate_outputs_are_finite() {
        let m = PerformanceEvaluator.evaluate(&[0.0, f64::NAN], &[1.0, f64::INFINITY], &[], 1.0, 0.0);
        for v in [
            m.total_return,
            m.annual_return,
            m.volatility,
            m.sharpe_ratio,
            m.max_drawdown,
            m.win_rate,
            m.profit_loss_ratio,
        ] {
            assert!(v.is_finite());
        }
    }
}
