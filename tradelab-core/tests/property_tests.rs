//! Property tests for simulator and composite invariants.
//!
//! Uses proptest to verify:
//! 1. Equity identity: equity[t] = capital × Π(1 + period_return)
//! 2. Trade pairing: buys and sells alternate, starting with a buy
//! 3. Metric boundedness: drawdown and win rate stay in [0, 1]
//! 4. Idempotence: identical inputs give identical results
//! 5. Weight normalization: off-unit weight sums are rejected

use chrono::NaiveDate;
use proptest::prelude::*;
use tradelab_core::components::signal::ReplaySignal;
use tradelab_core::domain::TradeSide;
use tradelab_core::{
    BacktestError, BacktestResult, CompositeSignalProvider, PriceSeries, SignalProvider,
    SimulatorConfig,
};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_run() -> impl Strategy<Value = (Vec<f64>, Vec<i8>)> {
    (2usize..120).prop_flat_map(|n| {
        (
            prop::collection::vec(50.0..150.0_f64, n),
            prop::collection::vec(-1i8..=1, n),
        )
    })
}

fn simulate(closes: &[f64], intents: &[i8]) -> BacktestResult {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let series = PriceSeries::from_closes("PROP", start, closes).unwrap();
    ReplaySignal::from_values("replay", intents)
        .backtest(&series, &SimulatorConfig::default())
        .unwrap()
}

proptest! {
    #[test]
    fn equity_follows_compounded_returns((closes, intents) in arb_run()) {
        let result = simulate(&closes, &intents);
        prop_assert_eq!(result.period_returns[0], 0.0);
        prop_assert_eq!(result.equity_curve[0], result.initial_capital);

        let mut equity = result.initial_capital;
        for t in 1..closes.len() {
            let expected = (closes[t] / closes[t - 1] - 1.0) * f64::from(intents[t - 1]);
            prop_assert!((result.period_returns[t] - expected).abs() < 1e-12);
            equity *= 1.0 + result.period_returns[t];
            prop_assert_eq!(result.equity_curve[t], equity);
        }
    }

    #[test]
    fn trades_alternate_buy_then_sell((closes, intents) in arb_run()) {
        let result = simulate(&closes, &intents);
        let mut open_price: Option<f64> = None;
        for trade in &result.trades {
            match trade.side {
                TradeSide::Buy => {
                    prop_assert!(open_price.is_none(), "buy while already long");
                    prop_assert!(trade.realized_profit.is_none());
                    open_price = Some(trade.price);
                }
                TradeSide::Sell => {
                    let entry = open_price.take();
                    prop_assert!(entry.is_some(), "sell without an open buy");
                    let expected = (trade.price - entry.unwrap_or(0.0)) * trade.size;
                    prop_assert_eq!(trade.realized_profit, Some(expected));
                }
            }
        }
        let sells = result.trades.iter().filter(|t| t.side == TradeSide::Sell).count();
        prop_assert_eq!(result.metrics.trades_count, sells);
    }

    #[test]
    fn metrics_are_bounded_and_finite((closes, intents) in arb_run()) {
        let m = simulate(&closes, &intents).metrics;
        prop_assert!((0.0..=1.0).contains(&m.max_drawdown));
        prop_assert!((0.0..=1.0).contains(&m.win_rate));
        for v in [m.total_return, m.annual_return, m.volatility, m.sharpe_ratio, m.profit_loss_ratio] {
            prop_assert!(v.is_finite());
        }
    }

    #[test]
    fn drawdown_curve_is_bounded((closes, intents) in arb_run()) {
        let result = simulate(&closes, &intents);
        prop_assert_eq!(result.drawdown_curve.len(), closes.len());
        prop_assert!(result.drawdown_curve.iter().all(|d| (0.0..=1.0).contains(d)));
    }

    #[test]
    fn identical_inputs_are_bit_identical((closes, intents) in arb_run()) {
        prop_assert_eq!(simulate(&closes, &intents), simulate(&closes, &intents));
    }

    #[test]
    fn unnormalized_weights_are_rejected(a in 0.0..1.0_f64, skew in 1e-5..0.5_f64) {
        let providers: Vec<Box<dyn SignalProvider>> = vec![
            Box::new(ReplaySignal::from_values("a", &[0])),
            Box::new(ReplaySignal::from_values("b", &[0])),
        ];
        let result = CompositeSignalProvider::new(providers, Some(vec![a, 1.0 - a + skew]));
        prop_assert!(matches!(result, Err(BacktestError::InvalidConfiguration(_))));
    }

    #[test]
    fn normalized_weights_are_accepted(a in 0.0..1.0_f64) {
        let providers: Vec<Box<dyn SignalProvider>> = vec![
            Box::new(ReplaySignal::from_values("a", &[0])),
            Box::new(ReplaySignal::from_values("b", &[0])),
        ];
        prop_assert!(CompositeSignalProvider::new(providers, Some(vec![a, 1.0 - a])).is_ok());
    }
}
