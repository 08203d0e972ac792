//! Concrete indicator implementations.
//!
//! Every indicator implements the `Indicator` trait from `components::indicator`
//! and is computed once over the full bar series by the provider that owns it.
//!
//! Multi-series indicators (Bollinger, Donchian, MACD) are exposed as
//! separate named instances per line, keeping the single-series `Indicator`
//! trait unchanged.

pub mod bollinger;
pub mod donchian;
pub mod ema;
pub mod macd;
pub mod momentum;
pub mod rsi;
pub mod sma;

pub use bollinger::{Bollinger, BollingerBand};
pub use donchian::{Donchian, DonchianBand};
pub use ema::Ema;
pub use macd::{Macd, MacdLine};
pub use momentum::Momentum;
pub use rsi::Rsi;
pub use sma::Sma;

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar::new(
                base_date + chrono::Duration::days(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
