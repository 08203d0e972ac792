//! Bar and PriceSeries: the market data units consumed by the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::BacktestError;

/// OHLCV bar for a single instrument on a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Close-only bar (open = high = low = close). Handy for close-driven tests.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self::new(date, close, close, close, close, 0.0)
    }

    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Bullish candle: close above open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Bearish candle: close below open.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Time-ordered bars for one instrument.
///
/// Only constructible through [`PriceSeries::new`], which enforces:
/// non-empty, strictly increasing dates, finite positive closes.
/// Deserialization goes through the same checks. Immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPriceSeries")]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

#[derive(Deserialize)]
struct RawPriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl TryFrom<RawPriceSeries> for PriceSeries {
    type Error = BacktestError;

    fn try_from(raw: RawPriceSeries) -> Result<Self, Self::Error> {
        Self::new(raw.symbol, raw.bars)
    }
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BacktestError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(BacktestError::InvalidInput(format!(
                "price series for '{symbol}' is empty"
            )));
        }
        for (i, bar) in bars.iter().enumerate() {
            if !bar.close.is_finite() || bar.close <= 0.0 {
                return Err(BacktestError::InvalidInput(format!(
                    "bar {i} ({}) has non-positive or non-finite close {}",
                    bar.date, bar.close
                )));
            }
        }
        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(BacktestError::InvalidInput(format!(
                    "dates must be strictly increasing: bar {} ({}) follows {}",
                    i + 1,
                    pair[1].date,
                    pair[0].date
                )));
            }
        }
        Ok(Self { symbol, bars })
    }

    /// Build a series from closes on consecutive calendar days starting at `start`.
    pub fn from_closes(
        symbol: impl Into<String>,
        start: NaiveDate,
        closes: &[f64],
    ) -> Result<Self, BacktestError> {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::from_close(start + chrono::Duration::days(i as i64), c))
            .collect();
        Self::new(symbol, bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// Prefix of the series (first `len` bars). Used by look-ahead tests.
    pub fn truncated(&self, len: usize) -> Result<Self, BacktestError> {
        Self::new(self.symbol.clone(), self.bars[..len.min(self.bars.len())].to_vec())
    }
}
