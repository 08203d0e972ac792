//! Market data collaborators for the runner.
//!
//! A [`DataProvider`] turns `(symbol, start, end)` into a validated
//! [`PriceSeries`] or fails as a whole; partial series are never returned.
//! Provided implementations:
//! - [`CsvProvider`]: a directory of `<SYMBOL>.csv` files
//! - [`SyntheticProvider`]: seeded random walk for offline runs
//! - [`RetryingProvider`]: wraps any provider with bounded exponential backoff

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use thiserror::Error;

use tradelab_core::{Bar, BacktestError, PriceSeries};

/// Errors from the data layer.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no data for '{symbol}' at {path}")]
    NotFound { symbol: String, path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parse error in row {row}: {reason}")]
    Parse { row: usize, reason: String },

    #[error("no bars for '{symbol}' in the requested range")]
    Empty { symbol: String },

    #[error("invalid series for '{symbol}': {source}")]
    Invalid {
        symbol: String,
        #[source]
        source: BacktestError,
    },

    #[error("transient failure: {0}")]
    Transient(String),
}

impl DataError {
    /// Whether a retry might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Io(_))
    }
}

impl From<DataError> for BacktestError {
    fn from(e: DataError) -> Self {
        BacktestError::DataUnavailable(e.to_string())
    }
}

/// Source of daily bars for one symbol.
pub trait DataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Bars for `symbol` within `[start, end]` (either bound optional).
    fn fetch(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, DataError>;
}

fn in_range(date: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
}

fn finish(symbol: &str, bars: Vec<Bar>) -> Result<PriceSeries, DataError> {
    if bars.is_empty() {
        return Err(DataError::Empty {
            symbol: symbol.to_string(),
        });
    }
    PriceSeries::new(symbol, bars).map_err(|source| DataError::Invalid {
        symbol: symbol.to_string(),
        source,
    })
}

// ─── CSV ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

/// Reads `<dir>/<SYMBOL>.csv` with a `date,open,high,low,close,volume` header.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn read_bars(path: &Path) -> Result<Vec<Bar>, DataError> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut bars = Vec::new();
        for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row?;
            let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d").map_err(|e| {
                DataError::Parse {
                    row: i + 1,
                    reason: format!("bad date '{}': {e}", row.date),
                }
            })?;
            bars.push(Bar::new(date, row.open, row.high, row.low, row.close, row.volume));
        }
        Ok(bars)
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::NotFound {
                symbol: symbol.to_string(),
                path,
            });
        }
        let mut bars = Self::read_bars(&path)?;
        bars.retain(|b| in_range(b.date, start, end));
        bars.sort_by_key(|b| b.date);
        tracing::debug!(symbol, bars = bars.len(), path = %path.display(), "loaded csv");
        finish(symbol, bars)
    }
}

// ─── Synthetic ──────────────────────────────────────────────────────

/// Default window when a synthetic fetch has no explicit bounds.
const SYNTHETIC_DEFAULT_DAYS: i64 = 730;

/// Seeded random walk starting at 100.0, weekdays only.
///
/// The RNG seed mixes the provider seed with the symbol, so different
/// symbols diverge and repeated fetches are identical.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider {
    seed: u64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng_for(&self, symbol: &str) -> rand::rngs::StdRng {
        use rand::SeedableRng;
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        rand::rngs::StdRng::from_seed(*hasher.finalize().as_bytes())
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, DataError> {
        use rand::Rng;

        let (start, end) = match (start, end) {
            (Some(s), Some(e)) => (s, e),
            (Some(s), None) => (s, s + chrono::Duration::days(SYNTHETIC_DEFAULT_DAYS)),
            (None, Some(e)) => (e - chrono::Duration::days(SYNTHETIC_DEFAULT_DAYS), e),
            (None, None) => {
                let s = NaiveDate::from_ymd_opt(2020, 1, 1).ok_or_else(|| DataError::Empty {
                    symbol: symbol.to_string(),
                })?;
                (s, s + chrono::Duration::days(SYNTHETIC_DEFAULT_DAYS))
            }
        };

        let mut rng = self.rng_for(symbol);
        let mut bars = Vec::new();
        let mut price = 100.0_f64;
        let mut current = start;

        while current <= end {
            let weekday = current.weekday();
            if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
                current += chrono::Duration::days(1);
                continue;
            }

            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000.0..5_000_000.0_f64).round();

            bars.push(Bar::new(current, open, high, low, close, volume));
            price = close;
            current += chrono::Duration::days(1);
        }

        finish(symbol, bars)
    }
}

// ─── Retry wrapper ──────────────────────────────────────────────────

/// Retries transient failures of an inner provider.
///
/// Delay before attempt `k` (1-based) is `base_delay * 2^(k-1)`.
/// Non-transient errors are returned immediately.
pub struct RetryingProvider<P> {
    inner: P,
    max_retries: u32,
    base_delay: Duration,
}

impl<P: DataProvider> RetryingProvider<P> {
    pub fn new(inner: P, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            base_delay: Duration::from_millis(250),
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Backoff before 1-based `attempt`; saturates instead of overflowing.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32
            .checked_pow(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl<P: DataProvider> DataProvider for RetryingProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, DataError> {
        let mut attempt = 0u32;
        loop {
            if attempt > 0 {
                std::thread::sleep(self.delay_for(attempt));
            }
            match self.inner.fetch(symbol, start, end) {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        provider = self.inner.name(),
                        symbol,
                        attempt,
                        error = %e,
                        "transient data failure, retrying"
                    );
                }
                other => return other,
            }
        }
    }
}

/// Fetch through any provider, surfacing failure as a single
/// [`BacktestError::DataUnavailable`].
pub fn load_series(
    provider: &dyn DataProvider,
    symbol: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<PriceSeries, BacktestError> {
    provider.fetch(symbol, start, end).map_err(|e| {
        tracing::warn!(provider = provider.name(), symbol, error = %e, "data unavailable");
        BacktestError::from(e)
    })
}
