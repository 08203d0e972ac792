//! Serializable backtest configuration (TOML).
//!
//! ```toml
//! symbol = "AAPL"
//! start = "2022-01-03"
//! initial_capital = 100000.0
//! commission_rate = 0.0003
//!
//! [data]
//! source = "csv"
//! dir = "data"
//!
//! [strategy]
//! id = "moving_average"
//! params = { short_window = 5, long_window = 20 }
//! ```
//!
//! Either `[strategy]` or `[composite]` must be present, not both.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradelab_core::risk::{CostSchedule, MarketType, SizingPolicy};
use tradelab_core::{
    BacktestError, CompositeSignalProvider, SignalProvider, SimulatorConfig, StrategyRegistry,
};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

fn default_initial_capital() -> f64 {
    100_000.0
}

fn default_commission_rate() -> f64 {
    0.0003
}

fn default_risk_free_rate() -> f64 {
    0.02
}

fn default_max_retries() -> u32 {
    2
}

/// Upper bound on `max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// One strategy by registry id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySpec {
    pub id: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl StrategySpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn build(&self, registry: &StrategyRegistry) -> Result<Box<dyn SignalProvider>, BacktestError> {
        registry.create(&self.id, &self.params)
    }
}

/// Weighted vote over several strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSpec {
    pub members: Vec<StrategySpec>,
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
}

impl CompositeSpec {
    pub fn build(&self, registry: &StrategyRegistry) -> Result<CompositeSignalProvider, BacktestError> {
        let providers = self
            .members
            .iter()
            .map(|m| m.build(registry))
            .collect::<Result<Vec<_>, _>>()?;
        CompositeSignalProvider::new(providers, self.weights.clone())
    }
}

/// Where bars come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DataConfig {
    /// Directory of `<SYMBOL>.csv` files.
    Csv { dir: PathBuf },
    /// Seeded random walk, for offline runs.
    Synthetic {
        #[serde(default)]
        seed: u64,
    },
}

impl Default for DataConfig {
    fn default() -> Self {
        Self::Csv {
            dir: PathBuf::from("data"),
        }
    }
}

/// Complete configuration for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub symbol: String,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    #[serde(default = "default_commission_rate")]
    pub commission_rate: f64,
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    /// Market fee preset; replaces the flat commission when set.
    #[serde(default)]
    pub market: Option<MarketType>,
    #[serde(default)]
    pub sizing: Option<SizingPolicy>,
    #[serde(default)]
    pub data: DataConfig,
    /// Retries for transient data failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub strategy: Option<StrategySpec>,
    #[serde(default)]
    pub composite: Option<CompositeSpec>,
}

impl BacktestConfig {
    /// Minimal config for a single registered strategy.
    pub fn for_strategy(symbol: impl Into<String>, strategy: StrategySpec) -> Self {
        Self {
            symbol: symbol.into(),
            start: None,
            end: None,
            initial_capital: default_initial_capital(),
            commission_rate: default_commission_rate(),
            risk_free_rate: default_risk_free_rate(),
            market: None,
            sizing: None,
            data: DataConfig::default(),
            max_retries: default_max_retries(),
            strategy: Some(strategy),
            composite: None,
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        match (&self.strategy, &self.composite) {
            (None, None) => {
                return Err(ConfigError::Invalid(
                    "one of [strategy] or [composite] is required".into(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(ConfigError::Invalid(
                    "[strategy] and [composite] are mutually exclusive".into(),
                ))
            }
            _ => {}
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(ConfigError::Invalid(format!(
                    "start {start} is after end {end}"
                )));
            }
        }
        if !self.commission_rate.is_finite() || self.commission_rate < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "commission_rate must be a non-negative number, got {}",
                self.commission_rate
            )));
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_retries must be at most {MAX_RETRIES_LIMIT}, got {}",
                self.max_retries
            )));
        }
        Ok(())
    }

    pub fn cost_schedule(&self) -> CostSchedule {
        match self.market {
            Some(market) => CostSchedule::for_market(market),
            None => CostSchedule::flat(self.commission_rate),
        }
    }

    pub fn simulator_config(&self) -> SimulatorConfig {
        SimulatorConfig {
            initial_capital: self.initial_capital,
            risk_free_rate: self.risk_free_rate,
            cost_schedule: self.cost_schedule(),
            sizing: self.sizing.unwrap_or_default(),
        }
    }

    /// Build the configured provider: a single strategy or the composite.
    pub fn build_provider(
        &self,
        registry: &StrategyRegistry,
    ) -> Result<Box<dyn SignalProvider>, BacktestError> {
        match (&self.strategy, &self.composite) {
            (Some(spec), _) => spec.build(registry),
            (None, Some(composite)) => Ok(Box::new(composite.build(registry)?)),
            (None, None) => Err(BacktestError::InvalidConfiguration(
                "no strategy configured".into(),
            )),
        }
    }

    /// Deterministic BLAKE3 hash over the canonical JSON form.
    ///
    /// Two runs with identical configs share a `RunId`.
    pub fn run_id(&self) -> RunId {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&canonical).to_hex().to_string()
    }
}
