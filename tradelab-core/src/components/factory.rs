//! Strategy registry: strategy id + parameter map to a constructed provider.
//!
//! Every entry declares a parameter schema ({kind, min, max, default}) and
//! optional cross-field rules. `create` validates the full parameter set
//! before construction; providers never re-validate.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::BacktestError;

use super::signal::{
    BarUpDown, BollingerReversion, ChannelBreakout, ConsecutiveCloses, GreedyVote, InsideBar,
    LinearRegression, MaCrossover, MacdCrossover, ModelSignal, MomentumSign, OutsideBar,
    PatternBreakout, Perceptron, SignalProvider,
};

// ─── Schema types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Integer,
    Float,
}

/// Declared range and default for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl ParamSpec {
    const fn int(name: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name,
            kind: ParamKind::Integer,
            min,
            max,
            default,
        }
    }

    const fn float(name: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name,
            kind: ParamKind::Float,
            min,
            max,
            default,
        }
    }

    fn check(&self, value: f64) -> Result<(), BacktestError> {
        if !value.is_finite() {
            return Err(BacktestError::invalid_parameter(self.name, "must be finite"));
        }
        if self.kind == ParamKind::Integer && value.fract() != 0.0 {
            return Err(BacktestError::invalid_parameter(
                self.name,
                format!("must be an integer, got {value}"),
            ));
        }
        if value < self.min || value > self.max {
            return Err(BacktestError::invalid_parameter(
                self.name,
                format!("must be between {} and {}, got {value}", self.min, self.max),
            ));
        }
        Ok(())
    }
}

/// `greater` must be strictly larger than `lesser`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrossRule {
    pub greater: &'static str,
    pub lesser: &'static str,
}

/// Parameter set that passed validation, defaults filled in.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParamValues(BTreeMap<&'static str, f64>);

impl ParamValues {
    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    pub fn get_usize(&self, name: &str) -> usize {
        self.get(name) as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

type Builder = fn(&ParamValues) -> Box<dyn SignalProvider>;

/// One registry entry.
#[derive(Clone, Serialize)]
pub struct StrategyInfo {
    pub id: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
    pub rules: &'static [CrossRule],
    #[serde(skip)]
    build: Builder,
}

impl std::fmt::Debug for StrategyInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyInfo")
            .field("id", &self.id)
            .field("params", &self.params)
            .field("rules", &self.rules)
            .finish()
    }
}

impl StrategyInfo {
    /// Validate `params` against the schema, filling defaults.
    pub fn validate(&self, params: &BTreeMap<String, f64>) -> Result<ParamValues, BacktestError> {
        for name in params.keys() {
            if !self.params.iter().any(|spec| spec.name == name) {
                tracing::warn!(strategy = self.id, param = %name, "ignoring unknown parameter");
            }
        }

        let mut values = BTreeMap::new();
        for spec in self.params {
            let value = params.get(spec.name).copied().unwrap_or(spec.default);
            spec.check(value)?;
            values.insert(spec.name, value);
        }

        for rule in self.rules {
            let greater = values.get(rule.greater).copied().unwrap_or(0.0);
            let lesser = values.get(rule.lesser).copied().unwrap_or(0.0);
            if greater <= lesser {
                return Err(BacktestError::invalid_parameter(
                    rule.greater,
                    format!("must exceed {} ({greater} <= {lesser})", rule.lesser),
                ));
            }
        }
        Ok(ParamValues(values))
    }

    pub fn defaults(&self) -> ParamValues {
        ParamValues(self.params.iter().map(|s| (s.name, s.default)).collect())
    }
}

// ─── Registry table ─────────────────────────────────────────────────

const MA_PARAMS: &[ParamSpec] = &[
    ParamSpec::int("short_window", 2.0, 50.0, 5.0),
    ParamSpec::int("long_window", 5.0, 200.0, 20.0),
];
const BOLLINGER_PARAMS: &[ParamSpec] = &[
    ParamSpec::int("window", 5.0, 100.0, 20.0),
    ParamSpec::float("num_std", 0.1, 5.0, 2.0),
];
const MACD_PARAMS: &[ParamSpec] = &[
    ParamSpec::int("fast_period", 3.0, 50.0, 12.0),
    ParamSpec::int("slow_period", 5.0, 100.0, 26.0),
    ParamSpec::int("signal_period", 3.0, 50.0, 9.0),
];
const WINDOW_PARAMS: &[ParamSpec] = &[ParamSpec::int("window", 5.0, 100.0, 20.0)];
const CONSECUTIVE_PARAMS: &[ParamSpec] = &[ParamSpec::int("n_days", 2.0, 10.0, 3.0)];
const BAR_PARAMS: &[ParamSpec] = &[ParamSpec::int("n_bars", 2.0, 10.0, 3.0)];
const MOMENTUM_PARAMS: &[ParamSpec] = &[ParamSpec::int("lookback_period", 2.0, 100.0, 12.0)];
const GREEDY_PARAMS: &[ParamSpec] = &[
    ParamSpec::int("rsi_period", 5.0, 50.0, 14.0),
    ParamSpec::int("ma_short", 2.0, 50.0, 5.0),
    ParamSpec::int("ma_long", 5.0, 200.0, 20.0),
    ParamSpec::int("bb_period", 5.0, 100.0, 20.0),
    ParamSpec::float("bb_std", 0.1, 5.0, 2.0),
];
const PERCEPTRON_PARAMS: &[ParamSpec] = &[
    ParamSpec::int("lookback_period", 5.0, 100.0, 20.0),
    ParamSpec::int("epochs", 10.0, 500.0, 50.0),
    ParamSpec::float("learning_rate", 0.001, 1.0, 0.01),
    ParamSpec::float("train_fraction", 0.5, 0.9, 0.7),
    ParamSpec::int("seed", 0.0, 4_294_967_295.0, 42.0),
];
const REGRESSION_PARAMS: &[ParamSpec] = &[
    ParamSpec::int("lookback_period", 5.0, 100.0, 20.0),
    ParamSpec::int("epochs", 10.0, 500.0, 50.0),
    ParamSpec::float("learning_rate", 0.001, 1.0, 0.01),
    ParamSpec::float("train_fraction", 0.5, 0.9, 0.7),
    ParamSpec::int("seed", 0.0, 4_294_967_295.0, 42.0),
    ParamSpec::float("dead_zone", 0.0, 0.05, 0.0),
];

fn build_perceptron(p: &ParamValues) -> Box<dyn SignalProvider> {
    let model = Perceptron::new(p.get_usize("epochs"), p.get("learning_rate"), p.get("seed") as u64);
    Box::new(ModelSignal::new(
        model,
        p.get_usize("lookback_period"),
        p.get("train_fraction"),
    ))
}

fn build_linear_regression(p: &ParamValues) -> Box<dyn SignalProvider> {
    let model =
        LinearRegression::new(p.get_usize("epochs"), p.get("learning_rate"), p.get("seed") as u64);
    Box::new(
        ModelSignal::new(model, p.get_usize("lookback_period"), p.get("train_fraction"))
            .with_dead_zone(p.get("dead_zone")),
    )
}

fn standard_entries() -> Vec<StrategyInfo> {
    vec![
        StrategyInfo {
            id: "moving_average",
            description: "Fast/slow simple moving average crossover",
            params: MA_PARAMS,
            rules: &[CrossRule {
                greater: "long_window",
                lesser: "short_window",
            }],
            build: |p| Box::new(MaCrossover::new(p.get_usize("short_window"), p.get_usize("long_window"))),
        },
        StrategyInfo {
            id: "bollinger_bands",
            description: "Mean reversion on Bollinger band touches",
            params: BOLLINGER_PARAMS,
            rules: &[],
            build: |p| Box::new(BollingerReversion::new(p.get_usize("window"), p.get("num_std"))),
        },
        StrategyInfo {
            id: "macd",
            description: "MACD line crossing its signal line",
            params: MACD_PARAMS,
            rules: &[CrossRule {
                greater: "slow_period",
                lesser: "fast_period",
            }],
            build: |p| {
                Box::new(MacdCrossover::new(
                    p.get_usize("fast_period"),
                    p.get_usize("slow_period"),
                    p.get_usize("signal_period"),
                ))
            },
        },
        StrategyInfo {
            id: "channel_breakout",
            description: "Close beyond the prior window's high/low channel",
            params: WINDOW_PARAMS,
            rules: &[],
            build: |p| Box::new(ChannelBreakout::new(p.get_usize("window"))),
        },
        StrategyInfo {
            id: "pattern_breakout",
            description: "Double top/bottom and head-and-shoulders reversals",
            params: WINDOW_PARAMS,
            rules: &[],
            build: |p| Box::new(PatternBreakout::new(p.get_usize("window"))),
        },
        StrategyInfo {
            id: "consecutive",
            description: "Fade runs of consecutive up or down closes",
            params: CONSECUTIVE_PARAMS,
            rules: &[],
            build: |p| Box::new(ConsecutiveCloses::new(p.get_usize("n_days"))),
        },
        StrategyInfo {
            id: "bar_up_down",
            description: "Fade runs of bullish or bearish candles",
            params: BAR_PARAMS,
            rules: &[],
            build: |p| Box::new(BarUpDown::new(p.get_usize("n_bars"))),
        },
        StrategyInfo {
            id: "inside_bar",
            description: "Inside bar with close direction",
            params: &[],
            rules: &[],
            build: |_| Box::new(InsideBar),
        },
        StrategyInfo {
            id: "outside_bar",
            description: "Outside bar with close direction",
            params: &[],
            rules: &[],
            build: |_| Box::new(OutsideBar),
        },
        StrategyInfo {
            id: "momentum",
            description: "Sign of the percent change over a lookback",
            params: MOMENTUM_PARAMS,
            rules: &[],
            build: |p| Box::new(MomentumSign::new(p.get_usize("lookback_period"))),
        },
        StrategyInfo {
            id: "greedy",
            description: "RSI, MA trend and Bollinger vote",
            params: GREEDY_PARAMS,
            rules: &[CrossRule {
                greater: "ma_long",
                lesser: "ma_short",
            }],
            build: |p| {
                Box::new(GreedyVote::new(
                    p.get_usize("rsi_period"),
                    p.get_usize("ma_short"),
                    p.get_usize("ma_long"),
                    p.get_usize("bb_period"),
                    p.get("bb_std"),
                ))
            },
        },
        StrategyInfo {
            id: "perceptron",
            description: "Perceptron on trailing returns, walk-forward",
            params: PERCEPTRON_PARAMS,
            rules: &[],
            build: build_perceptron,
        },
        StrategyInfo {
            id: "linear_regression",
            description: "SGD linear regression on trailing returns, walk-forward",
            params: REGRESSION_PARAMS,
            rules: &[],
            build: build_linear_regression,
        },
    ]
}

// ─── Registry ───────────────────────────────────────────────────────

/// Lookup table from strategy id to schema and constructor.
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    entries: Vec<StrategyInfo>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self {
            entries: standard_entries(),
        }
    }
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every registered strategy, in registration order.
    pub fn list(&self) -> &[StrategyInfo] {
        &self.entries
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn get(&self, id: &str) -> Option<&StrategyInfo> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn create(
        &self,
        id: &str,
        params: &BTreeMap<String, f64>,
    ) -> Result<Box<dyn SignalProvider>, BacktestError> {
        let info = self
            .get(id)
            .ok_or_else(|| BacktestError::UnknownStrategy(id.to_string()))?;
        let values = info.validate(params)?;
        tracing::debug!(strategy = id, params = ?values, "constructing provider");
        Ok((info.build)(&values))
    }
}
