//! Error taxonomy shared by every core component.
//!
//! Validation failures surface at construction time (registry, composite,
//! price series). Numerical degeneracies are never errors; they degrade to
//! zero-valued metrics or an explicit degraded signal status.

use thiserror::Error;

/// Errors produced by the backtest core.
#[derive(Debug, Error)]
pub enum BacktestError {
    /// Malformed, empty, or misaligned input series.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Bad composite construction (weights, constituent count).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Strategy parameter outside its declared range or failing a cross-field rule.
    #[error("invalid parameter '{field}': {reason}")]
    InvalidParameter { field: String, reason: String },

    /// Strategy id not present in the registry.
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    /// Raised by data collaborators and propagated unchanged.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// A signal provider failed while generating signals.
    #[error("signal provider '{provider}' failed: {source}")]
    Provider {
        provider: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Stable classification of a [`BacktestError`], used by callers to map
/// failures onto distinct status/reason pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    InvalidConfiguration,
    InvalidParameter,
    UnknownStrategy,
    DataUnavailable,
    Internal,
}

impl ErrorKind {
    /// Machine-readable reason code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::InvalidConfiguration => "invalid_configuration",
            Self::InvalidParameter => "invalid_parameter",
            Self::UnknownStrategy => "unknown_strategy",
            Self::DataUnavailable => "data_unavailable",
            Self::Internal => "internal",
        }
    }
}

impl BacktestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::UnknownStrategy(_) => ErrorKind::UnknownStrategy,
            Self::DataUnavailable(_) => ErrorKind::DataUnavailable,
            Self::Provider { .. } => ErrorKind::Internal,
        }
    }

    /// Shorthand for an [`BacktestError::InvalidParameter`].
    pub fn invalid_parameter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an unexpected provider failure, keeping the original cause.
    pub fn provider<E>(provider: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Provider {
            provider: provider.into(),
            source: Box::new(source),
        }
    }
}
