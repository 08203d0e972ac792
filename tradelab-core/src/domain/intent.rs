//! Position intents: the discrete per-bar output of every signal provider.

use serde::{Deserialize, Serialize};

/// Desired position for one bar: short, flat, or long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum PositionIntent {
    Short,
    #[default]
    Flat,
    Long,
}

impl PositionIntent {
    pub fn value(self) -> i8 {
        match self {
            Self::Short => -1,
            Self::Flat => 0,
            Self::Long => 1,
        }
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.value())
    }

    /// Map the sign of a real number onto an intent (0.0 and NaN are flat).
    pub fn from_sign(x: f64) -> Self {
        if x > 0.0 {
            Self::Long
        } else if x < 0.0 {
            Self::Short
        } else {
            Self::Flat
        }
    }
}

impl From<PositionIntent> for i8 {
    fn from(intent: PositionIntent) -> Self {
        intent.value()
    }
}

impl TryFrom<i8> for PositionIntent {
    type Error = String;

    fn try_from(v: i8) -> Result<Self, Self::Error> {
        match v {
            -1 => Ok(Self::Short),
            0 => Ok(Self::Flat),
            1 => Ok(Self::Long),
            other => Err(format!("position intent must be -1, 0 or 1, got {other}")),
        }
    }
}

/// Whether a provider produced real output or fell back to all-flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SignalStatus {
    Ready,
    /// Series shorter than the provider's lookback; every intent is flat.
    InsufficientHistory { required: usize, available: usize },
}

impl SignalStatus {
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Ready)
    }
}

/// Output of [`SignalProvider::generate_signals`](crate::components::SignalProvider).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentSeries {
    pub intents: Vec<PositionIntent>,
    pub status: SignalStatus,
}

impl IntentSeries {
    pub fn ready(intents: Vec<PositionIntent>) -> Self {
        Self {
            intents,
            status: SignalStatus::Ready,
        }
    }

    /// All-flat series of length `available` flagged as insufficient history.
    pub fn insufficient(required: usize, available: usize) -> Self {
        Self {
            intents: vec![PositionIntent::Flat; available],
            status: SignalStatus::InsufficientHistory {
                required,
                available,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn values(&self) -> Vec<i8> {
        self.intents.iter().map(|i| i.value()).collect()
    }
}
