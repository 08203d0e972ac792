//! Money and risk helpers consumed by the simulator and its callers.
//!
//! None of these touch signal generation: providers decide direction,
//! these decide how much, at what cost, and when a limit is breached.

pub mod limits;
pub mod sizing;
pub mod transaction_cost;

pub use limits::{RiskLimits, RiskReport};
pub use sizing::{KellyParams, PositionSizer, SizeDecision, SizingPolicy};
pub use transaction_cost::{CostBreakdown, CostSchedule, MarketType};
