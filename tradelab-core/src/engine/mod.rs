//! Trade simulation: intent series in, trade ledger and scored equity curve out.
//!
//! The simulator is bar-close based. The intent observed at bar t-1 earns the
//! return from close[t-1] to close[t]; trades fire at close[t] when the intent
//! changes.

pub mod result;
pub mod simulator;

pub use result::BacktestResult;
pub use simulator::{SimulatorConfig, TradeSimulator};
