//! Domain types for TradeLab

pub mod bar;
pub mod intent;
pub mod trade;

pub use bar::{Bar, PriceSeries};
pub use intent::{IntentSeries, PositionIntent, SignalStatus};
pub use trade::{Trade, TradeSide};
