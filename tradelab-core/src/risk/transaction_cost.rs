//! Transaction cost schedules.
//!
//! cost = max(value × commission_rate, min_commission)
//!      + (sell ? value × stamp_duty : 0)
//!      + quantity × transfer_fee

use serde::{Deserialize, Serialize};

use crate::domain::TradeSide;

/// Market presets with their fee schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    AShares,
    HkShares,
    UsShares,
}

/// Fee schedule applied per trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostSchedule {
    pub commission_rate: f64,
    pub min_commission: f64,
    /// Charged on sells only.
    pub stamp_duty: f64,
    /// Charged per unit traded.
    pub transfer_fee: f64,
}

/// Itemized cost of one trade.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub commission: f64,
    pub stamp_duty: f64,
    pub transfer_fee: f64,
    pub total: f64,
    /// total / trade value; 0 for a zero-value trade.
    pub cost_ratio: f64,
}

impl CostSchedule {
    /// Commission-only schedule with no minimum.
    pub fn flat(rate: f64) -> Self {
        Self {
            commission_rate: rate,
            min_commission: 0.0,
            stamp_duty: 0.0,
            transfer_fee: 0.0,
        }
    }

    pub fn frictionless() -> Self {
        Self::flat(0.0)
    }

    pub fn for_market(market: MarketType) -> Self {
        match market {
            MarketType::AShares => Self {
                commission_rate: 0.00025,
                min_commission: 5.0,
                stamp_duty: 0.001,
                transfer_fee: 0.00002,
            },
            MarketType::HkShares => Self {
                commission_rate: 0.0005,
                min_commission: 50.0,
                stamp_duty: 0.0013,
                transfer_fee: 0.00002,
            },
            MarketType::UsShares => Self {
                commission_rate: 0.0001,
                min_commission: 0.99,
                stamp_duty: 0.0,
                transfer_fee: 0.0,
            },
        }
    }

    pub fn cost(&self, side: TradeSide, price: f64, quantity: f64) -> CostBreakdown {
        let value = price * quantity;
        if value <= 0.0 || !value.is_finite() {
            return CostBreakdown::default();
        }
        let commission = (value * self.commission_rate).max(self.min_commission);
        let stamp_duty = match side {
            TradeSide::Sell => value * self.stamp_duty,
            TradeSide::Buy => 0.0,
        };
        let transfer_fee = quantity * self.transfer_fee;
        let total = commission + stamp_duty + transfer_fee;
        CostBreakdown {
            commission,
            stamp_duty,
            transfer_fee,
            total,
            cost_ratio: total / value,
        }
    }
}

impl Default for CostSchedule {
    fn default() -> Self {
        Self::flat(0.0003)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn flat_commission_default() {
        let c = CostSchedule::default().cost(TradeSide::Buy, 100.0, 10.0);
        approx(c.commission, 0.3);
        approx(c.total, 0.3);
        approx(c.cost_ratio, 0.0003);
    }

    #[test]
    fn a_shares_minimum_commission_applies() {
        // value 1000 × 0.00025 = 0.25 < 5.0 minimum
        let c = CostSchedule::for_market(MarketType::AShares).cost(TradeSide::Buy, 10.0, 100.0);
        approx(c.commission, 5.0);
        approx(c.stamp_duty, 0.0);
        approx(c.transfer_fee, 0.002);
        approx(c.total, 5.002);
    }

    #[test]
    fn stamp_duty_on_sells_only() {
        let schedule = CostSchedule::for_market(MarketType::HkShares);
        let buy = schedule.cost(TradeSide::Buy, 100.0, 1000.0);
        let sell = schedule.cost(TradeSide::Sell, 100.0, 1000.0);
        approx(buy.stamp_duty, 0.0);
        approx(sell.stamp_duty, 130.0);
        approx(sell.commission, 50.0);
        assert!(sell.total > buy.total);
    }

    #[test]
    fn us_shares_have_no_duty_or_transfer_fee() {
        let c = CostSchedule::for_market(MarketType::UsShares).cost(TradeSide::Sell, 50.0, 100_000.0);
        approx(c.commission, 500.0);
        approx(c.stamp_duty, 0.0);
        approx(c.transfer_fee, 0.0);
    }

    #[test]
    fn zero_value_trade_costs_nothing() {
        let c = CostSchedule::for_market(MarketType::AShares).cost(TradeSide::Buy, 10.0, 0.0);
        assert_eq!(c, CostBreakdown::default());
    }
}
