//! Report types.

use crate::ids::{BillId, SkuId};
use crate::money::Money;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sales summary for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DaySummary {
    /// The day summarized.
    pub date: NaiveDate,
    /// Sell-side total of the day's sale bills.
    pub revenue: Money,
    /// FIFO cost recognized by the day's sale lines.
    pub cost_of_goods: Money,
    /// Revenue minus cost of goods.
    pub gross_profit: Money,
    /// Number of sale bills.
    pub sale_count: usize,
}

/// Purchase bills split by whether their expected resale value covers
/// what was spent on them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpenseCoverage {
    /// Purchases whose resale value covers the spend.
    pub covered: Vec<BillId>,
    /// Purchases underwater at their recorded sell prices.
    pub uncovered: Vec<BillId>,
    /// Cost-side total of covered purchases.
    pub covered_total: Money,
    /// Cost-side total of uncovered purchases.
    pub uncovered_total: Money,
}

impl ExpenseCoverage {
    /// Cost-side total across all purchases seen.
    pub fn total(&self) -> Money {
        self.covered_total + self.uncovered_total
    }
}

/// Sales performance of one SKU.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductPerformance {
    /// The SKU ranked.
    pub sku_id: SkuId,
    /// Display name at last sale.
    pub name: String,
    /// Units sold.
    pub units_sold: i64,
    /// Sell-side total.
    pub revenue: Money,
    /// Recognized cost total.
    pub cost: Money,
    /// Revenue minus cost.
    pub profit: Money,
}

/// One day in a revenue/expense series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyPoint {
    /// The day.
    pub date: NaiveDate,
    /// Sale bill total that day.
    pub revenue: Money,
    /// Purchase bill total that day.
    pub expense: Money,
}
