//! Read-only aggregation over committed bills and current stock.

mod queries;
mod reports;

pub use queries::{daily_series, day_summary, expense_coverage, low_stock_count, top_products};
pub use reports::{DailyPoint, DaySummary, ExpenseCoverage, ProductPerformance};
