//! Aggregation over committed bills.

use crate::billing::{Bill, BillKind};
use crate::catalog::Catalog;
use crate::ids::{SkuId, StoreId};
use crate::ledger::StockLedger;
use crate::money::Money;
use crate::reporting::{DailyPoint, DaySummary, ExpenseCoverage, ProductPerformance};
use chrono::{Days, NaiveDate};
use std::collections::HashMap;

/// Summarize the sale bills of one calendar day.
pub fn day_summary(bills: &[Bill], date: NaiveDate, store: Option<&StoreId>) -> DaySummary {
    let mut summary = DaySummary {
        date,
        revenue: Money::ZERO,
        cost_of_goods: Money::ZERO,
        gross_profit: Money::ZERO,
        sale_count: 0,
    };
    for bill in bills.iter().filter(|b| {
        b.kind == BillKind::Sale && in_scope(b, store) && b.committed_at.date_naive() == date
    }) {
        summary.sale_count += 1;
        summary.revenue += bill.total;
        for item in &bill.items {
            summary.cost_of_goods += item.cost_total;
        }
    }
    summary.gross_profit = summary.revenue - summary.cost_of_goods;
    summary
}

/// Partition purchase bills by whether the stock they brought in would,
/// at its recorded sell prices, earn back what was spent.
pub fn expense_coverage(bills: &[Bill], store: Option<&StoreId>) -> ExpenseCoverage {
    let mut coverage = ExpenseCoverage::default();
    for bill in bills
        .iter()
        .filter(|b| b.kind == BillKind::Purchase && in_scope(b, store))
    {
        let spend: Money = bill.items.iter().map(|i| i.cost_total).sum();
        let resale: Money = bill.items.iter().map(|i| i.sell_total).sum();
        if resale >= spend {
            coverage.covered.push(bill.id.clone());
            coverage.covered_total += spend;
        } else {
            coverage.uncovered.push(bill.id.clone());
            coverage.uncovered_total += spend;
        }
    }
    coverage
}

/// Rank SKUs by sale profit, best first.
pub fn top_products(
    bills: &[Bill],
    limit: usize,
    store: Option<&StoreId>,
) -> Vec<ProductPerformance> {
    let mut by_sku: HashMap<SkuId, ProductPerformance> = HashMap::new();
    for bill in bills
        .iter()
        .filter(|b| b.kind == BillKind::Sale && in_scope(b, store))
    {
        for item in &bill.items {
            let entry = by_sku
                .entry(item.sku_id.clone())
                .or_insert_with(|| ProductPerformance {
                    sku_id: item.sku_id.clone(),
                    name: item.name.clone(),
                    units_sold: 0,
                    revenue: Money::ZERO,
                    cost: Money::ZERO,
                    profit: Money::ZERO,
                });
            entry.units_sold += item.quantity;
            entry.revenue += item.sell_total;
            entry.cost += item.cost_total;
        }
    }

    let mut rows: Vec<ProductPerformance> = by_sku.into_values().collect();
    for row in &mut rows {
        row.profit = row.revenue - row.cost;
    }
    rows.sort_by(|a, b| b.profit.cmp(&a.profit).then_with(|| a.name.cmp(&b.name)));
    rows.truncate(limit);
    rows
}

/// Revenue and expense per day over the last `days` days ending `today`.
///
/// Every day is present, zero-filled, oldest first.
pub fn daily_series(
    bills: &[Bill],
    days: usize,
    today: NaiveDate,
    store: Option<&StoreId>,
) -> Vec<DailyPoint> {
    let mut points: Vec<DailyPoint> = (0..days)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back as u64)))
        .map(|date| DailyPoint {
            date,
            revenue: Money::ZERO,
            expense: Money::ZERO,
        })
        .collect();

    for bill in bills.iter().filter(|b| in_scope(b, store)) {
        let date = bill.committed_at.date_naive();
        if let Some(point) = points.iter_mut().find(|p| p.date == date) {
            match bill.kind {
                BillKind::Sale => point.revenue += bill.total,
                BillKind::Purchase => point.expense += bill.total,
                BillKind::Return => {}
            }
        }
    }
    points
}

/// Count tracked products whose stock in scope is above zero but below
/// `threshold` units.
pub fn low_stock_count(
    catalog: &Catalog,
    ledger: &StockLedger,
    store: Option<&StoreId>,
    threshold: i64,
) -> usize {
    catalog
        .products()
        .filter(|p| p.tracks_quantity)
        .filter(|p| {
            let units: i64 = catalog
                .skus_of(&p.id)
                .map(|sku| ledger.remaining_units(&sku.id, store))
                .sum();
            units > 0 && units < threshold
        })
        .count()
}

fn in_scope(bill: &Bill, store: Option<&StoreId>) -> bool {
    match store {
        None => true,
        Some(s) => bill.store_id.as_ref() == Some(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::{BillItem, LedgerEffect, PaymentStatus};
    use crate::catalog::{NewProduct, VariantSelection};
    use crate::ids::{BillId, ProductId};
    use chrono::{TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn item(sku: &str, quantity: i64, cost_cents: i64, sell_cents: i64) -> BillItem {
        BillItem {
            product_id: ProductId::new("p1"),
            sku_id: SkuId::new(sku),
            options: VariantSelection::empty(),
            name: sku.to_string(),
            quantity,
            cost_price: Money::from_cents(cost_cents),
            sell_price: Money::from_cents(sell_cents),
            cost_total: Money::from_cents(cost_cents * quantity),
            sell_total: Money::from_cents(sell_cents * quantity),
            defective: false,
            effect: LedgerEffect::None,
        }
    }

    fn bill(kind: BillKind, d: u32, store: Option<&str>, items: Vec<BillItem>) -> Bill {
        let total = match kind {
            BillKind::Purchase => items.iter().map(|i| i.cost_total).sum(),
            _ => items.iter().map(|i| i.sell_total).sum(),
        };
        Bill {
            id: BillId::generate(),
            number: Bill::generate_number(),
            kind,
            committed_at: Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap(),
            items,
            total,
            counterparty: None,
            payment_status: PaymentStatus::Paid,
            store_id: store.map(StoreId::new),
            staff_id: None,
            notes: None,
        }
    }

    #[test]
    fn test_day_summary_filters_date_kind_and_store() {
        let bills = vec![
            bill(BillKind::Sale, 5, None, vec![item("a", 2, 500, 800)]),
            bill(BillKind::Sale, 5, Some("s1"), vec![item("a", 1, 500, 800)]),
            bill(BillKind::Purchase, 5, None, vec![item("a", 10, 500, 800)]),
            bill(BillKind::Sale, 6, None, vec![item("a", 4, 500, 800)]),
        ];

        let summary = day_summary(&bills, day(5), None);
        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.revenue, Money::from_cents(3 * 800));
        assert_eq!(summary.cost_of_goods, Money::from_cents(3 * 500));
        assert_eq!(summary.gross_profit, Money::from_cents(3 * 300));

        let scoped = day_summary(&bills, day(5), Some(&StoreId::new("s1")));
        assert_eq!(scoped.sale_count, 1);
        assert_eq!(scoped.revenue, Money::from_cents(800));
    }

    #[test]
    fn test_expense_coverage_partitions_purchases() {
        let covered = bill(BillKind::Purchase, 5, None, vec![item("a", 10, 500, 800)]);
        let uncovered = bill(BillKind::Purchase, 6, None, vec![item("b", 10, 500, 400)]);
        let covered_id = covered.id.clone();
        let uncovered_id = uncovered.id.clone();
        let bills = vec![covered, uncovered];

        let coverage = expense_coverage(&bills, None);
        assert_eq!(coverage.covered, vec![covered_id]);
        assert_eq!(coverage.uncovered, vec![uncovered_id]);
        assert_eq!(coverage.covered_total, Money::from_cents(5000));
        assert_eq!(coverage.uncovered_total, Money::from_cents(5000));
        assert_eq!(coverage.total(), Money::from_cents(10000));
    }

    #[test]
    fn test_top_products_ranks_by_profit() {
        let bills = vec![
            bill(BillKind::Sale, 5, None, vec![item("mug", 10, 200, 300)]),
            bill(BillKind::Sale, 6, None, vec![item("lamp", 2, 1000, 2500)]),
            bill(BillKind::Sale, 6, None, vec![item("mug", 5, 200, 300)]),
            bill(BillKind::Purchase, 6, None, vec![item("rug", 5, 100, 5000)]),
        ];

        let rows = top_products(&bills, 10, None);
        assert_eq!(rows.len(), 2);
        // lamp profit 3000 beats mug profit 1500; purchase rows ignored.
        assert_eq!(rows[0].name, "lamp");
        assert_eq!(rows[0].profit, Money::from_cents(3000));
        assert_eq!(rows[1].name, "mug");
        assert_eq!(rows[1].units_sold, 15);

        assert_eq!(top_products(&bills, 1, None).len(), 1);
    }

    #[test]
    fn test_daily_series_zero_fills_and_orders() {
        let bills = vec![
            bill(BillKind::Sale, 8, None, vec![item("a", 1, 500, 800)]),
            bill(BillKind::Purchase, 9, None, vec![item("a", 10, 500, 800)]),
            // Outside the window.
            bill(BillKind::Sale, 1, None, vec![item("a", 9, 500, 800)]),
        ];

        let series = daily_series(&bills, 3, day(10), None);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].date, day(8));
        assert_eq!(series[0].revenue, Money::from_cents(800));
        assert_eq!(series[1].expense, Money::from_cents(5000));
        assert_eq!(series[2].date, day(10));
        assert_eq!(series[2].revenue, Money::ZERO);
    }

    #[test]
    fn test_low_stock_counts_tracked_products_in_band() {
        let mut catalog = Catalog::new();
        let mut ledger = StockLedger::new();
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();

        for (name, units) in [("low", 2), ("fine", 50), ("out", 0)] {
            let product_id = catalog.create_product(NewProduct::plain(name, true));
            let sku_id = catalog
                .resolve_or_create_sku(&product_id, VariantSelection::empty())
                .unwrap();
            if units > 0 {
                ledger
                    .receive(
                        &sku_id,
                        None,
                        units,
                        Money::from_cents(100),
                        Money::from_cents(200),
                        BillId::generate(),
                        now,
                    )
                    .unwrap();
            }
        }
        let service = catalog.create_product(NewProduct::plain("service", false));
        catalog
            .resolve_or_create_sku(&service, VariantSelection::empty())
            .unwrap();

        assert_eq!(low_stock_count(&catalog, &ledger, None, 5), 1);
        assert_eq!(low_stock_count(&catalog, &ledger, None, 100), 2);
    }
}
