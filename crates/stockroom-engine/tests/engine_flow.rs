//! End-to-end flows through the engine facade.

use chrono::{NaiveDate, TimeZone, Utc};
use stockroom_engine::prelude::*;

fn tracked_product(engine: &mut InventoryEngine, name: &str) -> (ProductId, SkuId) {
    let product_id = engine.create_product(NewProduct::plain(name, true));
    let sku_id = engine
        .resolve_or_create_sku(&product_id, VariantSelection::empty())
        .unwrap();
    (product_id, sku_id)
}

fn purchase(product_id: &ProductId, quantity: i64, cost: i64, sell: i64) -> BillRequest {
    BillRequest::new(BillKind::Purchase).line(
        BillLine::new(product_id.clone(), quantity)
            .priced(Money::from_cents(cost), Money::from_cents(sell)),
    )
}

fn sale(product_id: &ProductId, quantity: i64) -> BillRequest {
    BillRequest::new(BillKind::Sale).line(BillLine::new(product_id.clone(), quantity))
}

fn stock(engine: &InventoryEngine, sku_id: &SkuId) -> i64 {
    engine
        .total_stock(sku_id, None)
        .unwrap()
        .units()
        .expect("tracked product")
}

#[test]
fn test_widget_lifecycle_recognizes_fifo_costs() {
    let mut engine = InventoryEngine::new();
    let (widget, sku) = tracked_product(&mut engine, "Widget");

    // Buy 10 at 5.00, selling at 8.00.
    engine.commit_bill(&purchase(&widget, 10, 500, 800)).unwrap();
    assert_eq!(stock(&engine, &sku), 10);
    assert_eq!(
        engine.quoted_sell_price(&sku, None).unwrap(),
        Some(Money::from_cents(800))
    );

    // Sell 4: cost comes off the 5.00 layer.
    let s1 = engine.commit_bill(&sale(&widget, 4)).unwrap();
    let bill = engine.bill(&s1).unwrap();
    assert_eq!(bill.items[0].cost_price, Money::from_cents(500));
    assert_eq!(bill.items[0].cost_total, Money::from_cents(2000));
    assert_eq!(bill.items[0].sell_price, Money::from_cents(800));
    assert_eq!(stock(&engine, &sku), 6);

    // Buy 5 more at 6.00, selling at 9.00.
    engine.commit_bill(&purchase(&widget, 5, 600, 900)).unwrap();
    assert_eq!(stock(&engine, &sku), 11);

    // Sell 8: drains the 6 left at 5.00, then 2 at 6.00.
    let s2 = engine.commit_bill(&sale(&widget, 8)).unwrap();
    let item = &engine.bill(&s2).unwrap().items[0];
    assert_eq!(item.cost_total, Money::from_cents(6 * 500 + 2 * 600));
    assert_eq!(item.cost_price, Money::from_cents(525));
    assert_eq!(item.sell_price, Money::from_cents(800));
    assert_eq!(stock(&engine, &sku), 3);

    // The old layer is gone, so quotes move to the 9.00 layer.
    assert_eq!(
        engine.quoted_sell_price(&sku, None).unwrap(),
        Some(Money::from_cents(900))
    );
    assert_eq!(
        engine.average_cost_price(&sku, None).unwrap(),
        Some(Money::from_cents(600))
    );

    // Overselling fails whole and changes nothing.
    let err = engine.commit_bill(&sale(&widget, 10)).unwrap_err();
    match err {
        EngineError::LineRejected { index: 0, source } => match *source {
            EngineError::InsufficientStock {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, 10);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected line error: {other}"),
        },
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(stock(&engine, &sku), 3);
    assert_eq!(engine.bills().len(), 3);
}

#[test]
fn test_multi_line_bill_commits_atomically() {
    let mut engine = InventoryEngine::new();
    let (mug, mug_sku) = tracked_product(&mut engine, "Mug");
    let (lamp, lamp_sku) = tracked_product(&mut engine, "Lamp");
    engine.commit_bill(&purchase(&mug, 10, 200, 400)).unwrap();
    engine.commit_bill(&purchase(&lamp, 2, 1000, 2500)).unwrap();

    // Mug line would succeed; lamp line oversells.
    let request = BillRequest::new(BillKind::Sale)
        .line(BillLine::new(mug.clone(), 5))
        .line(BillLine::new(lamp.clone(), 3));
    let err = engine.commit_bill(&request).unwrap_err();
    assert!(matches!(err, EngineError::LineRejected { index: 1, .. }));
    assert_eq!(err.kind(), ErrorKind::InsufficientStock);

    assert_eq!(stock(&engine, &mug_sku), 10);
    assert_eq!(stock(&engine, &lamp_sku), 2);
    assert_eq!(engine.bills().len(), 2);
}

#[test]
fn test_variant_options_resolve_canonically() {
    let mut engine = InventoryEngine::new();
    let mut shirt = NewProduct::plain("T-Shirt", true);
    shirt.variants = vec![
        VariantAxis::new("Size", vec!["Small".into(), "Large".into()]),
        VariantAxis::new("Color", vec!["Red".into(), "Blue".into()]),
    ];
    let shirt_id = engine.create_product(shirt);

    // Same combination given in both orders lands on one SKU.
    let first = BillRequest::new(BillKind::Purchase).line(
        BillLine::new(shirt_id.clone(), 5)
            .option("Size", "Large")
            .option("Color", "Red")
            .priced(Money::from_cents(1200), Money::from_cents(2000)),
    );
    engine.commit_bill(&first).unwrap();

    let second = BillRequest::new(BillKind::Purchase).line(
        BillLine::new(shirt_id.clone(), 3)
            .option("Color", "Red")
            .option("Size", "Large")
            .priced(Money::from_cents(1300), Money::from_cents(2000)),
    );
    engine.commit_bill(&second).unwrap();

    let skus: Vec<_> = engine.skus_of(&shirt_id).collect();
    assert_eq!(skus.len(), 1);
    // Axes print in canonical order, Color before Size.
    assert_eq!(skus[0].display_name, "T-Shirt (Red, Large)");
    let sku_id = skus[0].id.clone();
    assert_eq!(stock(&engine, &sku_id), 8);
}

#[test]
fn test_delete_bill_chain_unwinds_cleanly() {
    let mut engine = InventoryEngine::new();
    let (widget, sku) = tracked_product(&mut engine, "Widget");
    let p1 = engine.commit_bill(&purchase(&widget, 10, 500, 800)).unwrap();
    let s1 = engine.commit_bill(&sale(&widget, 4)).unwrap();
    assert_eq!(stock(&engine, &sku), 6);

    // Purchase cannot go while its layer has been drawn on.
    let err = engine.delete_bill(&p1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    assert_eq!(stock(&engine, &sku), 6);

    engine.delete_bill(&s1).unwrap();
    assert_eq!(stock(&engine, &sku), 10);
    engine.delete_bill(&p1).unwrap();
    assert_eq!(stock(&engine, &sku), 0);
    assert!(engine.bills().is_empty());
    assert!(engine.layers(&sku).unwrap().is_empty());

    // With history gone the product can be removed.
    engine.remove_product(&widget).unwrap();
    assert_eq!(engine.product_count(), 0);
}

#[test]
fn test_backdated_bills_land_on_their_day() {
    let mut engine = InventoryEngine::new();
    let (widget, _) = tracked_product(&mut engine, "Widget");

    let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    let mut request = purchase(&widget, 10, 500, 800);
    request.meta.committed_at = Some(Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap());
    engine.commit_bill(&request).unwrap();

    let mut sale_request = sale(&widget, 4);
    sale_request.meta.committed_at = Some(Utc.with_ymd_and_hms(2024, 3, 5, 15, 0, 0).unwrap());
    engine.commit_bill(&sale_request).unwrap();

    let summary = engine.day_summary(day, None);
    assert_eq!(summary.sale_count, 1);
    assert_eq!(summary.revenue, Money::from_cents(4 * 800));
    assert_eq!(summary.gross_profit, Money::from_cents(4 * 300));

    let series = engine.daily_series(7, day, None);
    assert_eq!(series.len(), 7);
    assert_eq!(series[6].revenue, Money::from_cents(3200));
    assert_eq!(series[6].expense, Money::from_cents(5000));
    assert_eq!(series[0].revenue, Money::ZERO);
}

#[test]
fn test_store_scopes_stay_separate() {
    let mut engine = InventoryEngine::new();
    let (widget, sku) = tracked_product(&mut engine, "Widget");
    let s1 = StoreId::new("downtown");
    let s2 = StoreId::new("airport");

    let mut request = purchase(&widget, 10, 500, 800);
    request.meta.store_id = Some(s1.clone());
    engine.commit_bill(&request).unwrap();

    assert_eq!(
        engine.total_stock(&sku, Some(&s1)).unwrap(),
        StockLevel::Tracked(10)
    );
    assert_eq!(
        engine.total_stock(&sku, Some(&s2)).unwrap(),
        StockLevel::Tracked(0)
    );
    // The global view spans stores.
    assert_eq!(engine.total_stock(&sku, None).unwrap(), StockLevel::Tracked(10));

    // Selling out of the other store finds nothing.
    let mut bad_sale = sale(&widget, 1);
    bad_sale.meta.store_id = Some(s2.clone());
    let err = engine.commit_bill(&bad_sale).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientStock);

    let mut good_sale = sale(&widget, 3);
    good_sale.meta.store_id = Some(s1.clone());
    engine.commit_bill(&good_sale).unwrap();
    assert_eq!(
        engine.total_stock(&sku, Some(&s1)).unwrap(),
        StockLevel::Tracked(7)
    );
}

#[test]
fn test_state_survives_json_round_trip() {
    let mut engine = InventoryEngine::new();
    let (widget, sku) = tracked_product(&mut engine, "Widget");
    engine.commit_bill(&purchase(&widget, 10, 500, 800)).unwrap();
    engine.commit_bill(&sale(&widget, 4)).unwrap();

    let state = engine.export_state();
    let json = serde_json::to_string(&state).unwrap();
    let decoded: EngineState = serde_json::from_str(&json).unwrap();
    let restored = InventoryEngine::from_state(decoded);

    assert_eq!(stock(&restored, &sku), 6);
    assert_eq!(restored.bills().len(), 2);
    assert_eq!(
        restored.average_cost_price(&sku, None).unwrap(),
        Some(Money::from_cents(500))
    );
    assert_eq!(restored.export_state(), state);
}
