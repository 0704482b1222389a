//! Bill commit and rollback.

use crate::billing::{Bill, BillItem, BillKind, BillLine, BillRequest, LedgerEffect};
use crate::catalog::{Catalog, VariantSelection};
use crate::error::EngineError;
use crate::ids::{BillId, SkuId, StoreId};
use crate::ledger::StockLedger;
use crate::money::Money;
use chrono::{DateTime, Utc};

/// Runs one bill against the catalog and ledger.
///
/// Commits are simulated line by line against a working copy of the
/// touched layer lists; only a fully successful simulation is absorbed
/// back. A rejected line therefore leaves both catalog and ledger as
/// they were, including any SKUs the doomed bill had created.
pub(crate) struct TransactionProcessor<'a> {
    catalog: &'a mut Catalog,
    ledger: &'a mut StockLedger,
}

impl<'a> TransactionProcessor<'a> {
    pub(crate) fn new(catalog: &'a mut Catalog, ledger: &'a mut StockLedger) -> Self {
        Self { catalog, ledger }
    }

    /// Commit a bill request as of `at`.
    pub(crate) fn commit(
        &mut self,
        request: &BillRequest,
        bill_id: BillId,
        at: DateTime<Utc>,
    ) -> Result<Bill, EngineError> {
        if request.lines.is_empty() {
            return Err(EngineError::EmptyBill);
        }
        let store = request.meta.store_id.clone();

        // Resolve every line to a SKU, creating missing combinations.
        let mut created: Vec<SkuId> = Vec::new();
        let mut resolved: Vec<SkuId> = Vec::new();
        for (index, line) in request.lines.iter().enumerate() {
            match self.resolve_line(line, &mut created) {
                Ok(sku_id) => resolved.push(sku_id),
                Err(source) => {
                    self.unwind_created(&created);
                    return Err(EngineError::LineRejected {
                        index,
                        source: Box::new(source),
                    });
                }
            }
        }

        // Simulate against a working copy of the touched layers.
        let mut staged = self.ledger.stage(resolved.iter());
        let mut items = Vec::with_capacity(request.lines.len());
        for (index, line) in request.lines.iter().enumerate() {
            let outcome = self.simulate_line(
                &mut staged,
                request.kind,
                line,
                &resolved[index],
                &store,
                &bill_id,
                at,
            );
            match outcome {
                Ok(item) => items.push(item),
                Err(source) => {
                    self.unwind_created(&created);
                    return Err(EngineError::LineRejected {
                        index,
                        source: Box::new(source),
                    });
                }
            }
        }

        let total = match bill_total(request.kind, &items) {
            Ok(total) => total,
            Err(source) => {
                self.unwind_created(&created);
                return Err(source);
            }
        };

        // Every line went through; make the working copy real.
        self.ledger.absorb(staged);
        let bill = Bill {
            id: bill_id,
            number: Bill::generate_number(),
            kind: request.kind,
            committed_at: at,
            items,
            total,
            counterparty: request.meta.counterparty.clone(),
            payment_status: request.meta.payment_status,
            store_id: store,
            staff_id: request.meta.staff_id.clone(),
            notes: request.meta.notes.clone(),
        };
        tracing::info!(
            bill = %bill.id,
            kind = bill.kind.as_str(),
            lines = bill.items.len(),
            "committed bill"
        );
        Ok(bill)
    }

    /// Reverse the recorded ledger effects of a committed bill.
    ///
    /// Runs against a working copy as well: a bill whose created layers
    /// have since been drawn on is refused with nothing undone.
    pub(crate) fn rollback(&mut self, bill: &Bill) -> Result<(), EngineError> {
        let mut staged = self.ledger.stage(bill.items.iter().map(|item| &item.sku_id));
        for item in &bill.items {
            match &item.effect {
                LedgerEffect::None => {}
                LedgerEffect::Created(layer_id) => {
                    staged.retract_layer(&item.sku_id, layer_id)?;
                }
                LedgerEffect::Consumed(draws) => {
                    for draw in draws {
                        staged.restore_draw(&item.sku_id, draw)?;
                    }
                }
            }
        }
        self.ledger.absorb(staged);
        tracing::info!(bill = %bill.id, "reversed bill effects");
        Ok(())
    }

    fn resolve_line(
        &mut self,
        line: &BillLine,
        created: &mut Vec<SkuId>,
    ) -> Result<SkuId, EngineError> {
        let selection = VariantSelection::from_map(line.options.clone());
        if let Some(existing) = self.catalog.resolve_sku(&line.product_id, &selection) {
            return Ok(existing.id.clone());
        }
        let sku_id = self
            .catalog
            .resolve_or_create_sku(&line.product_id, selection)?;
        created.push(sku_id.clone());
        Ok(sku_id)
    }

    #[allow(clippy::too_many_arguments)]
    fn simulate_line(
        &self,
        staged: &mut StockLedger,
        kind: BillKind,
        line: &BillLine,
        sku_id: &SkuId,
        store: &Option<StoreId>,
        bill_id: &BillId,
        at: DateTime<Utc>,
    ) -> Result<BillItem, EngineError> {
        if line.quantity <= 0 {
            return Err(EngineError::InvalidQuantity(line.quantity));
        }
        let tracked = self.catalog.product(&line.product_id)?.tracks_quantity;
        let sku = self.catalog.sku(sku_id)?;
        let quantity = line.quantity;
        let store_ref = store.as_ref();

        let (cost_price, sell_price, cost_total, effect) = match kind {
            BillKind::Purchase => {
                if !tracked {
                    return Err(EngineError::UntrackedProduct(line.product_id.to_string()));
                }
                let cost = line.cost_price.ok_or(EngineError::MissingPrice("cost"))?;
                let sell = line.sell_price.ok_or(EngineError::MissingPrice("sell"))?;
                let layer = staged.receive(
                    sku_id,
                    store.clone(),
                    quantity,
                    cost,
                    sell,
                    bill_id.clone(),
                    at,
                )?;
                let cost_total = cost.checked_times(quantity).ok_or(EngineError::Overflow)?;
                (cost, sell, cost_total, LedgerEffect::Created(layer))
            }
            BillKind::Sale if tracked => {
                // Quote before consuming so the offered price comes from
                // the same layer FIFO is about to draw first.
                let quote = staged.quoted_sell_price(sku_id, store_ref);
                let consumption = staged.consume_fifo(sku_id, store_ref, quantity)?;
                let sell = line.sell_price.or(quote).unwrap_or(Money::ZERO);
                let cost = consumption.average_unit_cost();
                let cost_total = consumption.cost_total;
                (cost, sell, cost_total, LedgerEffect::Consumed(consumption.draws))
            }
            BillKind::Sale => {
                let (standing_cost, standing_sell) = staged
                    .standing_prices(sku_id, store_ref)
                    .unwrap_or((Money::ZERO, Money::ZERO));
                let cost = line.cost_price.unwrap_or(standing_cost);
                let sell = line.sell_price.unwrap_or(standing_sell);
                let cost_total = cost.checked_times(quantity).ok_or(EngineError::Overflow)?;
                (cost, sell, cost_total, LedgerEffect::None)
            }
            BillKind::Return if tracked => {
                let quote = staged.quoted_sell_price(sku_id, store_ref);
                let average = staged.average_cost_price(sku_id, store_ref);
                let cost = line.cost_price.or(average).unwrap_or(Money::ZERO);
                let sell = line.sell_price.or(quote).unwrap_or(Money::ZERO);
                let cost_total = cost.checked_times(quantity).ok_or(EngineError::Overflow)?;
                let effect = if line.defective {
                    // Damaged goods never re-enter stock.
                    LedgerEffect::None
                } else {
                    let layer = staged.restock(
                        sku_id,
                        store.clone(),
                        quantity,
                        cost,
                        sell,
                        bill_id.clone(),
                        at,
                    )?;
                    LedgerEffect::Created(layer)
                };
                (cost, sell, cost_total, effect)
            }
            BillKind::Return => {
                let (standing_cost, standing_sell) = staged
                    .standing_prices(sku_id, store_ref)
                    .unwrap_or((Money::ZERO, Money::ZERO));
                let cost = line.cost_price.unwrap_or(standing_cost);
                let sell = line.sell_price.unwrap_or(standing_sell);
                let cost_total = cost.checked_times(quantity).ok_or(EngineError::Overflow)?;
                (cost, sell, cost_total, LedgerEffect::None)
            }
        };

        let sell_total = sell_price
            .checked_times(quantity)
            .ok_or(EngineError::Overflow)?;
        Ok(BillItem {
            product_id: line.product_id.clone(),
            sku_id: sku_id.clone(),
            options: sku.selection.clone(),
            name: sku.display_name.clone(),
            quantity,
            cost_price,
            sell_price,
            cost_total,
            sell_total,
            defective: line.defective,
            effect,
        })
    }

    fn unwind_created(&mut self, created: &[SkuId]) {
        for sku_id in created {
            self.catalog.remove_sku(sku_id);
        }
    }
}

/// Purchases total on the cost side, sales and returns on the sell side.
fn bill_total(kind: BillKind, items: &[BillItem]) -> Result<Money, EngineError> {
    let mut total = Money::ZERO;
    for item in items {
        let line_total = match kind {
            BillKind::Purchase => item.cost_total,
            BillKind::Sale | BillKind::Return => item.sell_total,
        };
        total = total
            .checked_add(line_total)
            .ok_or(EngineError::Overflow)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NewProduct;
    use crate::ids::ProductId;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    fn setup() -> (Catalog, StockLedger, ProductId) {
        let mut catalog = Catalog::new();
        let product_id = catalog.create_product(NewProduct::plain("Widget", true));
        (catalog, StockLedger::new(), product_id)
    }

    fn commit(
        catalog: &mut Catalog,
        ledger: &mut StockLedger,
        request: BillRequest,
        hour: u32,
    ) -> Result<Bill, EngineError> {
        TransactionProcessor::new(catalog, ledger).commit(&request, BillId::generate(), at(hour))
    }

    #[test]
    fn test_empty_bill_rejected() {
        let (mut catalog, mut ledger, _) = setup();
        let err = commit(&mut catalog, &mut ledger, BillRequest::new(BillKind::Sale), 9)
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptyBill));
    }

    #[test]
    fn test_purchase_then_sale_recognizes_fifo_cost() {
        let (mut catalog, mut ledger, product_id) = setup();

        let purchase = BillRequest::new(BillKind::Purchase).line(
            BillLine::new(product_id.clone(), 10)
                .priced(Money::from_cents(500), Money::from_cents(800)),
        );
        let bill = commit(&mut catalog, &mut ledger, purchase, 9).unwrap();
        assert_eq!(bill.total, Money::from_cents(5000));
        assert!(matches!(bill.items[0].effect, LedgerEffect::Created(_)));

        let sale = BillRequest::new(BillKind::Sale).line(BillLine::new(product_id.clone(), 4));
        let bill = commit(&mut catalog, &mut ledger, sale, 10).unwrap();
        let item = &bill.items[0];
        assert_eq!(item.cost_price, Money::from_cents(500));
        assert_eq!(item.cost_total, Money::from_cents(2000));
        // No override given: the sale quotes the layer's sell price.
        assert_eq!(item.sell_price, Money::from_cents(800));
        assert_eq!(bill.total, Money::from_cents(3200));

        let sku_id = &item.sku_id;
        assert_eq!(ledger.remaining_units(sku_id, None), 6);
    }

    #[test]
    fn test_rejected_line_leaves_everything_untouched() {
        let (mut catalog, mut ledger, product_id) = setup();
        let purchase = BillRequest::new(BillKind::Purchase).line(
            BillLine::new(product_id.clone(), 5)
                .priced(Money::from_cents(500), Money::from_cents(800)),
        );
        commit(&mut catalog, &mut ledger, purchase, 9).unwrap();
        let sku_count = catalog.skus().count();

        // Line 0 would succeed; line 1 oversells. Nothing may stick.
        let sale = BillRequest::new(BillKind::Sale)
            .line(BillLine::new(product_id.clone(), 2))
            .line(BillLine::new(product_id.clone(), 99));
        let err = commit(&mut catalog, &mut ledger, sale, 10).unwrap_err();
        match err {
            EngineError::LineRejected { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, EngineError::InsufficientStock { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }

        let sku_id = catalog.skus().next().unwrap().id.clone();
        assert_eq!(ledger.remaining_units(&sku_id, None), 5);
        assert_eq!(catalog.skus().count(), sku_count);
    }

    #[test]
    fn test_rejected_bill_unwinds_created_skus() {
        let (mut catalog, mut ledger, _) = setup();
        let mut shirt = NewProduct::plain("T-Shirt", true);
        shirt.variants = vec![crate::catalog::VariantAxis::new(
            "Size",
            vec!["S".into(), "L".into()],
        )];
        let shirt_id = catalog.create_product(shirt);

        // The line creates the (Size=L) SKU, then fails on missing prices.
        let purchase = BillRequest::new(BillKind::Purchase)
            .line(BillLine::new(shirt_id.clone(), 3).option("Size", "L"));
        let err = commit(&mut catalog, &mut ledger, purchase, 9).unwrap_err();
        assert!(matches!(err, EngineError::LineRejected { index: 0, .. }));
        assert_eq!(catalog.skus_of(&shirt_id).count(), 0);
    }

    #[test]
    fn test_sale_on_untracked_uses_standing_prices() {
        let (mut catalog, mut ledger, _) = setup();
        let service_id = catalog.create_product(NewProduct::plain("Gift Wrap", false));
        let selection = VariantSelection::empty();
        let sku_id = catalog
            .resolve_or_create_sku(&service_id, selection)
            .unwrap();
        ledger.set_standing_price(
            &sku_id,
            None,
            Money::from_cents(100),
            Money::from_cents(300),
            at(8),
        );

        let sale = BillRequest::new(BillKind::Sale).line(BillLine::new(service_id.clone(), 2));
        let bill = commit(&mut catalog, &mut ledger, sale, 9).unwrap();
        let item = &bill.items[0];
        assert_eq!(item.cost_price, Money::from_cents(100));
        assert_eq!(item.sell_price, Money::from_cents(300));
        assert_eq!(item.effect, LedgerEffect::None);
        assert_eq!(bill.total, Money::from_cents(600));
        assert_eq!(ledger.remaining_units(&sku_id, None), 0);
    }

    #[test]
    fn test_purchase_on_untracked_rejected() {
        let (mut catalog, mut ledger, _) = setup();
        let service_id = catalog.create_product(NewProduct::plain("Gift Wrap", false));
        let purchase = BillRequest::new(BillKind::Purchase).line(
            BillLine::new(service_id, 1).priced(Money::from_cents(100), Money::from_cents(300)),
        );
        let err = commit(&mut catalog, &mut ledger, purchase, 9).unwrap_err();
        match err {
            EngineError::LineRejected { source, .. } => {
                assert!(matches!(*source, EngineError::UntrackedProduct(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_defective_return_recognizes_cost_without_restock() {
        let (mut catalog, mut ledger, product_id) = setup();
        let purchase = BillRequest::new(BillKind::Purchase).line(
            BillLine::new(product_id.clone(), 10)
                .priced(Money::from_cents(500), Money::from_cents(800)),
        );
        commit(&mut catalog, &mut ledger, purchase, 9).unwrap();
        let sale = BillRequest::new(BillKind::Sale).line(BillLine::new(product_id.clone(), 4));
        commit(&mut catalog, &mut ledger, sale, 10).unwrap();

        let ret = BillRequest::new(BillKind::Return)
            .line(BillLine::new(product_id.clone(), 1).mark_defective());
        let bill = commit(&mut catalog, &mut ledger, ret, 11).unwrap();
        let item = &bill.items[0];
        assert_eq!(item.effect, LedgerEffect::None);
        assert_eq!(item.cost_price, Money::from_cents(500));

        let sku_id = &item.sku_id;
        assert_eq!(ledger.remaining_units(sku_id, None), 6);
    }

    #[test]
    fn test_return_restocks_and_sale_redraws_it() {
        let (mut catalog, mut ledger, product_id) = setup();
        let purchase = BillRequest::new(BillKind::Purchase).line(
            BillLine::new(product_id.clone(), 3)
                .priced(Money::from_cents(500), Money::from_cents(800)),
        );
        commit(&mut catalog, &mut ledger, purchase, 9).unwrap();
        let sale = BillRequest::new(BillKind::Sale).line(BillLine::new(product_id.clone(), 3));
        commit(&mut catalog, &mut ledger, sale, 10).unwrap();

        let ret = BillRequest::new(BillKind::Return).line(BillLine::new(product_id.clone(), 2));
        let bill = commit(&mut catalog, &mut ledger, ret, 11).unwrap();
        assert!(matches!(bill.items[0].effect, LedgerEffect::Created(_)));

        let sku_id = bill.items[0].sku_id.clone();
        assert_eq!(ledger.remaining_units(&sku_id, None), 2);

        let sale = BillRequest::new(BillKind::Sale).line(BillLine::new(product_id.clone(), 2));
        let bill = commit(&mut catalog, &mut ledger, sale, 12).unwrap();
        assert_eq!(bill.items[0].cost_price, Money::from_cents(500));
        assert_eq!(ledger.remaining_units(&sku_id, None), 0);
    }

    #[test]
    fn test_rollback_restores_sale_and_retracts_purchase() {
        let (mut catalog, mut ledger, product_id) = setup();
        let purchase = BillRequest::new(BillKind::Purchase).line(
            BillLine::new(product_id.clone(), 10)
                .priced(Money::from_cents(500), Money::from_cents(800)),
        );
        let purchase_bill = commit(&mut catalog, &mut ledger, purchase, 9).unwrap();
        let sku_id = purchase_bill.items[0].sku_id.clone();

        let sale = BillRequest::new(BillKind::Sale).line(BillLine::new(product_id.clone(), 4));
        let sale_bill = commit(&mut catalog, &mut ledger, sale, 10).unwrap();
        assert_eq!(ledger.remaining_units(&sku_id, None), 6);

        TransactionProcessor::new(&mut catalog, &mut ledger)
            .rollback(&sale_bill)
            .unwrap();
        assert_eq!(ledger.remaining_units(&sku_id, None), 10);

        TransactionProcessor::new(&mut catalog, &mut ledger)
            .rollback(&purchase_bill)
            .unwrap();
        assert_eq!(ledger.remaining_units(&sku_id, None), 0);
        assert!(ledger.layers(&sku_id).is_empty());
    }

    #[test]
    fn test_rollback_refuses_consumed_purchase_layer() {
        let (mut catalog, mut ledger, product_id) = setup();
        let purchase = BillRequest::new(BillKind::Purchase).line(
            BillLine::new(product_id.clone(), 10)
                .priced(Money::from_cents(500), Money::from_cents(800)),
        );
        let purchase_bill = commit(&mut catalog, &mut ledger, purchase, 9).unwrap();
        let sale = BillRequest::new(BillKind::Sale).line(BillLine::new(product_id.clone(), 1));
        commit(&mut catalog, &mut ledger, sale, 10).unwrap();

        let err = TransactionProcessor::new(&mut catalog, &mut ledger)
            .rollback(&purchase_bill)
            .unwrap_err();
        assert!(matches!(err, EngineError::LayerConsumed(_)));

        // Refusal must not half-apply: the drawn layer is still there.
        let sku_id = &purchase_bill.items[0].sku_id;
        assert_eq!(ledger.remaining_units(sku_id, None), 9);
    }
}
