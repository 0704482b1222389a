//! The engine facade.

use crate::billing::{Bill, BillMetaUpdate, BillRequest, TransactionProcessor};
use crate::catalog::{Catalog, NewProduct, Product, ProductUpdate, Sku, VariantSelection};
use crate::error::EngineError;
use crate::ids::{BillId, LayerId, ProductId, SkuId, StoreId};
use crate::ledger::{StockLayer, StockLedger, StockLevel};
use crate::money::Money;
use crate::reporting::{self, DailyPoint, DaySummary, ExpenseCoverage, ProductPerformance};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Catalog, stock ledger, and bill history behind one single-writer
/// facade.
///
/// All mutation goes through `&mut self`; embedders that share an
/// engine across threads wrap it in their own lock. Bills are the only
/// write path into stock, so ledger state is always explained by the
/// bill history plus standing prices.
#[derive(Debug, Default)]
pub struct InventoryEngine {
    catalog: Catalog,
    ledger: StockLedger,
    bills: Vec<Bill>,
}

impl InventoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // Catalog.

    pub fn create_product(&mut self, input: NewProduct) -> ProductId {
        let id = self.catalog.create_product(input);
        tracing::debug!(product = %id, "created product");
        id
    }

    pub fn product(&self, id: &ProductId) -> Result<&Product, EngineError> {
        self.catalog.product(id)
    }

    /// Products in creation order.
    pub fn products(&self) -> impl Iterator<Item = &Product> + '_ {
        self.catalog.products()
    }

    pub fn product_count(&self) -> usize {
        self.catalog.product_count()
    }

    pub fn update_product(
        &mut self,
        id: &ProductId,
        update: ProductUpdate,
    ) -> Result<(), EngineError> {
        self.catalog.update_product(id, update)
    }

    /// Remove a product with no history behind it.
    ///
    /// Refused while any bill line references the product or any of its
    /// SKUs still holds stock; removing it then would orphan records.
    pub fn remove_product(&mut self, id: &ProductId) -> Result<Product, EngineError> {
        self.catalog.product(id)?;
        let referenced = self
            .bills
            .iter()
            .any(|b| b.items.iter().any(|i| &i.product_id == id));
        let stocked = self
            .catalog
            .skus_of(id)
            .any(|sku| self.ledger.remaining_units(&sku.id, None) > 0);
        if referenced || stocked {
            return Err(EngineError::ProductInUse(id.to_string()));
        }

        let (product, sku_ids) = self.catalog.remove_product(id)?;
        for sku_id in &sku_ids {
            self.ledger.remove_sku_layers(sku_id);
        }
        tracing::debug!(product = %id, "removed product");
        Ok(product)
    }

    pub fn resolve_sku(
        &self,
        product_id: &ProductId,
        selection: &VariantSelection,
    ) -> Option<&Sku> {
        self.catalog.resolve_sku(product_id, selection)
    }

    pub fn resolve_or_create_sku(
        &mut self,
        product_id: &ProductId,
        selection: VariantSelection,
    ) -> Result<SkuId, EngineError> {
        self.catalog.resolve_or_create_sku(product_id, selection)
    }

    pub fn sku(&self, id: &SkuId) -> Result<&Sku, EngineError> {
        self.catalog.sku(id)
    }

    pub fn skus_of(&self, product_id: &ProductId) -> impl Iterator<Item = &Sku> + '_ {
        self.catalog.skus_of(product_id)
    }

    // Stock queries.

    /// Units on hand, or the untracked sentinel for products outside
    /// quantity tracking.
    pub fn total_stock(
        &self,
        sku_id: &SkuId,
        store: Option<&StoreId>,
    ) -> Result<StockLevel, EngineError> {
        let sku = self.catalog.sku(sku_id)?;
        if !self.catalog.product(&sku.product_id)?.tracks_quantity {
            return Ok(StockLevel::Untracked);
        }
        Ok(StockLevel::Tracked(self.ledger.remaining_units(sku_id, store)))
    }

    /// Sell price a sale would use right now.
    pub fn quoted_sell_price(
        &self,
        sku_id: &SkuId,
        store: Option<&StoreId>,
    ) -> Result<Option<Money>, EngineError> {
        let sku = self.catalog.sku(sku_id)?;
        if !self.catalog.product(&sku.product_id)?.tracks_quantity {
            return Ok(self
                .ledger
                .standing_prices(sku_id, store)
                .map(|(_, sell)| sell));
        }
        Ok(self.ledger.quoted_sell_price(sku_id, store))
    }

    /// Quantity-weighted average unit cost.
    pub fn average_cost_price(
        &self,
        sku_id: &SkuId,
        store: Option<&StoreId>,
    ) -> Result<Option<Money>, EngineError> {
        let sku = self.catalog.sku(sku_id)?;
        if !self.catalog.product(&sku.product_id)?.tracks_quantity {
            return Ok(self
                .ledger
                .standing_prices(sku_id, store)
                .map(|(cost, _)| cost));
        }
        Ok(self.ledger.average_cost_price(sku_id, store))
    }

    /// Set the standing prices of a non-tracked SKU.
    ///
    /// Tracked products get their prices from purchase layers instead.
    pub fn set_standing_price(
        &mut self,
        sku_id: &SkuId,
        store: Option<StoreId>,
        cost_price: Money,
        sell_price: Money,
    ) -> Result<LayerId, EngineError> {
        let sku = self.catalog.sku(sku_id)?;
        if self.catalog.product(&sku.product_id)?.tracks_quantity {
            return Err(EngineError::StandingPriceTracked(sku_id.to_string()));
        }
        Ok(self
            .ledger
            .set_standing_price(sku_id, store, cost_price, sell_price, Utc::now()))
    }

    /// The stock layers of a SKU, in insertion order.
    pub fn layers(&self, sku_id: &SkuId) -> Result<&[StockLayer], EngineError> {
        self.catalog.sku(sku_id)?;
        Ok(self.ledger.layers(sku_id))
    }

    // Billing.

    /// Commit a bill atomically; on success its effects are live.
    pub fn commit_bill(&mut self, request: &BillRequest) -> Result<BillId, EngineError> {
        let bill_id = BillId::generate();
        let at = request.meta.committed_at.unwrap_or_else(Utc::now);
        let bill = TransactionProcessor::new(&mut self.catalog, &mut self.ledger)
            .commit(request, bill_id.clone(), at)?;
        self.bills.push(bill);
        Ok(bill_id)
    }

    pub fn bill(&self, id: &BillId) -> Result<&Bill, EngineError> {
        self.bills
            .iter()
            .find(|b| &b.id == id)
            .ok_or_else(|| EngineError::BillNotFound(id.to_string()))
    }

    /// Committed bills in commit order.
    pub fn bills(&self) -> &[Bill] {
        &self.bills
    }

    /// Delete a bill, reversing its recorded ledger effects.
    ///
    /// Fails without side effects if a layer the bill created has since
    /// been drawn on.
    pub fn delete_bill(&mut self, id: &BillId) -> Result<Bill, EngineError> {
        let pos = self
            .bills
            .iter()
            .position(|b| &b.id == id)
            .ok_or_else(|| EngineError::BillNotFound(id.to_string()))?;
        TransactionProcessor::new(&mut self.catalog, &mut self.ledger)
            .rollback(&self.bills[pos])?;
        Ok(self.bills.remove(pos))
    }

    /// Update a bill's descriptive metadata in place.
    ///
    /// Lines and totals are immutable; correcting those means deleting
    /// the bill and committing a new one.
    pub fn update_bill_meta(
        &mut self,
        id: &BillId,
        update: BillMetaUpdate,
    ) -> Result<(), EngineError> {
        let bill = self
            .bills
            .iter_mut()
            .find(|b| &b.id == id)
            .ok_or_else(|| EngineError::BillNotFound(id.to_string()))?;
        if let Some(status) = update.payment_status {
            bill.payment_status = status;
        }
        if let Some(counterparty) = update.counterparty {
            bill.counterparty = Some(counterparty);
        }
        if let Some(notes) = update.notes {
            bill.notes = Some(notes);
        }
        Ok(())
    }

    // Reporting.

    pub fn day_summary(&self, date: NaiveDate, store: Option<&StoreId>) -> DaySummary {
        reporting::day_summary(&self.bills, date, store)
    }

    pub fn expense_coverage(&self, store: Option<&StoreId>) -> ExpenseCoverage {
        reporting::expense_coverage(&self.bills, store)
    }

    pub fn top_products(&self, limit: usize, store: Option<&StoreId>) -> Vec<ProductPerformance> {
        reporting::top_products(&self.bills, limit, store)
    }

    pub fn daily_series(
        &self,
        days: usize,
        today: NaiveDate,
        store: Option<&StoreId>,
    ) -> Vec<DailyPoint> {
        reporting::daily_series(&self.bills, days, today, store)
    }

    pub fn low_stock_count(&self, store: Option<&StoreId>, threshold: i64) -> usize {
        reporting::low_stock_count(&self.catalog, &self.ledger, store, threshold)
    }

    // State transfer.

    /// Export everything the engine owns as a serializable state.
    pub fn export_state(&self) -> EngineState {
        EngineState {
            products: self.catalog.products().cloned().collect(),
            skus: self
                .catalog
                .skus()
                .map(|sku| SkuRecord {
                    layers: self.ledger.layers(&sku.id).to_vec(),
                    sku: sku.clone(),
                })
                .collect(),
            bills: self.bills.clone(),
        }
    }

    /// Rebuild an engine from exported state.
    pub fn from_state(state: EngineState) -> Self {
        let mut engine = Self::new();
        for product in state.products {
            engine.catalog.insert_product_record(product);
        }
        for record in state.skus {
            let sku_id = record.sku.id.clone();
            engine.catalog.insert_sku_record(record.sku);
            engine.ledger.insert_layers(sku_id, record.layers);
        }
        engine.bills = state.bills;
        engine
    }
}

/// A SKU together with its stock layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuRecord {
    pub sku: Sku,
    pub layers: Vec<StockLayer>,
}

/// Complete engine state, the unit of persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub products: Vec<Product>,
    pub skus: Vec<SkuRecord>,
    pub bills: Vec<Bill>,
}
