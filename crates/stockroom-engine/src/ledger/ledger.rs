//! FIFO stock ledger.

use crate::error::EngineError;
use crate::ids::{BillId, LayerId, SkuId, StoreId};
use crate::ledger::{Consumption, LayerDraw, LayerOrigin, StockLayer};
use crate::money::Money;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Owns, per SKU, the ordered list of stock layers.
///
/// The ledger is pure layer mechanics: receipts append layers, sales
/// walk them oldest-first, and every operation either fully succeeds or
/// leaves the layer lists untouched. Whether a SKU participates in
/// quantity tracking at all is decided a level up, by the product.
#[derive(Debug, Clone, Default)]
pub struct StockLedger {
    layers: HashMap<SkuId, Vec<StockLayer>>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The layers of a SKU, in insertion order.
    pub fn layers(&self, sku: &SkuId) -> &[StockLayer] {
        self.layers.get(sku).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Units remaining across layers visible under the store scope.
    pub fn remaining_units(&self, sku: &SkuId, store: Option<&StoreId>) -> i64 {
        self.layers(sku)
            .iter()
            .filter(|l| l.matches_store(store))
            .map(|l| l.remaining_quantity)
            .sum()
    }

    /// Sell price a sale would quote right now.
    ///
    /// With stock on hand this is the oldest layer that still has
    /// remaining units, so the quote lines up with the layer FIFO will
    /// consume next. With no stock it falls back to the most recently
    /// received layer, the best guess for a restock.
    pub fn quoted_sell_price(&self, sku: &SkuId, store: Option<&StoreId>) -> Option<Money> {
        let layers = self.layers(sku);
        let order = fifo_order(layers, store);
        if let Some(&i) = order.iter().find(|&&i| layers[i].remaining_quantity > 0) {
            return Some(layers[i].sell_price);
        }
        order.last().map(|&i| layers[i].sell_price)
    }

    /// Quantity-weighted average cost.
    ///
    /// Weighted by remaining units while stock is on hand; once
    /// depleted, by initial units as a historical estimate.
    pub fn average_cost_price(&self, sku: &SkuId, store: Option<&StoreId>) -> Option<Money> {
        let layers: Vec<&StockLayer> = self
            .layers(sku)
            .iter()
            .filter(|l| l.matches_store(store) && l.origin != LayerOrigin::Pricing)
            .collect();

        let by_remaining =
            weighted_average(layers.iter().map(|l| (l.cost_price, l.remaining_quantity)));
        if by_remaining.is_some() {
            return by_remaining;
        }
        weighted_average(layers.iter().map(|l| (l.cost_price, l.initial_quantity)))
    }

    /// The standing (cost, sell) prices of a non-tracked SKU.
    pub fn standing_prices(&self, sku: &SkuId, store: Option<&StoreId>) -> Option<(Money, Money)> {
        self.layers(sku)
            .iter()
            .find(|l| l.origin == LayerOrigin::Pricing && l.matches_store(store))
            .map(|l| (l.cost_price, l.sell_price))
    }

    /// Append a purchase receipt layer.
    pub fn receive(
        &mut self,
        sku: &SkuId,
        store: Option<StoreId>,
        quantity: i64,
        cost_price: Money,
        sell_price: Money,
        bill_id: BillId,
        at: DateTime<Utc>,
    ) -> Result<LayerId, EngineError> {
        self.append_layer(
            sku,
            store,
            quantity,
            cost_price,
            sell_price,
            bill_id,
            at,
            LayerOrigin::Purchase,
        )
    }

    /// Append a return-driven receipt layer.
    ///
    /// Same mechanics as [`receive`](Self::receive); kept distinct so
    /// the audit trail shows where the stock came from.
    pub fn restock(
        &mut self,
        sku: &SkuId,
        store: Option<StoreId>,
        quantity: i64,
        cost_price: Money,
        sell_price: Money,
        bill_id: BillId,
        at: DateTime<Utc>,
    ) -> Result<LayerId, EngineError> {
        self.append_layer(
            sku,
            store,
            quantity,
            cost_price,
            sell_price,
            bill_id,
            at,
            LayerOrigin::Return,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn append_layer(
        &mut self,
        sku: &SkuId,
        store: Option<StoreId>,
        quantity: i64,
        cost_price: Money,
        sell_price: Money,
        bill_id: BillId,
        at: DateTime<Utc>,
        origin: LayerOrigin,
    ) -> Result<LayerId, EngineError> {
        if quantity <= 0 {
            return Err(EngineError::InvalidQuantity(quantity));
        }
        let layer = StockLayer::new(
            Some(bill_id),
            at,
            quantity,
            cost_price,
            sell_price,
            store,
            origin,
        );
        let id = layer.id.clone();
        self.layers.entry(sku.clone()).or_default().push(layer);
        Ok(id)
    }

    /// Create or overwrite the standing-price layer for (SKU, store).
    ///
    /// Standing layers carry zero quantity; they exist purely so a
    /// non-tracked product has somewhere to keep its prices.
    pub fn set_standing_price(
        &mut self,
        sku: &SkuId,
        store: Option<StoreId>,
        cost_price: Money,
        sell_price: Money,
        at: DateTime<Utc>,
    ) -> LayerId {
        let layers = self.layers.entry(sku.clone()).or_default();
        if let Some(layer) = layers
            .iter_mut()
            .find(|l| l.origin == LayerOrigin::Pricing && l.store_id == store)
        {
            layer.cost_price = cost_price;
            layer.sell_price = sell_price;
            layer.purchased_at = at;
            return layer.id.clone();
        }

        let layer = StockLayer::new(
            None,
            at,
            0,
            cost_price,
            sell_price,
            store,
            LayerOrigin::Pricing,
        );
        let id = layer.id.clone();
        layers.push(layer);
        id
    }

    /// Consume `quantity` units oldest-first.
    ///
    /// Walks layers visible under the store scope ordered by purchase
    /// date ascending, ties by insertion order. All-or-nothing: if the
    /// units are not fully available, nothing is mutated and the
    /// shortfall is reported in the error.
    pub fn consume_fifo(
        &mut self,
        sku: &SkuId,
        store: Option<&StoreId>,
        quantity: i64,
    ) -> Result<Consumption, EngineError> {
        if quantity <= 0 {
            return Err(EngineError::InvalidQuantity(quantity));
        }

        let layers: &[StockLayer] = self.layers.get(sku).map(Vec::as_slice).unwrap_or(&[]);
        // Count only the layers the walk below may draw from.
        let available: i64 = layers
            .iter()
            .filter(|l| l.matches_store(store) && l.origin != LayerOrigin::Pricing)
            .map(|l| l.remaining_quantity)
            .sum();
        if available < quantity {
            return Err(EngineError::InsufficientStock {
                sku: sku.to_string(),
                requested: quantity,
                available,
            });
        }

        // Plan the walk before touching anything.
        let order = fifo_order(layers, store);
        let mut needed = quantity;
        let mut draws = Vec::new();
        let mut planned: Vec<(usize, i64)> = Vec::new();
        let mut cost_total = Money::ZERO;
        for &i in &order {
            if needed == 0 {
                break;
            }
            let layer = &layers[i];
            if layer.remaining_quantity == 0 {
                continue;
            }
            let take = layer.remaining_quantity.min(needed);
            let line_cost = layer
                .cost_price
                .checked_times(take)
                .ok_or(EngineError::Overflow)?;
            cost_total = cost_total
                .checked_add(line_cost)
                .ok_or(EngineError::Overflow)?;
            draws.push(LayerDraw {
                layer_id: layer.id.clone(),
                quantity: take,
                cost_price: layer.cost_price,
            });
            planned.push((i, take));
            needed -= take;
        }

        if let Some(layers) = self.layers.get_mut(sku) {
            for (i, take) in planned {
                layers[i].remaining_quantity -= take;
            }
        }
        Ok(Consumption { draws, cost_total })
    }

    /// Put a recorded draw back onto its source layer.
    pub fn restore_draw(&mut self, sku: &SkuId, draw: &LayerDraw) -> Result<(), EngineError> {
        let layers = self
            .layers
            .get_mut(sku)
            .ok_or_else(|| EngineError::SkuNotFound(sku.to_string()))?;
        let layer = layers
            .iter_mut()
            .find(|l| l.id == draw.layer_id)
            .ok_or_else(|| EngineError::LayerNotFound(draw.layer_id.to_string()))?;

        let restored = layer.remaining_quantity + draw.quantity;
        if restored > layer.initial_quantity {
            return Err(EngineError::LayerRestoreExceeded(draw.layer_id.to_string()));
        }
        layer.remaining_quantity = restored;
        Ok(())
    }

    /// Remove a layer created by a bill being deleted.
    ///
    /// Refused once anything has drawn on the layer: the layer is then
    /// load-bearing history and the bill must stay.
    pub fn retract_layer(&mut self, sku: &SkuId, layer_id: &LayerId) -> Result<(), EngineError> {
        let layers = self
            .layers
            .get_mut(sku)
            .ok_or_else(|| EngineError::SkuNotFound(sku.to_string()))?;
        let pos = layers
            .iter()
            .position(|l| &l.id == layer_id)
            .ok_or_else(|| EngineError::LayerNotFound(layer_id.to_string()))?;
        if !layers[pos].is_untouched() {
            return Err(EngineError::LayerConsumed(layer_id.to_string()));
        }
        layers.remove(pos);
        Ok(())
    }

    /// Copy the layer lists of the given SKUs into a working ledger.
    ///
    /// Bill commits simulate against the working copy and only absorb
    /// it back on full success.
    pub fn stage<'a>(&self, skus: impl IntoIterator<Item = &'a SkuId>) -> StockLedger {
        let mut staged = StockLedger::new();
        for sku in skus {
            let layers = self.layers.get(sku).cloned().unwrap_or_default();
            staged.layers.insert(sku.clone(), layers);
        }
        staged
    }

    /// Replace layer lists with those from a working copy.
    pub fn absorb(&mut self, staged: StockLedger) {
        for (sku, layers) in staged.layers {
            self.layers.insert(sku, layers);
        }
    }

    /// Insert rehydrated layers as-is.
    pub(crate) fn insert_layers(&mut self, sku: SkuId, layers: Vec<StockLayer>) {
        self.layers.insert(sku, layers);
    }

    /// Drop all layers of a SKU (product removal).
    pub(crate) fn remove_sku_layers(&mut self, sku: &SkuId) {
        self.layers.remove(sku);
    }
}

/// Indices of quantity-bearing layers visible under `store`, ordered by
/// purchase date ascending with ties broken by insertion order.
fn fifo_order(layers: &[StockLayer], store: Option<&StoreId>) -> Vec<usize> {
    let mut order: Vec<usize> = layers
        .iter()
        .enumerate()
        .filter(|(_, l)| l.matches_store(store) && l.origin != LayerOrigin::Pricing)
        .map(|(i, _)| i)
        .collect();
    order.sort_by_key(|&i| layers[i].purchased_at);
    order
}

fn weighted_average(pairs: impl Iterator<Item = (Money, i64)>) -> Option<Money> {
    let mut total: i128 = 0;
    let mut weight: i128 = 0;
    for (price, quantity) in pairs {
        total += price.cents() as i128 * quantity as i128;
        weight += quantity as i128;
    }
    if weight <= 0 {
        return None;
    }
    let half = if total >= 0 { weight / 2 } else { -(weight / 2) };
    Some(Money::from_cents(((total + half) / weight) as i64))
}
