//! Stock layer types.

use crate::ids::{BillId, LayerId, StoreId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a layer came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerOrigin {
    /// Received from a supplier purchase.
    Purchase,
    /// Restocked by a non-defective customer return.
    Return,
    /// Zero-quantity carrier for a non-tracked product's standing price.
    Pricing,
}

impl LayerOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerOrigin::Purchase => "purchase",
            LayerOrigin::Return => "return",
            LayerOrigin::Pricing => "pricing",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "purchase" => Some(LayerOrigin::Purchase),
            "return" => Some(LayerOrigin::Return),
            "pricing" => Some(LayerOrigin::Pricing),
            _ => None,
        }
    }
}

/// One discrete stock receipt for a SKU.
///
/// Layers are append-only: `remaining_quantity` is the only field that
/// moves, down on consumption or back up when a bill is rolled back. A
/// depleted layer is never deleted; it stays for historical costing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockLayer {
    /// Unique layer identifier.
    pub id: LayerId,
    /// Bill that created this layer (absent for standing-price layers).
    pub bill_id: Option<BillId>,
    /// When the stock was received.
    pub purchased_at: DateTime<Utc>,
    /// Units received.
    pub initial_quantity: i64,
    /// Units not yet consumed.
    pub remaining_quantity: i64,
    /// Unit cost price.
    pub cost_price: Money,
    /// Unit quoted sell price.
    pub sell_price: Money,
    /// Store the stock sits in (`None` = unscoped).
    pub store_id: Option<StoreId>,
    /// How the layer was created.
    pub origin: LayerOrigin,
}

impl StockLayer {
    pub fn new(
        bill_id: Option<BillId>,
        purchased_at: DateTime<Utc>,
        quantity: i64,
        cost_price: Money,
        sell_price: Money,
        store_id: Option<StoreId>,
        origin: LayerOrigin,
    ) -> Self {
        Self {
            id: LayerId::generate(),
            bill_id,
            purchased_at,
            initial_quantity: quantity,
            remaining_quantity: quantity,
            cost_price,
            sell_price,
            store_id,
            origin,
        }
    }

    /// Check if all units have been consumed.
    pub fn is_depleted(&self) -> bool {
        self.remaining_quantity == 0
    }

    /// Check if no units have been consumed yet.
    pub fn is_untouched(&self) -> bool {
        self.remaining_quantity == self.initial_quantity
    }

    /// Units consumed so far.
    pub fn consumed_quantity(&self) -> i64 {
        self.initial_quantity - self.remaining_quantity
    }

    /// Check if this layer is visible under a store scope.
    ///
    /// `None` is the global view and matches every layer; a concrete
    /// store matches only layers scoped to that store.
    pub fn matches_store(&self, store: Option<&StoreId>) -> bool {
        match store {
            None => true,
            Some(store) => self.store_id.as_ref() == Some(store),
        }
    }
}

/// A draw against one layer during FIFO consumption.
///
/// Recorded on the committed bill item, so deleting the bill can put
/// exactly these units back where they came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerDraw {
    /// Layer drawn from.
    pub layer_id: LayerId,
    /// Units taken.
    pub quantity: i64,
    /// Unit cost of that layer.
    pub cost_price: Money,
}

/// Result of a FIFO consumption walk.
#[derive(Debug, Clone, PartialEq)]
pub struct Consumption {
    /// Per-layer breakdown, oldest first.
    pub draws: Vec<LayerDraw>,
    /// Exact cost of everything drawn.
    pub cost_total: Money,
}

impl Consumption {
    /// Total units drawn.
    pub fn quantity(&self) -> i64 {
        self.draws.iter().map(|d| d.quantity).sum()
    }

    /// Quantity-weighted average unit cost, rounded to the cent.
    pub fn average_unit_cost(&self) -> Money {
        self.cost_total.div_round(self.quantity())
    }
}

/// Stock total for a SKU, or the marker that the owning product has no
/// quantity semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockLevel {
    /// Units on hand for a tracked product.
    Tracked(i64),
    /// The product does not track quantity.
    Untracked,
}

impl StockLevel {
    /// Units on hand, `None` for non-tracked products.
    pub fn units(&self) -> Option<i64> {
        match self {
            StockLevel::Tracked(units) => Some(*units),
            StockLevel::Untracked => None,
        }
    }

    pub fn is_untracked(&self) -> bool {
        matches!(self, StockLevel::Untracked)
    }
}
