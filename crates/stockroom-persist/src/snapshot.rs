//! On-disk snapshot document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use stockroom_engine::prelude::*;

fn default_true() -> bool {
    true
}

/// The persisted document shape.
///
/// Every field tolerates absence so documents written by older
/// versions, or trimmed by hand, still decode; the repair pass fills in
/// whatever is missing before the engine sees it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub products: Vec<ProductSnapshot>,
    #[serde(default)]
    pub bills: Vec<BillSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_true")]
    pub tracks_quantity: bool,
    #[serde(default)]
    pub variants: Vec<VariantAxisSnapshot>,
    #[serde(default)]
    pub skus: Vec<SkuSnapshot>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantAxisSnapshot {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkuSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub layers: Vec<LayerSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub bill_id: Option<String>,
    #[serde(default)]
    pub purchased_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub initial_quantity: Option<i64>,
    #[serde(default)]
    pub remaining_quantity: Option<i64>,
    #[serde(default)]
    pub cost_price: Option<Money>,
    #[serde(default)]
    pub sell_price: Option<Money>,
    #[serde(default)]
    pub store_id: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub committed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<BillItemSnapshot>,
    #[serde(default)]
    pub total: Option<Money>,
    #[serde(default)]
    pub counterparty: Option<CounterpartySnapshot>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub store_id: Option<String>,
    #[serde(default)]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CounterpartySnapshot {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillItemSnapshot {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub sku_id: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub cost_price: Option<Money>,
    #[serde(default)]
    pub sell_price: Option<Money>,
    #[serde(default)]
    pub cost_total: Option<Money>,
    #[serde(default)]
    pub sell_total: Option<Money>,
    #[serde(default)]
    pub defective: bool,
    #[serde(default)]
    pub effect: EffectSnapshot,
}

/// Flattened ledger effect.
///
/// `created` and `consumed` are mutually exclusive in practice; both
/// empty means the line never touched stock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectSnapshot {
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub consumed: Vec<DrawSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrawSnapshot {
    #[serde(default)]
    pub layer_id: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub cost_price: Money,
}

impl Snapshot {
    /// Build the document form of exported engine state.
    pub fn from_state(state: &EngineState) -> Self {
        let mut skus_by_product: HashMap<ProductId, Vec<SkuSnapshot>> = HashMap::new();
        for record in &state.skus {
            skus_by_product
                .entry(record.sku.product_id.clone())
                .or_default()
                .push(SkuSnapshot::from_record(record));
        }

        Snapshot {
            products: state
                .products
                .iter()
                .map(|product| ProductSnapshot {
                    id: product.id.to_string(),
                    name: product.name.clone(),
                    category: product.category.clone(),
                    tracks_quantity: product.tracks_quantity,
                    variants: product
                        .variants
                        .iter()
                        .map(|axis| VariantAxisSnapshot {
                            name: axis.name.clone(),
                            options: axis.options.clone(),
                        })
                        .collect(),
                    skus: skus_by_product.remove(&product.id).unwrap_or_default(),
                    created_at: Some(product.created_at),
                    updated_at: Some(product.updated_at),
                })
                .collect(),
            bills: state.bills.iter().map(BillSnapshot::from_bill).collect(),
        }
    }
}

impl SkuSnapshot {
    fn from_record(record: &SkuRecord) -> Self {
        SkuSnapshot {
            id: record.sku.id.to_string(),
            options: record.sku.selection.pairs().iter().cloned().collect(),
            display_name: Some(record.sku.display_name.clone()),
            layers: record.layers.iter().map(LayerSnapshot::from_layer).collect(),
        }
    }
}

impl LayerSnapshot {
    fn from_layer(layer: &StockLayer) -> Self {
        LayerSnapshot {
            id: layer.id.to_string(),
            bill_id: layer.bill_id.as_ref().map(|id| id.to_string()),
            purchased_at: Some(layer.purchased_at),
            initial_quantity: Some(layer.initial_quantity),
            remaining_quantity: Some(layer.remaining_quantity),
            cost_price: Some(layer.cost_price),
            sell_price: Some(layer.sell_price),
            store_id: layer.store_id.as_ref().map(|id| id.to_string()),
            origin: Some(layer.origin.as_str().to_string()),
        }
    }
}

impl BillSnapshot {
    fn from_bill(bill: &Bill) -> Self {
        BillSnapshot {
            id: bill.id.to_string(),
            number: Some(bill.number.clone()),
            kind: Some(bill.kind.as_str().to_string()),
            committed_at: Some(bill.committed_at),
            items: bill.items.iter().map(BillItemSnapshot::from_item).collect(),
            total: Some(bill.total),
            counterparty: bill.counterparty.as_ref().map(|c| CounterpartySnapshot {
                name: c.name.clone(),
                phone: c.phone.clone(),
            }),
            payment_status: Some(bill.payment_status.as_str().to_string()),
            store_id: bill.store_id.as_ref().map(|id| id.to_string()),
            staff_id: bill.staff_id.as_ref().map(|id| id.to_string()),
            notes: bill.notes.clone(),
        }
    }
}

impl BillItemSnapshot {
    fn from_item(item: &BillItem) -> Self {
        BillItemSnapshot {
            product_id: item.product_id.to_string(),
            sku_id: item.sku_id.to_string(),
            options: item.options.pairs().iter().cloned().collect(),
            name: Some(item.name.clone()),
            quantity: Some(item.quantity),
            cost_price: Some(item.cost_price),
            sell_price: Some(item.sell_price),
            cost_total: Some(item.cost_total),
            sell_total: Some(item.sell_total),
            defective: item.defective,
            effect: EffectSnapshot::from_effect(&item.effect),
        }
    }
}

impl EffectSnapshot {
    fn from_effect(effect: &LedgerEffect) -> Self {
        match effect {
            LedgerEffect::None => EffectSnapshot::default(),
            LedgerEffect::Created(layer_id) => EffectSnapshot {
                created: Some(layer_id.to_string()),
                consumed: Vec::new(),
            },
            LedgerEffect::Consumed(draws) => EffectSnapshot {
                created: None,
                consumed: draws
                    .iter()
                    .map(|draw| DrawSnapshot {
                        layer_id: draw.layer_id.to_string(),
                        quantity: draw.quantity,
                        cost_price: draw.cost_price,
                    })
                    .collect(),
            },
        }
    }
}
