//! Snapshot repair.

use crate::snapshot::{
    BillItemSnapshot, BillSnapshot, LayerSnapshot, SkuSnapshot, Snapshot,
};
use chrono::{DateTime, Utc};
use stockroom_engine::prelude::*;

/// Turn a decoded snapshot into engine state, filling in whatever the
/// document lost.
///
/// Two classes of gaps are handled differently: values derivable from
/// the rest of the document (display names, line totals) are rebuilt
/// silently, while genuinely lost information (ids, dates, prices) is
/// replaced with conservative defaults and counted. A derived total
/// that would overflow clamps to zero and counts as a fix. Bills whose
/// kind is unreadable are dropped rather than guessed at, since a
/// misfiled bill corrupts every report downstream.
pub fn repair(snapshot: Snapshot) -> EngineState {
    let mut fixes = 0usize;
    let mut products = Vec::new();
    let mut skus = Vec::new();

    for product_snapshot in snapshot.products {
        let id = if product_snapshot.id.is_empty() {
            fixes += 1;
            ProductId::generate()
        } else {
            ProductId::new(product_snapshot.id)
        };
        let now = Utc::now();
        let product = Product {
            id,
            name: product_snapshot.name,
            category: product_snapshot.category,
            tracks_quantity: product_snapshot.tracks_quantity,
            variants: product_snapshot
                .variants
                .into_iter()
                .map(|axis| VariantAxis::new(axis.name, axis.options))
                .collect(),
            created_at: product_snapshot.created_at.unwrap_or(now),
            updated_at: product_snapshot.updated_at.unwrap_or(now),
        };

        let mut records: Vec<SkuRecord> = product_snapshot
            .skus
            .into_iter()
            .map(|sku| repair_sku(&product, sku, &mut fixes))
            .collect();
        if records.is_empty() && product.variants.is_empty() {
            // Plain products always carry their default SKU.
            fixes += 1;
            records.push(SkuRecord {
                sku: Sku::new(product.id.clone(), VariantSelection::empty(), &product.name),
                layers: Vec::new(),
            });
        }

        products.push(product);
        skus.extend(records);
    }

    let bills: Vec<Bill> = snapshot
        .bills
        .into_iter()
        .filter_map(|bill| repair_bill(bill, &mut fixes))
        .collect();

    if fixes > 0 {
        tracing::warn!(fixes, "repaired snapshot while loading");
    }
    EngineState {
        products,
        skus,
        bills,
    }
}

fn repair_sku(product: &Product, snapshot: SkuSnapshot, fixes: &mut usize) -> SkuRecord {
    let id = if snapshot.id.is_empty() {
        *fixes += 1;
        SkuId::generate()
    } else {
        SkuId::new(snapshot.id)
    };
    let selection = VariantSelection::from_map(snapshot.options);
    let display_name = match snapshot.display_name {
        Some(name) if !name.is_empty() => name,
        _ => Sku::build_display_name(&product.name, &selection),
    };
    let layers = snapshot
        .layers
        .into_iter()
        .map(|layer| repair_layer(layer, fixes))
        .collect();

    SkuRecord {
        sku: Sku {
            id,
            product_id: product.id.clone(),
            selection,
            display_name,
        },
        layers,
    }
}

fn repair_layer(snapshot: LayerSnapshot, fixes: &mut usize) -> StockLayer {
    let id = if snapshot.id.is_empty() {
        *fixes += 1;
        LayerId::generate()
    } else {
        LayerId::new(snapshot.id)
    };
    let purchased_at = match snapshot.purchased_at {
        Some(at) => at,
        None => {
            *fixes += 1;
            // Undated layers sort to the front and drain first.
            DateTime::<Utc>::UNIX_EPOCH
        }
    };
    let remaining_quantity = match snapshot.remaining_quantity {
        Some(remaining) if remaining >= 0 => remaining,
        _ => {
            *fixes += 1;
            0
        }
    };
    let initial_quantity = match snapshot.initial_quantity {
        Some(initial) if initial >= remaining_quantity => initial,
        _ => {
            *fixes += 1;
            remaining_quantity
        }
    };
    let cost_price = match snapshot.cost_price {
        Some(cost) => cost,
        None => {
            *fixes += 1;
            Money::ZERO
        }
    };
    let sell_price = match snapshot.sell_price {
        Some(sell) => sell,
        None => {
            *fixes += 1;
            Money::ZERO
        }
    };
    let origin = match snapshot.origin.as_deref().and_then(LayerOrigin::from_str) {
        Some(origin) => origin,
        None => {
            *fixes += 1;
            LayerOrigin::Purchase
        }
    };
    // Pricing layers carry prices, never stock.
    let (initial_quantity, remaining_quantity) = if origin == LayerOrigin::Pricing
        && (initial_quantity != 0 || remaining_quantity != 0)
    {
        *fixes += 1;
        (0, 0)
    } else {
        (initial_quantity, remaining_quantity)
    };

    StockLayer {
        id,
        bill_id: snapshot.bill_id.map(BillId::new),
        purchased_at,
        initial_quantity,
        remaining_quantity,
        cost_price,
        sell_price,
        store_id: snapshot.store_id.map(StoreId::new),
        origin,
    }
}

fn repair_bill(snapshot: BillSnapshot, fixes: &mut usize) -> Option<Bill> {
    let kind = match snapshot.kind.as_deref().and_then(BillKind::from_str) {
        Some(kind) => kind,
        None => {
            *fixes += 1;
            tracing::warn!(bill = %snapshot.id, "dropping bill with unreadable kind");
            return None;
        }
    };
    let id = if snapshot.id.is_empty() {
        *fixes += 1;
        BillId::generate()
    } else {
        BillId::new(snapshot.id)
    };
    let committed_at = match snapshot.committed_at {
        Some(at) => at,
        None => {
            *fixes += 1;
            DateTime::<Utc>::UNIX_EPOCH
        }
    };
    let number = match snapshot.number {
        Some(number) if !number.is_empty() => number,
        _ => {
            *fixes += 1;
            Bill::generate_number()
        }
    };
    let payment_status = match snapshot.payment_status.as_deref() {
        None => PaymentStatus::default(),
        Some(s) => match PaymentStatus::from_str(s) {
            Some(status) => status,
            None => {
                *fixes += 1;
                PaymentStatus::default()
            }
        },
    };
    let items: Vec<BillItem> = snapshot
        .items
        .into_iter()
        .map(|item| repair_item(item, fixes))
        .collect();
    let total = match snapshot.total {
        Some(total) => total,
        None => {
            let derived = match kind {
                BillKind::Purchase => checked_sum(&items, |i| i.cost_total),
                BillKind::Sale | BillKind::Return => checked_sum(&items, |i| i.sell_total),
            };
            match derived {
                Some(total) => total,
                None => {
                    *fixes += 1;
                    Money::ZERO
                }
            }
        }
    };

    Some(Bill {
        id,
        number,
        kind,
        committed_at,
        items,
        total,
        counterparty: snapshot.counterparty.map(|c| Counterparty {
            name: c.name,
            phone: c.phone,
        }),
        payment_status,
        store_id: snapshot.store_id.map(StoreId::new),
        staff_id: snapshot.staff_id.map(StaffId::new),
        notes: snapshot.notes,
    })
}

fn repair_item(snapshot: BillItemSnapshot, fixes: &mut usize) -> BillItem {
    let quantity = match snapshot.quantity {
        Some(quantity) if quantity >= 0 => quantity,
        _ => {
            *fixes += 1;
            0
        }
    };
    let cost_price = match snapshot.cost_price {
        Some(cost) => cost,
        None => {
            *fixes += 1;
            Money::ZERO
        }
    };
    let sell_price = match snapshot.sell_price {
        Some(sell) => sell,
        None => {
            *fixes += 1;
            Money::ZERO
        }
    };
    let cost_total = match snapshot.cost_total {
        Some(total) => total,
        None => line_total(cost_price, quantity, fixes),
    };
    let sell_total = match snapshot.sell_total {
        Some(total) => total,
        None => line_total(sell_price, quantity, fixes),
    };

    let effect = if let Some(created) = snapshot.effect.created {
        LedgerEffect::Created(LayerId::new(created))
    } else if !snapshot.effect.consumed.is_empty() {
        LedgerEffect::Consumed(
            snapshot
                .effect
                .consumed
                .into_iter()
                .map(|draw| LayerDraw {
                    layer_id: LayerId::new(draw.layer_id),
                    quantity: draw.quantity,
                    cost_price: draw.cost_price,
                })
                .collect(),
        )
    } else {
        LedgerEffect::None
    };

    BillItem {
        product_id: ProductId::new(snapshot.product_id),
        sku_id: SkuId::new(snapshot.sku_id),
        options: VariantSelection::from_map(snapshot.options),
        name: snapshot.name.unwrap_or_default(),
        quantity,
        cost_price,
        sell_price,
        cost_total,
        sell_total,
        defective: snapshot.defective,
        effect,
    }
}

fn line_total(price: Money, quantity: i64, fixes: &mut usize) -> Money {
    match price.checked_times(quantity) {
        Some(total) => total,
        None => {
            *fixes += 1;
            Money::ZERO
        }
    }
}

fn checked_sum(items: &[BillItem], pick: impl Fn(&BillItem) -> Money) -> Option<Money> {
    items
        .iter()
        .try_fold(Money::ZERO, |acc, item| acc.checked_add(pick(item)))
}
