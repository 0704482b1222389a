//! Bill request types.

use crate::billing::{BillKind, Counterparty, PaymentStatus};
use crate::ids::{ProductId, StaffId, StoreId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A bill submitted for commit.
///
/// Lines are processed in order against a working copy of the ledger;
/// the first rejected line aborts the whole request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillRequest {
    /// Purchase, sale, or return.
    pub kind: BillKind,
    /// Requested lines.
    pub lines: Vec<BillLine>,
    /// Descriptive metadata.
    #[serde(default)]
    pub meta: BillMeta,
}

impl BillRequest {
    pub fn new(kind: BillKind) -> Self {
        Self {
            kind,
            lines: Vec::new(),
            meta: BillMeta::default(),
        }
    }

    /// Append a line.
    pub fn line(mut self, line: BillLine) -> Self {
        self.lines.push(line);
        self
    }
}

/// Descriptive metadata carried onto the committed bill.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillMeta {
    /// Supplier or customer.
    #[serde(default)]
    pub counterparty: Option<Counterparty>,
    /// Settlement state, `Paid` when omitted.
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// Store scope for the bill.
    #[serde(default)]
    pub store_id: Option<StoreId>,
    /// Committing staff member.
    #[serde(default)]
    pub staff_id: Option<StaffId>,
    /// Free-form note.
    #[serde(default)]
    pub notes: Option<String>,
    /// Backdated commit time; now when omitted.
    #[serde(default)]
    pub committed_at: Option<DateTime<Utc>>,
}

/// One requested line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillLine {
    /// Product to move stock for.
    pub product_id: ProductId,
    /// Variant options selecting the SKU, in any order.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    /// Units to move.
    pub quantity: i64,
    /// Unit cost override.
    #[serde(default)]
    pub cost_price: Option<Money>,
    /// Unit sell override.
    #[serde(default)]
    pub sell_price: Option<Money>,
    /// Mark a return line as damaged goods.
    #[serde(default)]
    pub defective: bool,
}

impl BillLine {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            options: BTreeMap::new(),
            quantity,
            cost_price: None,
            sell_price: None,
            defective: false,
        }
    }

    /// Set a variant option.
    pub fn option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Set explicit unit prices.
    pub fn priced(mut self, cost: Money, sell: Money) -> Self {
        self.cost_price = Some(cost);
        self.sell_price = Some(sell);
        self
    }

    /// Set an explicit unit sell price.
    pub fn sell_at(mut self, sell: Money) -> Self {
        self.sell_price = Some(sell);
        self
    }

    /// Flag the line as damaged goods.
    pub fn mark_defective(mut self) -> Self {
        self.defective = true;
        self
    }
}

/// In-place update of a bill's descriptive metadata.
///
/// `None` fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillMetaUpdate {
    /// New settlement state.
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    /// New supplier or customer.
    #[serde(default)]
    pub counterparty: Option<Counterparty>,
    /// New note.
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_line_deserializes_with_defaults() {
        let line: BillLine =
            serde_json::from_str(r#"{"product_id":"p1","quantity":3}"#).unwrap();
        assert_eq!(line.quantity, 3);
        assert!(line.options.is_empty());
        assert_eq!(line.cost_price, None);
        assert!(!line.defective);
    }

    #[test]
    fn test_meta_defaults_to_paid_global() {
        let meta = BillMeta::default();
        assert_eq!(meta.payment_status, PaymentStatus::Paid);
        assert!(meta.store_id.is_none());
        assert!(meta.committed_at.is_none());
    }

    #[test]
    fn test_request_builder_appends_lines() {
        let request = BillRequest::new(BillKind::Sale)
            .line(BillLine::new(ProductId::new("p1"), 2))
            .line(BillLine::new(ProductId::new("p2"), 1).sell_at(Money::from_cents(500)));
        assert_eq!(request.lines.len(), 2);
        assert_eq!(request.lines[1].sell_price, Some(Money::from_cents(500)));
    }
}
