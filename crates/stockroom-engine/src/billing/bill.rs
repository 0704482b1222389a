//! Bill types.

use crate::catalog::VariantSelection;
use crate::ids::{BillId, LayerId, ProductId, SkuId, StaffId, StoreId};
use crate::ledger::LayerDraw;
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a bill does to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillKind {
    /// Stock bought in; lines append layers.
    Purchase,
    /// Stock sold; lines draw down layers oldest-first.
    Sale,
    /// Goods coming back from a customer.
    Return,
}

impl BillKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillKind::Purchase => "purchase",
            BillKind::Sale => "sale",
            BillKind::Return => "return",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(BillKind::Purchase),
            "sale" => Some(BillKind::Sale),
            "return" => Some(BillKind::Return),
            _ => None,
        }
    }
}

/// Settlement state of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// Fully settled.
    #[default]
    Paid,
    /// Part paid, remainder owed.
    Partial,
    /// Entirely owed.
    Unpaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Unpaid => "unpaid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "paid" => Some(PaymentStatus::Paid),
            "partial" => Some(PaymentStatus::Partial),
            "unpaid" => Some(PaymentStatus::Unpaid),
            _ => None,
        }
    }
}

/// The other party on a bill: supplier on purchases, customer on sales
/// and returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    /// Display name.
    pub name: String,
    /// Contact phone, if captured.
    pub phone: Option<String>,
}

impl Counterparty {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: None,
        }
    }
}

/// The ledger change a committed line made, recorded so deleting the
/// bill can undo exactly that change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum LedgerEffect {
    /// No ledger change (non-tracked lines, defective returns).
    #[default]
    None,
    /// A layer was appended.
    Created(LayerId),
    /// Units were drawn from existing layers.
    Consumed(Vec<LayerDraw>),
}

/// A committed bill line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    /// Product the line resolved to.
    pub product_id: ProductId,
    /// Concrete SKU the line resolved to.
    pub sku_id: SkuId,
    /// Variant options, canonical order.
    pub options: VariantSelection,
    /// SKU display name at commit time.
    pub name: String,
    /// Units moved.
    pub quantity: i64,
    /// Unit cost recognized for the line.
    pub cost_price: Money,
    /// Unit sell price recognized for the line.
    pub sell_price: Money,
    /// Line cost, unit cost times quantity.
    pub cost_total: Money,
    /// Line revenue, unit sell times quantity.
    pub sell_total: Money,
    /// Return line flagged as damaged goods.
    pub defective: bool,
    /// Ledger change this line made.
    pub effect: LedgerEffect,
}

/// A committed transaction record.
///
/// Bills are immutable once committed apart from their descriptive
/// metadata; undoing one goes through deletion, which reverses the
/// recorded per-line effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    /// Unique bill identifier.
    pub id: BillId,
    /// Human-readable bill number.
    pub number: String,
    /// Purchase, sale, or return.
    pub kind: BillKind,
    /// When the bill was committed (or backdated to).
    pub committed_at: DateTime<Utc>,
    /// Committed lines.
    pub items: Vec<BillItem>,
    /// Bill total: cost side for purchases, sell side otherwise.
    pub total: Money,
    /// Supplier or customer, if captured.
    pub counterparty: Option<Counterparty>,
    /// Settlement state.
    pub payment_status: PaymentStatus,
    /// Store the bill belongs to, None for the global scope.
    pub store_id: Option<StoreId>,
    /// Staff member who committed the bill.
    pub staff_id: Option<StaffId>,
    /// Free-form note.
    pub notes: Option<String>,
}

impl Bill {
    /// Generate a new bill number.
    pub fn generate_number() -> String {
        use std::time::{SystemTime, UNIX_EPOCH};
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        format!("BILL-{}", ts)
    }

    /// Total units across lines.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Check if the bill is fully settled.
    pub fn is_settled(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}
