//! Product and variant-axis types.

use crate::ids::ProductId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named variant axis with its allowed option values.
///
/// Example: axis "Color" with options "Red", "Blue".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariantAxis {
    /// Axis name (e.g., "Size", "Color").
    pub name: String,
    /// Ordered option values (e.g., "Small", "Large").
    pub options: Vec<String>,
}

impl VariantAxis {
    pub fn new(name: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    /// Check whether `value` is one of this axis's options.
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o == value)
    }
}

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Category label for grouping and reports.
    pub category: Option<String>,
    /// Whether stock quantities are tracked for this product.
    ///
    /// Non-tracked products (services, non-inventory items) carry only
    /// a standing price and have no stock semantics.
    pub tracks_quantity: bool,
    /// Variant axes (empty for a plain product).
    pub variants: Vec<VariantAxis>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Create a new product.
    pub fn new(name: impl Into<String>, tracks_quantity: bool) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::generate(),
            name: name.into(),
            category: None,
            tracks_quantity,
            variants: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if this product defines variant axes.
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Look up a variant axis by name.
    pub fn variant(&self, name: &str) -> Option<&VariantAxis> {
        self.variants.iter().find(|v| v.name == name)
    }
}

/// Input payload for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: Option<String>,
    pub tracks_quantity: bool,
    #[serde(default)]
    pub variants: Vec<VariantAxis>,
}

impl NewProduct {
    /// Convenience constructor for a plain product with no variants.
    pub fn plain(name: impl Into<String>, tracks_quantity: bool) -> Self {
        Self {
            name: name.into(),
            category: None,
            tracks_quantity,
            variants: Vec::new(),
        }
    }
}

/// Typed partial update for a product.
///
/// Fields left as `None` are unchanged. Variant edits replace the axis
/// list wholesale; SKUs already resolved keep their identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub tracks_quantity: Option<bool>,
    pub variants: Option<Vec<VariantAxis>>,
}
