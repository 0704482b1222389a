//! SKU identity and canonical variant selection.

use crate::ids::{ProductId, SkuId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A variant selection canonicalized for SKU identity.
///
/// Holds (axis name, option value) pairs sorted by axis name, so two
/// selections with the same content compare equal regardless of the
/// order the caller supplied them in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct VariantSelection(Vec<(String, String)>);

impl VariantSelection {
    /// The empty selection, used by products without variants.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build a canonical selection from arbitrary (name, value) pairs.
    ///
    /// Duplicate axis names keep the first value after sorting.
    pub fn new<N, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(n, v)| (n.into(), v.into()))
            .collect();
        pairs.sort();
        pairs.dedup_by(|a, b| a.0 == b.0);
        Self(pairs)
    }

    /// Build from an option map (already sorted and unique by key).
    pub fn from_map(map: BTreeMap<String, String>) -> Self {
        Self(map.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The canonical (axis, value) pairs.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    /// The selected value for an axis, if present.
    pub fn value_of(&self, axis: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == axis)
            .map(|(_, v)| v.as_str())
    }

    /// Option values in canonical order, for display names.
    pub fn values(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(|(_, v)| v.as_str())
    }
}

impl From<BTreeMap<String, String>> for VariantSelection {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self::from_map(map)
    }
}

/// A sellable variant combination of a product.
///
/// The selection is the identity: resolving the same product with the
/// same canonical selection always yields the same SKU.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sku {
    /// Unique SKU identifier.
    pub id: SkuId,
    /// Owning product.
    pub product_id: ProductId,
    /// Canonical variant selection (empty for plain products).
    pub selection: VariantSelection,
    /// Human-readable name, e.g. `"T-Shirt (Red, Large)"`.
    pub display_name: String,
}

impl Sku {
    /// Create a SKU for a product with the given canonical selection.
    pub fn new(product_id: ProductId, selection: VariantSelection, product_name: &str) -> Self {
        let display_name = Self::build_display_name(product_name, &selection);
        Self {
            id: SkuId::generate(),
            product_id,
            selection,
            display_name,
        }
    }

    /// Build the display name: product name followed by the option
    /// values in canonical order.
    pub fn build_display_name(product_name: &str, selection: &VariantSelection) -> String {
        if selection.is_empty() {
            product_name.to_string()
        } else {
            let values: Vec<&str> = selection.values().collect();
            format!("{} ({})", product_name, values.join(", "))
        }
    }
}
