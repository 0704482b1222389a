//! Catalog store and SKU resolution.

use crate::catalog::{NewProduct, Product, ProductUpdate, Sku, VariantSelection};
use crate::error::EngineError;
use crate::ids::{ProductId, SkuId};
use chrono::Utc;
use std::collections::HashMap;

/// Owns products and their resolved SKUs.
///
/// Resolution is the only way SKUs come into existence: the first bill
/// line (or caller) that names a (product, selection) pair creates the
/// SKU, and every later mention resolves to the same one.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: HashMap<ProductId, Product>,
    /// Product ids in creation order.
    order: Vec<ProductId>,
    skus: HashMap<SkuId, Sku>,
    /// SKU ids per product, in creation order.
    product_skus: HashMap<ProductId, Vec<SkuId>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a product from an input payload.
    pub fn create_product(&mut self, input: NewProduct) -> ProductId {
        let mut product = Product::new(input.name, input.tracks_quantity);
        product.category = input.category;
        product.variants = input.variants;

        let id = product.id.clone();
        self.order.push(id.clone());
        self.product_skus.insert(id.clone(), Vec::new());
        self.products.insert(id.clone(), product);
        id
    }

    /// Look up a product.
    pub fn product(&self, id: &ProductId) -> Result<&Product, EngineError> {
        self.products
            .get(id)
            .ok_or_else(|| EngineError::ProductNotFound(id.to_string()))
    }

    /// All products, in creation order.
    pub fn products(&self) -> impl Iterator<Item = &Product> + '_ {
        self.order.iter().filter_map(|id| self.products.get(id))
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    /// Apply a typed partial update to a product.
    ///
    /// Renaming refreshes the display names of the product's SKUs.
    pub fn update_product(
        &mut self,
        id: &ProductId,
        update: ProductUpdate,
    ) -> Result<(), EngineError> {
        let product = self
            .products
            .get_mut(id)
            .ok_or_else(|| EngineError::ProductNotFound(id.to_string()))?;

        let renamed = update.name.is_some() && update.name.as_deref() != Some(&product.name);
        if let Some(name) = update.name {
            product.name = name;
        }
        if let Some(category) = update.category {
            product.category = Some(category);
        }
        if let Some(tracks) = update.tracks_quantity {
            product.tracks_quantity = tracks;
        }
        if let Some(variants) = update.variants {
            product.variants = variants;
        }
        product.updated_at = Utc::now();

        if renamed {
            let name = product.name.clone();
            for sku_id in self.product_skus.get(id).cloned().unwrap_or_default() {
                if let Some(sku) = self.skus.get_mut(&sku_id) {
                    sku.display_name = Sku::build_display_name(&name, &sku.selection);
                }
            }
        }
        Ok(())
    }

    /// Resolve a selection to an existing SKU, without creating one.
    pub fn resolve_sku(
        &self,
        product_id: &ProductId,
        selection: &VariantSelection,
    ) -> Option<&Sku> {
        self.product_skus
            .get(product_id)?
            .iter()
            .filter_map(|id| self.skus.get(id))
            .find(|sku| &sku.selection == selection)
    }

    /// Resolve a selection to its SKU, creating one on first use.
    ///
    /// The selection is compared canonically, so callers may supply the
    /// pairs in any order. Unknown product ids fail; option values are
    /// the caller's to validate against the product's axes.
    pub fn resolve_or_create_sku(
        &mut self,
        product_id: &ProductId,
        selection: VariantSelection,
    ) -> Result<SkuId, EngineError> {
        let product_name = self.product(product_id)?.name.clone();

        if let Some(existing) = self.resolve_sku(product_id, &selection) {
            return Ok(existing.id.clone());
        }

        let sku = Sku::new(product_id.clone(), selection, &product_name);
        let sku_id = sku.id.clone();
        self.product_skus
            .entry(product_id.clone())
            .or_default()
            .push(sku_id.clone());
        self.skus.insert(sku_id.clone(), sku);
        Ok(sku_id)
    }

    /// Look up a SKU.
    pub fn sku(&self, id: &SkuId) -> Result<&Sku, EngineError> {
        self.skus
            .get(id)
            .ok_or_else(|| EngineError::SkuNotFound(id.to_string()))
    }

    /// SKUs of one product, in creation order.
    pub fn skus_of(&self, product_id: &ProductId) -> impl Iterator<Item = &Sku> + '_ {
        self.product_skus
            .get(product_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.skus.get(id))
    }

    /// All SKUs, grouped by product in creation order.
    pub fn skus(&self) -> impl Iterator<Item = &Sku> + '_ {
        self.order.iter().flat_map(|pid| self.skus_of(pid))
    }

    /// Drop a SKU record. Used to unwind SKUs created by a rejected bill.
    pub(crate) fn remove_sku(&mut self, id: &SkuId) {
        if let Some(sku) = self.skus.remove(id) {
            if let Some(list) = self.product_skus.get_mut(&sku.product_id) {
                list.retain(|s| s != id);
            }
        }
    }

    /// Remove a product and all its SKU records.
    ///
    /// Returns the removed product and its SKU ids so the caller can
    /// clear dependent state. Guarding against removal of products with
    /// stock or bill history is the caller's responsibility.
    pub(crate) fn remove_product(
        &mut self,
        id: &ProductId,
    ) -> Result<(Product, Vec<SkuId>), EngineError> {
        let product = self
            .products
            .remove(id)
            .ok_or_else(|| EngineError::ProductNotFound(id.to_string()))?;
        self.order.retain(|p| p != id);
        let sku_ids = self.product_skus.remove(id).unwrap_or_default();
        for sku_id in &sku_ids {
            self.skus.remove(sku_id);
        }
        Ok((product, sku_ids))
    }

    /// Insert a rehydrated product record as-is.
    pub(crate) fn insert_product_record(&mut self, product: Product) {
        let id = product.id.clone();
        if !self.products.contains_key(&id) {
            self.order.push(id.clone());
            self.product_skus.entry(id.clone()).or_default();
        }
        self.products.insert(id, product);
    }

    /// Insert a rehydrated SKU record as-is.
    pub(crate) fn insert_sku_record(&mut self, sku: Sku) {
        let id = sku.id.clone();
        let product_id = sku.product_id.clone();
        if !self.skus.contains_key(&id) {
            self.product_skus.entry(product_id).or_default().push(id.clone());
        }
        self.skus.insert(id, sku);
    }
}
