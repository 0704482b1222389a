//! Product catalog module.
//!
//! Contains products with their variant axes, and the canonical SKU
//! resolution that gives every sellable combination a stable identity.

mod catalog;
mod product;
mod sku;

pub use catalog::Catalog;
pub use product::{NewProduct, Product, ProductUpdate, VariantAxis};
pub use sku::{Sku, VariantSelection};
