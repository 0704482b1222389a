//! Inventory ledger engine for Stockroom.
//!
//! This crate keeps a retail catalog and its stock as an append-only
//! ledger of FIFO cost layers:
//!
//! - **Catalog**: Products, variant axes, canonical SKU resolution
//! - **Ledger**: Per-SKU stock layers, FIFO consumption, price queries
//! - **Billing**: Atomic purchase/sale/return commits and rollback
//! - **Reporting**: Day summaries, coverage, rankings, daily series
//!
//! # Example
//!
//! ```rust,ignore
//! use stockroom_engine::prelude::*;
//!
//! let mut engine = InventoryEngine::new();
//! let product_id = engine.create_product(NewProduct::plain("Widget", true));
//!
//! // Buy 10 at 5.00 / sell 8.00, then sell 4 of them.
//! let purchase = BillRequest::new(BillKind::Purchase).line(
//!     BillLine::new(product_id.clone(), 10)
//!         .priced(Money::from_decimal(5.00), Money::from_decimal(8.00)),
//! );
//! engine.commit_bill(&purchase)?;
//!
//! let sale = BillRequest::new(BillKind::Sale)
//!     .line(BillLine::new(product_id.clone(), 4));
//! let bill_id = engine.commit_bill(&sale)?;
//!
//! let bill = engine.bill(&bill_id)?;
//! println!("sold at {} each", bill.items[0].sell_price);
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod billing;
pub mod catalog;
pub mod engine;
pub mod ledger;
pub mod reporting;

pub use engine::{EngineState, InventoryEngine, SkuRecord};
pub use error::{EngineError, ErrorKind};
pub use ids::*;
pub use money::Money;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::engine::{EngineState, InventoryEngine, SkuRecord};
    pub use crate::error::{EngineError, ErrorKind};
    pub use crate::ids::*;
    pub use crate::money::Money;

    // Catalog
    pub use crate::catalog::{
        Catalog, NewProduct, Product, ProductUpdate, Sku, VariantAxis, VariantSelection,
    };

    // Ledger
    pub use crate::ledger::{
        Consumption, LayerDraw, LayerOrigin, StockLayer, StockLedger, StockLevel,
    };

    // Billing
    pub use crate::billing::{
        Bill, BillItem, BillKind, BillLine, BillMeta, BillMetaUpdate, BillRequest, Counterparty,
        LedgerEffect, PaymentStatus,
    };

    // Reporting
    pub use crate::reporting::{
        DailyPoint, DaySummary, ExpenseCoverage, ProductPerformance,
    };
}
