//! Stock layers and the FIFO ledger that owns them.

mod layer;
mod ledger;

pub use layer::{Consumption, LayerDraw, LayerOrigin, StockLayer, StockLevel};
pub use ledger::StockLedger;
