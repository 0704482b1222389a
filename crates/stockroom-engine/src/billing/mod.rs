//! Bills: the only write path into the ledger.
//!
//! A bill request is simulated in full against a working copy of the
//! touched stock and committed atomically, so a rejected line never
//! leaves partial movements behind.

mod bill;
mod processor;
mod request;

pub use bill::{Bill, BillItem, BillKind, Counterparty, LedgerEffect, PaymentStatus};
pub use request::{BillLine, BillMeta, BillMetaUpdate, BillRequest};

pub(crate) use processor::TransactionProcessor;
