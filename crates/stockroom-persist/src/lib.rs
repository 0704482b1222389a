//! Tolerant snapshot persistence for the Stockroom engine.
//!
//! Engine state travels as a single JSON document. Every field of the
//! document is optional on the way in, so snapshots written by older
//! installs, hand-edited files, and partially damaged documents still
//! load: a repair pass fills the gaps with conservative defaults and
//! logs what it had to do. Only a completely unreadable document falls
//! back to empty state.
//!
//! # Example
//!
//! ```rust,ignore
//! use stockroom_persist::prelude::*;
//!
//! let mut store = MemoryStore::new();
//! save_engine(&mut store, "stockroom", &engine)?;
//!
//! // Later, possibly after an upgrade that added fields.
//! let engine = load_engine(&store, "stockroom")?;
//! ```

mod error;
mod repair;
mod snapshot;
mod store;

pub use error::PersistError;
pub use repair::repair;
pub use snapshot::Snapshot;
pub use store::{decode, encode, load_engine, save_engine, MemoryStore, SnapshotStore};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        decode, encode, load_engine, save_engine, MemoryStore, PersistError, Snapshot,
        SnapshotStore,
    };
}
