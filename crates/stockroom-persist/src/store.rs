//! Snapshot stores and the encode/decode entry points.

use std::collections::HashMap;

use crate::repair::repair;
use crate::snapshot::Snapshot;
use crate::PersistError;
use stockroom_engine::{EngineState, InventoryEngine};

/// Where encoded snapshot documents live.
///
/// The engine itself is storage-agnostic; implementations put the JSON
/// wherever the embedding application keeps its data. A missing key is
/// not an error, it means no snapshot was ever saved.
pub trait SnapshotStore {
    /// Fetch the document under `key`, `None` when absent.
    fn load(&self, key: &str) -> Result<Option<String>, PersistError>;

    /// Write the document under `key`, replacing any previous one.
    fn save(&mut self, key: &str, json: &str) -> Result<(), PersistError>;
}

/// In-memory store for tests and short-lived embeddings.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, json: &str) -> Result<(), PersistError> {
        self.entries.insert(key.to_string(), json.to_string());
        Ok(())
    }
}

/// Encode engine state as a snapshot document.
pub fn encode(state: &EngineState) -> Result<String, PersistError> {
    Ok(serde_json::to_string(&Snapshot::from_state(state))?)
}

/// Decode a snapshot document, repairing whatever it can.
///
/// An unreadable document yields empty state rather than an error, so
/// the embedding application starts with what it has instead of
/// refusing to start at all.
pub fn decode(json: &str) -> EngineState {
    match serde_json::from_str::<Snapshot>(json) {
        Ok(snapshot) => repair(snapshot),
        Err(err) => {
            tracing::warn!(%err, "snapshot unreadable, starting empty");
            EngineState::default()
        }
    }
}

/// Save an engine's full state under `key`.
///
/// # Example
///
/// ```rust,ignore
/// let mut store = MemoryStore::new();
/// save_engine(&mut store, "stockroom", &engine)?;
/// ```
pub fn save_engine<S: SnapshotStore>(
    store: &mut S,
    key: &str,
    engine: &InventoryEngine,
) -> Result<(), PersistError> {
    let json = encode(&engine.export_state())?;
    store.save(key, &json)
}

/// Load an engine from `key`, a fresh one when nothing is stored.
pub fn load_engine<S: SnapshotStore>(
    store: &S,
    key: &str,
) -> Result<InventoryEngine, PersistError> {
    match store.load(key)? {
        Some(json) => Ok(InventoryEngine::from_state(decode(&json))),
        None => Ok(InventoryEngine::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_engine::prelude::*;

    fn seeded_engine() -> InventoryEngine {
        let mut engine = InventoryEngine::new();
        let product_id = engine.create_product(NewProduct::plain("Widget", true));

        let purchase = BillRequest::new(BillKind::Purchase).line(
            BillLine::new(product_id.clone(), 10)
                .priced(Money::from_cents(500), Money::from_cents(800)),
        );
        engine.commit_bill(&purchase).unwrap();

        let sale = BillRequest::new(BillKind::Sale).line(BillLine::new(product_id, 4));
        engine.commit_bill(&sale).unwrap();
        engine
    }

    #[test]
    fn test_engine_round_trips_through_store() {
        let engine = seeded_engine();
        let mut store = MemoryStore::new();
        save_engine(&mut store, "stockroom", &engine).unwrap();

        let loaded = load_engine(&store, "stockroom").unwrap();
        assert_eq!(loaded.export_state(), engine.export_state());
    }

    #[test]
    fn test_missing_key_yields_fresh_engine() {
        let store = MemoryStore::new();
        let engine = load_engine(&store, "stockroom").unwrap();
        assert_eq!(engine.product_count(), 0);
        assert!(engine.bills().is_empty());
    }

    #[test]
    fn test_garbage_document_yields_empty_state() {
        let mut store = MemoryStore::new();
        store.save("stockroom", "{ not json at all").unwrap();

        let engine = load_engine(&store, "stockroom").unwrap();
        assert_eq!(engine.product_count(), 0);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let state = decode(r#"{"version":9,"products":[],"widgets":[1,2,3]}"#);
        assert_eq!(state, EngineState::default());
    }

    #[test]
    fn test_saved_document_is_plain_json() {
        let engine = seeded_engine();
        let json = encode(&engine.export_state()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["products"][0]["name"], "Widget");
        assert_eq!(value["bills"].as_array().map(Vec::len), Some(2));
    }
}
