//! Persistence error types.

use thiserror::Error;

/// Errors that can occur loading or saving snapshots.
#[derive(Error, Debug)]
pub enum PersistError {
    /// Failed to serialize state.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failed to perform store operation.
    #[error("Store operation failed: {0}")]
    Store(String),
}
