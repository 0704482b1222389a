//! Engine error types.

use thiserror::Error;

/// Coarse error classification, for mapping onto API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown product, SKU, bill, or layer id.
    NotFound,
    /// Malformed or out-of-range request data.
    InvalidInput,
    /// FIFO consumption would shortfall.
    InsufficientStock,
    /// Operation not available for this product or in this state.
    UnsupportedOperation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::InsufficientStock => "insufficient_stock",
            ErrorKind::UnsupportedOperation => "unsupported_operation",
        }
    }
}

/// Errors that can occur in ledger operations.
///
/// Every mutating operation either fully succeeds or returns one of
/// these with no partial effect.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// SKU not found.
    #[error("SKU not found: {0}")]
    SkuNotFound(String),

    /// Bill not found.
    #[error("Bill not found: {0}")]
    BillNotFound(String),

    /// Stock layer not found.
    #[error("Stock layer not found: {0}")]
    LayerNotFound(String),

    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Bill request carried no lines.
    #[error("Bill has no line items")]
    EmptyBill,

    /// A required price was not supplied.
    #[error("Missing {0} price")]
    MissingPrice(&'static str),

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Insufficient stock for a FIFO consumption.
    #[error("Insufficient stock for {sku}: requested {requested}, available {available}")]
    InsufficientStock {
        sku: String,
        requested: i64,
        available: i64,
    },

    /// Stock operation against a product that does not track quantity.
    #[error("Product does not track stock: {0}")]
    UntrackedProduct(String),

    /// Standing prices apply only to non-tracked products.
    #[error("Product tracks stock and takes prices per layer: {0}")]
    StandingPriceTracked(String),

    /// A layer created by the bill being deleted was already drawn on.
    #[error("Stock layer already partially consumed: {0}")]
    LayerConsumed(String),

    /// A rollback would push a layer past its initial quantity.
    #[error("Restoring stock would exceed layer capacity: {0}")]
    LayerRestoreExceeded(String),

    /// Product still holds stock or appears on committed bills.
    #[error("Product has stock or bill history: {0}")]
    ProductInUse(String),

    /// A bill line failed simulation; the whole bill was rejected.
    #[error("Line {index}: {source}")]
    LineRejected {
        index: usize,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// The coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::ProductNotFound(_)
            | EngineError::SkuNotFound(_)
            | EngineError::BillNotFound(_)
            | EngineError::LayerNotFound(_) => ErrorKind::NotFound,
            EngineError::InvalidQuantity(_)
            | EngineError::EmptyBill
            | EngineError::MissingPrice(_)
            | EngineError::Overflow => ErrorKind::InvalidInput,
            EngineError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            EngineError::UntrackedProduct(_)
            | EngineError::StandingPriceTracked(_)
            | EngineError::LayerConsumed(_)
            | EngineError::LayerRestoreExceeded(_)
            | EngineError::ProductInUse(_) => ErrorKind::UnsupportedOperation,
            EngineError::LineRejected { source, .. } => source.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            EngineError::ProductNotFound("p1".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EngineError::InvalidQuantity(-2).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            EngineError::InsufficientStock {
                sku: "s1".into(),
                requested: 5,
                available: 3
            }
            .kind(),
            ErrorKind::InsufficientStock
        );
        assert_eq!(
            EngineError::UntrackedProduct("p1".into()).kind(),
            ErrorKind::UnsupportedOperation
        );
    }

    #[test]
    fn test_line_rejected_delegates_kind() {
        let err = EngineError::LineRejected {
            index: 2,
            source: Box::new(EngineError::InsufficientStock {
                sku: "s1".into(),
                requested: 10,
                available: 4,
            }),
        };
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert!(err.to_string().starts_with("Line 2:"));
    }
}
