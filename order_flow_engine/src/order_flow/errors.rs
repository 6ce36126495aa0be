use thiserror::Error;

use crate::{access::AccessDenied, catalog::CatalogApiError, db::OrderDatabaseError, db_types::OrderStatusType};

/// Everything that can go wrong at the operation boundary of the order flow engine.
///
/// Each operation surfaces exactly one of these, with a human-readable reason; no operation returns a partially
/// populated success. The only failures that are ever absorbed rather than surfaced are event-publish failures,
/// which are logged inside the publisher.
#[derive(Debug, Error)]
pub enum OrderFlowError {
    /// The order, restaurant or menu item does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
    /// A menu item does not resolve, or belongs to a different restaurant than requested.
    #[error("{0}")]
    InvalidItem(String),
    /// The requested status change is not an edge in the transition table.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("Rating rejected: {0}")]
    RatingNotEligible(String),
    /// Authorization guard denial. Never conflated with `NotFound`.
    #[error("{0}")]
    Unauthorized(String),
    /// The catalog dependency is unreachable or its circuit breaker is open. Retryable by the caller; no partial
    /// order is ever created.
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("Backend storage error: {0}")]
    Database(#[from] OrderDatabaseError),
}

impl From<AccessDenied> for OrderFlowError {
    fn from(e: AccessDenied) -> Self {
        Self::Unauthorized(e.to_string())
    }
}

impl From<CatalogApiError> for OrderFlowError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::NotFound(s) => Self::NotFound(s),
            CatalogApiError::InvalidItem(s) => Self::InvalidItem(s),
            CatalogApiError::Unavailable(s) => Self::ServiceUnavailable(s),
        }
    }
}
