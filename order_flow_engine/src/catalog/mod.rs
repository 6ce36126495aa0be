//! The catalog validator: resolves restaurant and menu-item facts from the remote catalog service, prices carts, and
//! shields the engine from catalog outages with an explicit circuit breaker.

mod breaker;
mod client;
mod objects;
mod validate;

pub(crate) use breaker::read_env;
pub use breaker::{BreakerConfig, BreakerState, CircuitBreaker, Fallback, ResilientCatalog};
pub use client::{CatalogApi, CatalogApiError, CatalogConfig, RestCatalogClient};
pub use objects::{MenuItem, Restaurant};
pub use validate::{validate_cart, PricedItem, ValidatedCart};
