//! Order Flow Engine
//!
//! The Order Flow Engine turns cart submissions into durable orders and shepherds them through their lifecycle. This
//! library contains the core logic for the ordering side of the food delivery platform. It is transport-agnostic:
//! HTTP routing, credential verification and catalog CRUD live in other services, and the engine only consumes an
//! already-authenticated caller identity.
//!
//! The library is divided into four main sections:
//! 1. Database management and control ([`mod@db`]). Currently, Sqlite is the supported backend. You should never need
//!    to access the database directly; use the public API instead. The exception is the data types used in the
//!    database, which are defined in the `db_types` module and are public.
//! 2. The engine public API ([`OrderFlowApi`]). Create, read, cancel, transition and rate operations, plus paginated
//!    lists and per-customer / per-restaurant statistics. Every operation takes the caller identity as an explicit
//!    parameter and is authorization-gated before any write.
//! 3. The catalog validator ([`mod@catalog`]). A remote client that prices and validates cart items against the
//!    restaurant catalog, wrapped by an explicit circuit breaker with a deterministic fail-fast fallback.
//! 4. Lifecycle events ([`mod@events`]). Every state-affecting operation publishes a lifecycle event on an in-process
//!    topic channel after its write commits. Downstream consumers (kitchen preparation, notifications) bind by exact
//!    routing key or wildcard and are unknown to the publisher.

pub mod access;
pub mod catalog;
pub mod config;
pub mod db;
pub mod db_types;
pub mod events;
pub mod identity;
mod order_flow;
pub mod status;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteOrderDatabase;
pub use db::{OrderDatabase, OrderDatabaseError};
pub use order_flow::{
    api::OrderFlowApi,
    errors::OrderFlowError,
    order_objects::{CreateOrderRequest, NewOrderItemRequest, OrderQueryFilter, OrderStats, Page},
};
