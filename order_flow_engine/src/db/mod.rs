//! Database management and control.
//!
//! The order store is the single source of truth and the sole arbiter of conflicting concurrent mutations. The
//! engine never locks in-process: status writes are compare-and-set against the status the caller read, and a racing
//! writer re-reads and re-validates.

#[cfg(feature = "sqlite")]
pub mod sqlite;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatusType},
    order_flow::order_objects::OrderQueryFilter,
};

#[derive(Debug, Error)]
pub enum OrderDatabaseError {
    #[error("Database error: {0}")]
    Backend(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("An order must contain at least one item")]
    EmptyOrder,
}

/// The behaviour a backend must provide to support the order flow engine.
#[allow(async_fn_in_trait)]
pub trait OrderDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Persists the order and all of its items in a single transaction. Either the order row and every item row
    /// commit, or none do. Returns the stored records with server-assigned ids and timestamps.
    async fn insert_order(
        &self,
        order: NewOrder,
        items: Vec<NewOrderItem>,
    ) -> Result<(Order, Vec<OrderItem>), OrderDatabaseError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderDatabaseError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderDatabaseError>;

    /// Compare-and-set status update: the write only lands if the order still has status `from`. Returns `None` when
    /// the row raced (or vanished), in which case the caller must re-read and re-validate. When `estimated_delivery`
    /// is `None` the stored estimate is left untouched.
    async fn checked_status_update(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
        estimated_delivery: Option<DateTime<Utc>>,
    ) -> Result<Option<Order>, OrderDatabaseError>;

    /// Records a rating and optional review. Guarded in SQL: only lands while the order is `DELIVERED` and unrated,
    /// so a rating can never be set twice. Returns `None` if the guard did not hold.
    async fn set_order_rating(
        &self,
        order_id: i64,
        rating: i64,
        review: Option<String>,
    ) -> Result<Option<Order>, OrderDatabaseError>;

    /// Fetches orders matching the filter, newest first.
    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderDatabaseError>;
}
