use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{
    migrate,
    sqlite::{SqlitePool, SqlitePoolOptions},
};

use super::orders;
use crate::{
    db::{OrderDatabase, OrderDatabaseError},
    db_types::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatusType},
    order_flow::order_objects::OrderQueryFilter,
};

#[derive(Clone)]
pub struct SqliteOrderDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteOrderDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteOrderDatabase ({:?})", self.pool)
    }
}

impl SqliteOrderDatabase {
    /// The pool is capped at one connection: a second pooled connection can serve a snapshot that predates the
    /// latest commit, so a read after a committed status write could still see the old status. SQLite serialises
    /// writers anyway, so a single connection costs nothing and gives read-your-writes.
    pub async fn new_with_url(url: &str) -> Result<Self, OrderDatabaseError> {
        let pool = SqlitePoolOptions::new().max_connections(1).connect(url).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), OrderDatabaseError> {
        migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }
}

impl OrderDatabase for SqliteOrderDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(
        &self,
        order: NewOrder,
        items: Vec<NewOrderItem>,
    ) -> Result<(Order, Vec<OrderItem>), OrderDatabaseError> {
        if items.is_empty() {
            return Err(OrderDatabaseError::EmptyOrder);
        }
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut *tx).await?;
        let items = orders::insert_order_items(order.id, items, &mut *tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{} committed with {} items", order.id, items.len());
        Ok((order, items))
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_items(order_id, &mut conn).await
    }

    async fn checked_status_update(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
        estimated_delivery: Option<DateTime<Utc>>,
    ) -> Result<Option<Order>, OrderDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        orders::checked_status_update(order_id, from, to, estimated_delivery, &mut conn).await
    }

    async fn set_order_rating(
        &self,
        order_id: i64,
        rating: i64,
        review: Option<String>,
    ) -> Result<Option<Order>, OrderDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        orders::set_order_rating(order_id, rating, review, &mut conn).await
    }

    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        orders::search_orders(filter, &mut conn).await
    }
}
