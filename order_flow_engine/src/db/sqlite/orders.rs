use chrono::{DateTime, Utc};
use log::*;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatusType},
    db::OrderDatabaseError,
    order_flow::order_objects::OrderQueryFilter,
};

/// Inserts a new order row using the given connection. This is not atomic on its own; the caller embeds it in a
/// transaction together with [`insert_order_items`] and passes `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderDatabaseError> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                customer_id,
                restaurant_id,
                restaurant_name,
                customer_email,
                status,
                total_amount,
                delivery_address,
                delivery_phone,
                special_instructions,
                estimated_delivery_time
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(order.customer_id)
    .bind(order.restaurant_id)
    .bind(order.restaurant_name)
    .bind(order.customer_email)
    .bind(OrderStatusType::Pending)
    .bind(order.total_amount)
    .bind(order.delivery_address)
    .bind(order.delivery_phone)
    .bind(order.special_instructions)
    .bind(order.estimated_delivery_time)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order #{} inserted for customer {}", order.id, order.customer_id);
    Ok(order)
}

pub async fn insert_order_items(
    order_id: i64,
    items: Vec<NewOrderItem>,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, OrderDatabaseError> {
    let mut stored = Vec::with_capacity(items.len());
    for item in items {
        let row: OrderItem = sqlx::query_as(
            r#"
                INSERT INTO order_items (
                    order_id,
                    menu_item_id,
                    menu_item_name,
                    quantity,
                    unit_price,
                    special_instructions
                ) VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *;
            "#,
        )
        .bind(order_id)
        .bind(item.menu_item_id)
        .bind(item.menu_item_name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.special_instructions)
        .fetch_one(&mut *conn)
        .await?;
        stored.push(row);
    }
    Ok(stored)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, OrderDatabaseError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_items(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, OrderDatabaseError> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Compare-and-set status update. The `AND status = $from` clause makes the store the arbiter between concurrent
/// writers: the loser matches zero rows and gets `None` back.
pub(crate) async fn checked_status_update(
    order_id: i64,
    from: OrderStatusType,
    to: OrderStatusType,
    estimated_delivery: Option<DateTime<Utc>>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderDatabaseError> {
    let result: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders
            SET status = $1,
                estimated_delivery_time = COALESCE($2, estimated_delivery_time),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND status = $4
            RETURNING *;
        "#,
    )
    .bind(to)
    .bind(estimated_delivery)
    .bind(order_id)
    .bind(from)
    .fetch_optional(conn)
    .await?;
    if result.is_none() {
        debug!("🗃️ Status write {from} -> {to} on order #{order_id} matched no row. Caller must re-validate.");
    }
    Ok(result)
}

/// The SQL guard (`status = 'DELIVERED' AND rating IS NULL`) enforces rate-at-most-once even under concurrent calls.
pub(crate) async fn set_order_rating(
    order_id: i64,
    rating: i64,
    review: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderDatabaseError> {
    let result: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders
            SET rating = $1, review = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND status = $4 AND rating IS NULL
            RETURNING *;
        "#,
    )
    .bind(rating)
    .bind(review)
    .bind(order_id)
    .bind(OrderStatusType::Delivered)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`, newest first.
pub async fn search_orders(
    filter: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderDatabaseError> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(cid) = filter.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(cid);
    }
    if let Some(rid) = filter.restaurant_id {
        where_clause.push("restaurant_id = ");
        where_clause.push_bind_unseparated(rid);
    }
    if let Some(statuses) = filter.status.as_ref().filter(|s| !s.is_empty()) {
        let statuses = statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    if let Some(page) = filter.page {
        builder.push(format!(" LIMIT {} OFFSET {}", page.limit, page.offset));
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {} rows", orders.len());
    Ok(orders)
}
