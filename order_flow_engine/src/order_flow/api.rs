use std::collections::HashMap;

use chrono::Utc;
use log::*;

use crate::{
    access::{AccessGuard, OrderOperation},
    catalog::{validate_cart, CatalogApi},
    db::OrderDatabase,
    db_types::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatusType},
    events::{EventKind, EventPublisher},
    identity::UserIdentity,
    order_flow::{
        errors::OrderFlowError,
        order_objects::{CreateOrderRequest, OrderQueryFilter, OrderStats, Page},
    },
    status,
};

/// How many times a status write is retried when it loses a compare-and-set race before giving up.
const MAX_TRANSITION_ATTEMPTS: usize = 3;

/// The primary API of the order flow engine.
///
/// Every operation follows the same shape: authorize the caller, validate the request against the current state,
/// write through the backend, and only then publish the matching lifecycle event. The event is emitted strictly
/// after the commit and never fails the operation.
pub struct OrderFlowApi<B, C>
where
    B: OrderDatabase,
    C: CatalogApi,
{
    db: B,
    catalog: C,
    guard: AccessGuard<C>,
    publisher: EventPublisher,
}

impl<B, C> OrderFlowApi<B, C>
where
    B: OrderDatabase,
    C: CatalogApi,
{
    pub fn new(db: B, catalog: C, publisher: EventPublisher) -> Self {
        let guard = AccessGuard::new(catalog.clone());
        Self { db, catalog, guard, publisher }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Places a new order.
    ///
    /// The cart is priced against the live catalog; client-supplied prices do not exist in the request. If any item
    /// fails validation, or the catalog is unavailable, nothing is written. The order and all its items are inserted
    /// in a single transaction, and an `ORDER_PLACED` event is published after the commit.
    pub async fn create_order(
        &self,
        caller: &UserIdentity,
        req: &CreateOrderRequest,
    ) -> Result<(Order, Vec<OrderItem>), OrderFlowError> {
        self.guard.authorize_create(caller, req.customer_id)?;
        let lines = req.items.iter().map(|i| (i.menu_item_id, i.quantity)).collect::<Vec<_>>();
        let cart = validate_cart(&self.catalog, req.restaurant_id, &lines).await?;
        let new_order = NewOrder {
            customer_id: req.customer_id,
            restaurant_id: cart.restaurant.id,
            restaurant_name: cart.restaurant.name.clone(),
            customer_email: req.customer_email.clone(),
            total_amount: cart.total_amount,
            delivery_address: req.delivery_address.clone(),
            delivery_phone: req.delivery_phone.clone(),
            special_instructions: req.special_instructions.clone(),
            estimated_delivery_time: status::estimated_delivery_for(OrderStatusType::Pending, Utc::now()),
        };
        // validate_cart preserves request order, so lines and priced items zip 1:1
        let new_items = cart
            .items
            .into_iter()
            .zip(req.items.iter())
            .map(|(priced, requested)| NewOrderItem {
                menu_item_id: priced.menu_item_id,
                menu_item_name: priced.menu_item_name,
                quantity: priced.quantity,
                unit_price: priced.unit_price,
                special_instructions: requested.special_instructions.clone(),
            })
            .collect::<Vec<_>>();
        let (order, items) = self.db.insert_order(new_order, new_items).await?;
        info!(
            "🔄️📦️ Order #{} created for customer #{} at {} ({} items, {})",
            order.id,
            order.customer_id,
            order.restaurant_name,
            items.len(),
            order.total_amount
        );
        self.publisher.publish(EventKind::Placed, &order, &items).await;
        Ok((order, items))
    }

    /// Fetches a single order with its items, subject to the read guard.
    pub async fn fetch_order(
        &self,
        caller: &UserIdentity,
        order_id: i64,
    ) -> Result<(Order, Vec<OrderItem>), OrderFlowError> {
        let order = self.order_or_not_found(order_id).await?;
        self.guard.authorize(OrderOperation::Read, &order, caller).await?;
        let items = self.db.fetch_order_items(order_id).await?;
        Ok((order, items))
    }

    /// Moves an order along the lifecycle.
    ///
    /// The write is a compare-and-set against the status the caller last observed; on a lost race the order is
    /// re-read and the transition re-validated against the fresh state. Moving into `PREPARING` or
    /// `OUT_FOR_DELIVERY` refreshes the delivery estimate. Publishes `ORDER_STATUS_UPDATED` on success.
    pub async fn update_order_status(
        &self,
        caller: &UserIdentity,
        order_id: i64,
        new_status: OrderStatusType,
    ) -> Result<Order, OrderFlowError> {
        let order = self.order_or_not_found(order_id).await?;
        self.guard.authorize(OrderOperation::UpdateStatus, &order, caller).await?;
        // items are immutable once persisted, so reading them ahead of the status write is safe; after the commit
        // nothing may turn the operation into an error any more
        let items = self.db.fetch_order_items(order_id).await?;
        let updated = self.transition(order, new_status, status::is_valid_transition).await?;
        info!("🔄️📦️ Order #{} moved to {} by {caller}", updated.id, updated.status);
        self.publisher.publish(EventKind::StatusUpdated, &updated, &items).await;
        Ok(updated)
    }

    /// Cancels an order on behalf of its customer. Only `PENDING` and `CONFIRMED` orders can be cancelled this way;
    /// later stages are already being prepared or carried. Publishes `ORDER_CANCELLED` on success.
    pub async fn cancel_order(
        &self,
        caller: &UserIdentity,
        order_id: i64,
    ) -> Result<Order, OrderFlowError> {
        let order = self.order_or_not_found(order_id).await?;
        self.guard.authorize(OrderOperation::Cancel, &order, caller).await?;
        let items = self.db.fetch_order_items(order_id).await?;
        let cancelled =
            self.transition(order, OrderStatusType::Cancelled, |from, _| status::can_cancel(from)).await?;
        info!("🔄️📦️ Order #{} cancelled by {caller}", cancelled.id);
        self.publisher.publish(EventKind::Cancelled, &cancelled, &items).await;
        Ok(cancelled)
    }

    /// Records a rating (1-5) and optional review for a delivered order, at most once. Publishes `ORDER_RATED` on
    /// success.
    pub async fn rate_order(
        &self,
        caller: &UserIdentity,
        order_id: i64,
        rating: i64,
        review: Option<String>,
    ) -> Result<Order, OrderFlowError> {
        if !(1..=5).contains(&rating) {
            return Err(OrderFlowError::RatingNotEligible("Rating must be between 1 and 5".to_string()));
        }
        let order = self.order_or_not_found(order_id).await?;
        self.guard.authorize(OrderOperation::Rate, &order, caller).await?;
        if order.status != OrderStatusType::Delivered {
            return Err(OrderFlowError::RatingNotEligible("Only delivered orders can be rated".to_string()));
        }
        if order.rating.is_some() {
            return Err(OrderFlowError::RatingNotEligible("This order has already been rated".to_string()));
        }
        let items = self.db.fetch_order_items(order_id).await?;
        // the WHERE guard in the store re-checks both conditions, closing the race window
        let rated = self
            .db
            .set_order_rating(order_id, rating, review)
            .await?
            .ok_or_else(|| OrderFlowError::RatingNotEligible("This order has already been rated".to_string()))?;
        info!("🔄️📦️ Order #{} rated {}/5 by {caller}", rated.id, rating);
        self.publisher.publish(EventKind::Rated, &rated, &items).await;
        Ok(rated)
    }

    /// All orders for a customer, newest first.
    pub async fn orders_for_customer(
        &self,
        caller: &UserIdentity,
        customer_id: i64,
        page: Option<Page>,
    ) -> Result<Vec<Order>, OrderFlowError> {
        self.guard.authorize_customer_view(caller, customer_id)?;
        let mut filter = OrderQueryFilter::customer(customer_id);
        filter.page = page;
        Ok(self.db.search_orders(filter).await?)
    }

    /// Orders for a restaurant, optionally narrowed to one status, newest first.
    pub async fn orders_for_restaurant(
        &self,
        caller: &UserIdentity,
        restaurant_id: i64,
        status: Option<OrderStatusType>,
        page: Option<Page>,
    ) -> Result<Vec<Order>, OrderFlowError> {
        self.guard.authorize_restaurant_view(caller, restaurant_id).await?;
        let mut filter = OrderQueryFilter::restaurant(restaurant_id);
        if let Some(status) = status {
            filter = filter.with_status(status);
        }
        filter.page = page;
        Ok(self.db.search_orders(filter).await?)
    }

    /// Order statistics for a customer, including their favorite restaurant.
    pub async fn customer_stats(
        &self,
        caller: &UserIdentity,
        customer_id: i64,
    ) -> Result<OrderStats, OrderFlowError> {
        self.guard.authorize_customer_view(caller, customer_id)?;
        let orders = self.db.search_orders(OrderQueryFilter::customer(customer_id)).await?;
        Ok(stats_for(&orders, true))
    }

    /// Order statistics for a restaurant.
    pub async fn restaurant_stats(
        &self,
        caller: &UserIdentity,
        restaurant_id: i64,
    ) -> Result<OrderStats, OrderFlowError> {
        self.guard.authorize_restaurant_view(caller, restaurant_id).await?;
        let orders = self.db.search_orders(OrderQueryFilter::restaurant(restaurant_id)).await?;
        Ok(stats_for(&orders, false))
    }

    async fn order_or_not_found(&self, order_id: i64) -> Result<Order, OrderFlowError> {
        self.db
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| OrderFlowError::NotFound(format!("Order #{order_id} does not exist")))
    }

    /// Compare-and-set transition loop. `check` is the policy for the attempted move; it is re-evaluated against
    /// the fresh state after every lost race.
    async fn transition(
        &self,
        order: Order,
        to: OrderStatusType,
        check: impl Fn(OrderStatusType, OrderStatusType) -> bool,
    ) -> Result<Order, OrderFlowError> {
        let mut current = order;
        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            if !check(current.status, to) {
                return Err(OrderFlowError::InvalidTransition { from: current.status, to });
            }
            let eta = status::estimated_delivery_for(to, Utc::now());
            match self.db.checked_status_update(current.id, current.status, to, eta).await? {
                Some(updated) => return Ok(updated),
                None => {
                    debug!("🔄️📦️ Lost a status race on order #{}. Re-reading.", current.id);
                    current = self.order_or_not_found(current.id).await?;
                },
            }
        }
        Err(OrderFlowError::ServiceUnavailable(format!(
            "Order #{} is being modified concurrently. Try again.",
            current.id
        )))
    }
}

/// Aggregates a result set into [`OrderStats`]. `orders` arrives newest first, so a tie for favorite restaurant
/// resolves to the one most recently ordered from.
fn stats_for(orders: &[Order], with_favorite: bool) -> OrderStats {
    let completed = orders.iter().filter(|o| o.status == OrderStatusType::Delivered).count();
    let cancelled = orders.iter().filter(|o| o.status == OrderStatusType::Cancelled).count();
    let total_spent =
        orders.iter().filter(|o| o.status == OrderStatusType::Delivered).map(|o| o.total_amount).sum();
    let ratings = orders.iter().filter_map(|o| o.rating).collect::<Vec<_>>();
    let average_rating =
        if ratings.is_empty() { None } else { Some(ratings.iter().sum::<i64>() as f64 / ratings.len() as f64) };
    let favorite_restaurant = with_favorite.then(|| favorite_restaurant(orders)).flatten();
    OrderStats {
        total_orders: orders.len(),
        completed_orders: completed,
        cancelled_orders: cancelled,
        pending_orders: orders.len() - completed - cancelled,
        total_spent,
        average_rating,
        favorite_restaurant,
    }
}

fn favorite_restaurant(orders: &[Order]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for order in orders {
        let name = order.restaurant_name.as_str();
        if !counts.contains_key(name) {
            first_seen.push(name);
        }
        *counts.entry(name).or_default() += 1;
    }
    // max_by_key keeps the last maximum, so reversing makes a tie fall to the earliest (most recent) entry
    first_seen.into_iter().rev().max_by_key(|name| counts[name]).map(|name| name.to_string())
}
