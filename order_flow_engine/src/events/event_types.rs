use chrono::{DateTime, Utc};
use ofe_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItem, OrderStatusType};

/// Routing key for newly placed orders.
pub const ROUTING_KEY_PLACED: &str = "order.event.placed";
pub const ROUTING_KEY_CANCELLED: &str = "order.event.cancelled";
pub const ROUTING_KEY_STATUS_UPDATED: &str = "order.event.status.updated";
pub const ROUTING_KEY_RATED: &str = "order.event.rated";
/// Wildcard binding that matches every order lifecycle event. Notification-style consumers bind this; a
/// kitchen-preparation consumer binds [`ROUTING_KEY_PLACED`] and [`ROUTING_KEY_STATUS_UPDATED`] only.
pub const ROUTING_KEY_ALL: &str = "order.event.#";

//--------------------------------------      EventKind      ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Placed,
    StatusUpdated,
    Cancelled,
    Rated,
}

impl EventKind {
    pub fn routing_key(&self) -> &'static str {
        match self {
            EventKind::Placed => ROUTING_KEY_PLACED,
            EventKind::StatusUpdated => ROUTING_KEY_STATUS_UPDATED,
            EventKind::Cancelled => ROUTING_KEY_CANCELLED,
            EventKind::Rated => ROUTING_KEY_RATED,
        }
    }

    /// The `eventType` string carried in the payload.
    pub fn wire_name(&self) -> &'static str {
        match self {
            EventKind::Placed => "ORDER_PLACED",
            EventKind::StatusUpdated => "ORDER_STATUS_UPDATED",
            EventKind::Cancelled => "ORDER_CANCELLED",
            EventKind::Rated => "ORDER_RATED",
        }
    }
}

//-------------------------------------- LifecycleEventItem  ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEventItem {
    pub menu_item_id: i64,
    pub menu_item_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl From<&OrderItem> for LifecycleEventItem {
    fn from(item: &OrderItem) -> Self {
        Self {
            menu_item_id: item.menu_item_id,
            menu_item_name: item.menu_item_name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

//-------------------------------------- OrderLifecycleEvent ----------------------------------------------------------
/// The message emitted on every state-affecting operation. Transient: this core never persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLifecycleEvent {
    pub order_id: i64,
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub restaurant_name: String,
    pub customer_email: String,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub items: Vec<LifecycleEventItem>,
    pub order_time: DateTime<Utc>,
    pub status: OrderStatusType,
    pub total_amount: Money,
    pub event_type: String,
}

impl OrderLifecycleEvent {
    pub fn new(kind: EventKind, order: &Order, items: &[OrderItem]) -> Self {
        Self {
            order_id: order.id,
            customer_id: order.customer_id,
            restaurant_id: order.restaurant_id,
            restaurant_name: order.restaurant_name.clone(),
            customer_email: order.customer_email.clone(),
            delivery_address: order.delivery_address.clone(),
            delivery_phone: order.delivery_phone.clone(),
            items: items.iter().map(LifecycleEventItem::from).collect(),
            order_time: order.created_at,
            status: order.status,
            total_amount: order.total_amount,
            event_type: kind.wire_name().to_string(),
        }
    }
}
