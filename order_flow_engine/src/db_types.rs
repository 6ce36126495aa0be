use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use ofe_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   OrderStatusType     --------------------------------------------------------
/// The lifecycle status of an order. Statuses only ever move forward through the transition graph defined in
/// [`crate::status`]; `Delivered` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order has been placed but the restaurant has not accepted it yet.
    Pending,
    /// The restaurant has accepted the order.
    Confirmed,
    /// The kitchen is preparing the order.
    Preparing,
    /// The order is ready for a courier to collect.
    ReadyForPickup,
    /// A courier is on the way to the customer.
    OutForDelivery,
    /// The order has been delivered. Terminal.
    Delivered,
    /// The order was cancelled from `Pending` or `Confirmed`. Terminal.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::Pending => "PENDING",
            OrderStatusType::Confirmed => "CONFIRMED",
            OrderStatusType::Preparing => "PREPARING",
            OrderStatusType::ReadyForPickup => "READY_FOR_PICKUP",
            OrderStatusType::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatusType::Delivered => "DELIVERED",
            OrderStatusType::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "PREPARING" => Ok(Self::Preparing),
            "READY_FOR_PICKUP" => Ok(Self::ReadyForPickup),
            "OUT_FOR_DELIVERY" => Ok(Self::OutForDelivery),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Order        ----------------------------------------------------------
/// A placed order. Restaurant and menu facts are snapshotted at creation time, so later catalog changes never alter
/// order history, and reads never join across service boundaries.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub restaurant_name: String,
    pub customer_email: String,
    pub status: OrderStatusType,
    pub total_amount: Money,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub special_instructions: Option<String>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    /// 1-5, set at most once while the order is `Delivered`.
    pub rating: Option<i64>,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      OrderItem      ----------------------------------------------------------
/// A priced line within an order. Immutable once the order is persisted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub menu_item_name: String,
    pub quantity: i64,
    /// Snapshot of the catalog price at order time.
    pub unit_price: Money,
    pub special_instructions: Option<String>,
}

//--------------------------------------       NewOrder      ----------------------------------------------------------
/// An order that has been validated and priced but not yet persisted. Only [`crate::OrderFlowApi::create_order`]
/// constructs these.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: i64,
    pub restaurant_id: i64,
    /// Snapshot of the restaurant name at order time.
    pub restaurant_name: String,
    pub customer_email: String,
    /// The exact sum of `unit_price * quantity` over the validated items.
    pub total_amount: Money,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub special_instructions: Option<String>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
}

//--------------------------------------     NewOrderItem    ----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub menu_item_id: i64,
    pub menu_item_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub special_instructions: Option<String>,
}
