use ofe_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::OrderStatusType;

//-------------------------------------- CreateOrderRequest  ----------------------------------------------------------

/// A cart as submitted by a customer. Prices are deliberately absent; every line is priced against the live catalog
/// at creation time and the total is computed server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: i64,
    pub customer_email: String,
    pub restaurant_id: i64,
    pub items: Vec<NewOrderItemRequest>,
    pub delivery_address: String,
    pub delivery_phone: String,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItemRequest {
    pub menu_item_id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

//--------------------------------------        Paging       ----------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(page: i64, size: i64) -> Self {
        Self { limit: size, offset: page * size }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: 20, offset: 0 }
    }
}

//-------------------------------------- OrderQueryFilter    ----------------------------------------------------------

/// Search criteria for order queries. Results are always returned newest first.
#[derive(Debug, Clone, Default)]
pub struct OrderQueryFilter {
    pub customer_id: Option<i64>,
    pub restaurant_id: Option<i64>,
    pub status: Option<Vec<OrderStatusType>>,
    pub page: Option<Page>,
}

impl OrderQueryFilter {
    pub fn customer(customer_id: i64) -> Self {
        Self { customer_id: Some(customer_id), ..Default::default() }
    }

    pub fn restaurant(restaurant_id: i64) -> Self {
        Self { restaurant_id: Some(restaurant_id), ..Default::default() }
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    /// True when no WHERE criteria are present. Paging does not count.
    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none() &&
            self.restaurant_id.is_none() &&
            self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true)
    }
}

//--------------------------------------      OrderStats     ----------------------------------------------------------

/// Aggregate view over a set of orders. `favorite_restaurant` is only populated for customer-scoped statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: usize,
    pub completed_orders: usize,
    pub cancelled_orders: usize,
    pub pending_orders: usize,
    /// Sum over delivered orders only.
    pub total_spent: Money,
    /// Mean of the ratings that exist, or `None` if nothing has been rated yet.
    pub average_rating: Option<f64>,
    pub favorite_restaurant: Option<String>,
}
