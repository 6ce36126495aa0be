//! Role- and ownership-aware access checks.
//!
//! Every mutating operation runs through the guard before any write. Ownership for restaurant owners is dynamic: it
//! is resolved through the catalog's owner lookup on each check, and a failed lookup is treated as a denial.

use log::*;
use thiserror::Error;

use crate::{
    catalog::CatalogApi,
    db_types::Order,
    identity::{Role, UserIdentity},
};

#[derive(Debug, Clone, Error)]
#[error("Unauthorized: {0}")]
pub struct AccessDenied(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOperation {
    Read,
    Cancel,
    UpdateStatus,
    Rate,
}

impl OrderOperation {
    fn verb(&self) -> &'static str {
        match self {
            OrderOperation::Read => "view",
            OrderOperation::Cancel => "cancel",
            OrderOperation::UpdateStatus => "update",
            OrderOperation::Rate => "rate",
        }
    }
}

#[derive(Clone)]
pub struct AccessGuard<C: CatalogApi> {
    catalog: C,
}

impl<C: CatalogApi> AccessGuard<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// `allow | deny(reason)` for a single-order operation.
    pub async fn authorize(
        &self,
        op: OrderOperation,
        order: &Order,
        caller: &UserIdentity,
    ) -> Result<(), AccessDenied> {
        let allowed = match (caller.role, op) {
            (Role::Customer, OrderOperation::Read | OrderOperation::Cancel | OrderOperation::Rate) => {
                order.customer_id == caller.user_id
            },
            (Role::RestaurantOwner, OrderOperation::Read | OrderOperation::UpdateStatus) => {
                self.owns_restaurant(caller, order.restaurant_id).await
            },
            (Role::Admin, OrderOperation::Read | OrderOperation::UpdateStatus) => true,
            _ => false,
        };
        if allowed {
            Ok(())
        } else {
            debug!("🔐️ {caller} may not {} order #{}", op.verb(), order.id);
            Err(AccessDenied(format!("You are not authorized to {} this order", op.verb())))
        }
    }

    /// Customers may only create orders for themselves.
    pub fn authorize_create(&self, caller: &UserIdentity, customer_id: i64) -> Result<(), AccessDenied> {
        if caller.role == Role::Customer && caller.user_id == customer_id {
            Ok(())
        } else {
            debug!("🔐️ {caller} may not place an order for customer #{customer_id}");
            Err(AccessDenied("Only a customer can place an order for themself".to_string()))
        }
    }

    /// Gate for customer-scoped lists and statistics.
    pub fn authorize_customer_view(&self, caller: &UserIdentity, customer_id: i64) -> Result<(), AccessDenied> {
        match caller.role {
            Role::Admin => Ok(()),
            Role::Customer if caller.user_id == customer_id => Ok(()),
            _ => {
                debug!("🔐️ {caller} may not view orders for customer #{customer_id}");
                Err(AccessDenied("You are not authorized to view orders for this customer".to_string()))
            },
        }
    }

    /// Gate for restaurant-scoped lists and statistics.
    pub async fn authorize_restaurant_view(
        &self,
        caller: &UserIdentity,
        restaurant_id: i64,
    ) -> Result<(), AccessDenied> {
        match caller.role {
            Role::Admin => Ok(()),
            Role::RestaurantOwner if self.owns_restaurant(caller, restaurant_id).await => Ok(()),
            _ => {
                debug!("🔐️ {caller} may not view orders for restaurant #{restaurant_id}");
                Err(AccessDenied("You are not authorized to view orders for this restaurant".to_string()))
            },
        }
    }

    /// A lookup failure of any kind counts as "does not own".
    async fn owns_restaurant(&self, caller: &UserIdentity, restaurant_id: i64) -> bool {
        match self.catalog.restaurant_for_owner(caller.user_id).await {
            Ok(restaurant) => restaurant.id == restaurant_id,
            Err(e) => {
                warn!("🔐️ Could not resolve restaurant ownership for {caller}: {e}. Denying access.");
                false
            },
        }
    }
}
