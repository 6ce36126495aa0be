use log::*;
use ofe_common::Money;

use crate::catalog::{
    client::{CatalogApi, CatalogApiError},
    objects::Restaurant,
};

//--------------------------------------     PricedItem      ----------------------------------------------------------
/// A requested cart line, resolved and priced against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItem {
    pub menu_item_id: i64,
    pub menu_item_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl PricedItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

//--------------------------------------    ValidatedCart    ----------------------------------------------------------
/// The outcome of a successful cart validation: a restaurant snapshot and an exactly-priced item set.
#[derive(Debug, Clone)]
pub struct ValidatedCart {
    pub restaurant: Restaurant,
    pub items: Vec<PricedItem>,
    /// Exactly `Σ(unit_price × quantity)`, no rounding beyond the currency's minor unit.
    pub total_amount: Money,
}

/// Resolves the restaurant and every `(menu_item_id, quantity)` pair against the catalog.
///
/// Fails with `NotFound` when the restaurant does not resolve, and with `InvalidItem` when a menu item does not
/// resolve, belongs to a different restaurant, has a non-positive quantity, or the cart is empty.
pub async fn validate_cart<C: CatalogApi>(
    catalog: &C,
    restaurant_id: i64,
    items: &[(i64, i64)],
) -> Result<ValidatedCart, CatalogApiError> {
    if items.is_empty() {
        return Err(CatalogApiError::InvalidItem("An order must contain at least one item".to_string()));
    }
    let restaurant = catalog.restaurant_by_id(restaurant_id).await.map_err(|e| match e {
        CatalogApiError::NotFound(_) => CatalogApiError::NotFound(format!("Restaurant {restaurant_id} not found")),
        other => other,
    })?;
    let mut priced = Vec::with_capacity(items.len());
    let mut total_amount = Money::default();
    for &(menu_item_id, quantity) in items {
        if quantity <= 0 {
            return Err(CatalogApiError::InvalidItem(format!(
                "Quantity for menu item {menu_item_id} must be positive"
            )));
        }
        let menu_item = catalog.menu_item_by_id(menu_item_id).await.map_err(|e| match e {
            CatalogApiError::NotFound(_) => CatalogApiError::InvalidItem(format!("Menu item {menu_item_id} not found")),
            other => other,
        })?;
        if menu_item.restaurant_id != restaurant_id {
            return Err(CatalogApiError::InvalidItem(format!(
                "Menu item {menu_item_id} does not belong to restaurant {restaurant_id}"
            )));
        }
        let item = PricedItem {
            menu_item_id,
            menu_item_name: menu_item.name,
            quantity,
            unit_price: menu_item.price,
        };
        total_amount = total_amount + item.line_total();
        priced.push(item);
    }
    trace!("🍽️ Cart for restaurant {restaurant_id} validated: {} items, total {total_amount}", priced.len());
    Ok(ValidatedCart { restaurant, items: priced, total_amount })
}
