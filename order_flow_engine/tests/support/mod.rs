//! Shared fixtures for the integration suite: a throwaway Sqlite store per test, a seeded in-memory catalog, and
//! an event capture bound to the wildcard routing key.

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::*;
use ofe_common::Money;
use order_flow_engine::{
    catalog::{BreakerConfig, CatalogApi, CatalogApiError, MenuItem, ResilientCatalog, Restaurant},
    db_types::OrderStatusType,
    events::{EventPublisher, OrderLifecycleEvent, TopicChannel, ROUTING_KEY_ALL},
    identity::{Role, UserIdentity},
    CreateOrderRequest, NewOrderItemRequest, OrderFlowApi, SqliteOrderDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tokio::sync::mpsc;

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
}

pub fn random_db_path() -> String {
    format!("sqlite://../data/test_orders_{}", rand::random::<u64>())
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

pub async fn new_database() -> SqliteOrderDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteOrderDatabase::new_with_url(&url).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    db
}

//--------------------------------------     MockCatalog     ----------------------------------------------------------

/// A seeded catalog with a toggleable outage. While "down", every call fails with `Unavailable`, exactly like a
/// refused connection.
#[derive(Clone)]
pub struct MockCatalog {
    restaurants: Arc<Vec<Restaurant>>,
    menu: Arc<Vec<MenuItem>>,
    down: Arc<AtomicBool>,
}

pub const MAMAS_KITCHEN: i64 = 1;
pub const SUSHI_PALACE: i64 = 2;
pub const MAMAS_OWNER: i64 = 10;
pub const SUSHI_OWNER: i64 = 20;
pub const BURGER: i64 = 11;
pub const CHIPS: i64 = 12;
pub const SASHIMI: i64 = 21;

impl MockCatalog {
    pub fn seeded() -> Self {
        let restaurants = vec![
            Restaurant { id: MAMAS_KITCHEN, name: "Mama's Kitchen".to_string(), owner_id: MAMAS_OWNER },
            Restaurant { id: SUSHI_PALACE, name: "Sushi Palace".to_string(), owner_id: SUSHI_OWNER },
        ];
        let menu = vec![
            MenuItem {
                id: BURGER,
                name: "Burger".to_string(),
                price: Money::from_cents(1599),
                restaurant_id: MAMAS_KITCHEN,
            },
            MenuItem {
                id: CHIPS,
                name: "Chips".to_string(),
                price: Money::from_cents(599),
                restaurant_id: MAMAS_KITCHEN,
            },
            MenuItem {
                id: SASHIMI,
                name: "Sashimi".to_string(),
                price: Money::from_cents(2250),
                restaurant_id: SUSHI_PALACE,
            },
        ];
        Self { restaurants: Arc::new(restaurants), menu: Arc::new(menu), down: Arc::new(AtomicBool::new(false)) }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check_up(&self) -> Result<(), CatalogApiError> {
        if self.down.load(Ordering::SeqCst) {
            Err(CatalogApiError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

impl CatalogApi for MockCatalog {
    async fn restaurant_by_id(&self, restaurant_id: i64) -> Result<Restaurant, CatalogApiError> {
        self.check_up()?;
        self.restaurants
            .iter()
            .find(|r| r.id == restaurant_id)
            .cloned()
            .ok_or_else(|| CatalogApiError::NotFound(format!("restaurant {restaurant_id}")))
    }

    async fn menu_item_by_id(&self, menu_item_id: i64) -> Result<MenuItem, CatalogApiError> {
        self.check_up()?;
        self.menu
            .iter()
            .find(|m| m.id == menu_item_id)
            .cloned()
            .ok_or_else(|| CatalogApiError::NotFound(format!("menu item {menu_item_id}")))
    }

    async fn restaurant_for_owner(&self, owner_id: i64) -> Result<Restaurant, CatalogApiError> {
        self.check_up()?;
        self.restaurants
            .iter()
            .find(|r| r.owner_id == owner_id)
            .cloned()
            .ok_or_else(|| CatalogApiError::NotFound(format!("owner {owner_id}")))
    }
}

//--------------------------------------       Harness       ----------------------------------------------------------

pub struct Harness<C: CatalogApi> {
    pub api: OrderFlowApi<SqliteOrderDatabase, C>,
    /// The raw seeded catalog, for toggling outages mid-test.
    pub catalog: MockCatalog,
    /// The catalog instance the engine actually calls (possibly breaker-guarded).
    pub gateway: C,
    /// Captures every lifecycle event, bound to `order.event.#`.
    pub events: mpsc::Receiver<OrderLifecycleEvent>,
}

pub async fn new_harness() -> Harness<MockCatalog> {
    let catalog = MockCatalog::seeded();
    harness_with(catalog.clone(), catalog).await
}

pub async fn new_guarded_harness(config: BreakerConfig) -> Harness<ResilientCatalog<MockCatalog>> {
    let catalog = MockCatalog::seeded();
    let guarded = ResilientCatalog::new(catalog.clone(), config, std::time::Duration::from_secs(1));
    harness_with(catalog, guarded).await
}

async fn harness_with<C: CatalogApi>(catalog: MockCatalog, gateway: C) -> Harness<C> {
    let db = new_database().await;
    let channel = Arc::new(TopicChannel::new(64));
    let events = channel.bind(ROUTING_KEY_ALL).await;
    let api = OrderFlowApi::new(db, gateway.clone(), EventPublisher::new(channel));
    Harness { api, catalog, gateway, events }
}

impl<C: CatalogApi> Harness<C> {
    /// Drains every event captured so far without waiting for more.
    pub fn drain_events(&mut self) -> Vec<OrderLifecycleEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    /// Drives an order from `PENDING` all the way to `DELIVERED` as the platform admin.
    pub async fn deliver(&self, order_id: i64) {
        use OrderStatusType::*;
        for status in [Confirmed, Preparing, ReadyForPickup, Delivered] {
            self.api.update_order_status(&admin(), order_id, status).await.expect("delivery leg failed");
        }
    }
}

//--------------------------------------      Identities     ----------------------------------------------------------

pub fn customer(id: i64) -> UserIdentity {
    UserIdentity::new(id, Role::Customer, format!("customer{id}@example.com"))
}

pub fn owner(id: i64) -> UserIdentity {
    UserIdentity::new(id, Role::RestaurantOwner, format!("owner{id}@example.com"))
}

pub fn admin() -> UserIdentity {
    UserIdentity::new(999, Role::Admin, "admin@example.com")
}

//--------------------------------------       Requests      ----------------------------------------------------------

/// Two burgers and a portion of chips from Mama's Kitchen: 2 × $15.99 + $5.99 = $37.97.
pub fn burger_order(customer_id: i64) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_id,
        customer_email: format!("customer{customer_id}@example.com"),
        restaurant_id: MAMAS_KITCHEN,
        items: vec![
            NewOrderItemRequest { menu_item_id: BURGER, quantity: 2, special_instructions: Some("No onion".to_string()) },
            NewOrderItemRequest { menu_item_id: CHIPS, quantity: 1, special_instructions: None },
        ],
        delivery_address: "12 Main Rd".to_string(),
        delivery_phone: "555-0100".to_string(),
        special_instructions: None,
    }
}

pub fn sushi_order(customer_id: i64) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_id,
        customer_email: format!("customer{customer_id}@example.com"),
        restaurant_id: SUSHI_PALACE,
        items: vec![NewOrderItemRequest { menu_item_id: SASHIMI, quantity: 1, special_instructions: None }],
        delivery_address: "12 Main Rd".to_string(),
        delivery_phone: "555-0100".to_string(),
        special_instructions: None,
    }
}
