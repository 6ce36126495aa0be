use std::{env, sync::Arc, time::Duration};

use log::*;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::catalog::objects::{MenuItem, Restaurant};

const DEFAULT_CATALOG_URL: &str = "http://127.0.0.1:8210";
const DEFAULT_CATALOG_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid menu item: {0}")]
    InvalidItem(String),
    #[error("Catalog service unavailable: {0}")]
    Unavailable(String),
}

/// The facts the engine needs from the catalog service.
///
/// Implementations resolve by id and report absence as [`CatalogApiError::NotFound`]; transport problems surface as
/// [`CatalogApiError::Unavailable`] so the circuit breaker can tell outages apart from business outcomes.
#[allow(async_fn_in_trait)]
pub trait CatalogApi: Clone {
    async fn restaurant_by_id(&self, restaurant_id: i64) -> Result<Restaurant, CatalogApiError>;

    async fn menu_item_by_id(&self, menu_item_id: i64) -> Result<MenuItem, CatalogApiError>;

    /// Resolves the restaurant owned by the given user. Used by the authorization guard for ownership checks.
    async fn restaurant_for_owner(&self, owner_id: i64) -> Result<Restaurant, CatalogApiError>;
}

//--------------------------------------    CatalogConfig    ----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    /// Hard per-request bound. The circuit breaker does not bound latency while closed, so this must.
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_CATALOG_URL.to_string(), timeout: Duration::from_millis(DEFAULT_CATALOG_TIMEOUT_MS) }
    }
}

impl CatalogConfig {
    pub fn from_env_or_default() -> Self {
        let base_url = env::var("OFE_CATALOG_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ OFE_CATALOG_URL is not set. Using the default, {DEFAULT_CATALOG_URL}, instead.");
            DEFAULT_CATALOG_URL.to_string()
        });
        let timeout = env::var("OFE_CATALOG_TIMEOUT_MS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ {s} is not a valid value for OFE_CATALOG_TIMEOUT_MS. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_CATALOG_TIMEOUT_MS);
        Self { base_url, timeout: Duration::from_millis(timeout) }
    }
}

//--------------------------------------  RestCatalogClient  ----------------------------------------------------------
/// REST client against the catalog/restaurant service.
#[derive(Clone)]
pub struct RestCatalogClient {
    config: CatalogConfig,
    client: Arc<Client>,
}

impl RestCatalogClient {
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogApiError::Unavailable(format!("Could not initialize client: {e}")))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogApiError> {
        let url = format!("{}{path}", self.config.base_url);
        trace!("🍽️ Sending catalog query: {url}");
        let response =
            self.client.get(&url).send().await.map_err(|e| CatalogApiError::Unavailable(e.to_string()))?;
        match response.status() {
            s if s.is_success() => {
                response.json::<T>().await.map_err(|e| CatalogApiError::Unavailable(format!("Invalid response: {e}")))
            },
            StatusCode::NOT_FOUND => Err(CatalogApiError::NotFound(format!("{path} does not resolve"))),
            s => {
                let message = response.text().await.unwrap_or_default();
                Err(CatalogApiError::Unavailable(format!("Catalog query failed. Error {s}. {message}")))
            },
        }
    }
}

impl CatalogApi for RestCatalogClient {
    async fn restaurant_by_id(&self, restaurant_id: i64) -> Result<Restaurant, CatalogApiError> {
        self.get(&format!("/api/restaurants/{restaurant_id}")).await
    }

    async fn menu_item_by_id(&self, menu_item_id: i64) -> Result<MenuItem, CatalogApiError> {
        self.get(&format!("/api/menu-items/{menu_item_id}")).await
    }

    async fn restaurant_for_owner(&self, owner_id: i64) -> Result<Restaurant, CatalogApiError> {
        self.get(&format!("/api/restaurants/owner/{owner_id}")).await
    }
}
