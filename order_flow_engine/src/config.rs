//! Engine configuration, assembled from `OFE_*` environment variables with logged fallbacks.

use std::env;

use log::*;

use crate::catalog::{read_env, BreakerConfig, CatalogConfig};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/order_flow.db";
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub database_url: String,
    pub catalog: CatalogConfig,
    pub breaker: BreakerConfig,
    /// Queue depth per event subscriber. A full queue applies backpressure to publishers rather than dropping
    /// events.
    pub event_buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            catalog: CatalogConfig::default(),
            breaker: BreakerConfig::default(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env::var("OFE_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ OFE_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}, instead.");
            DEFAULT_DATABASE_URL.to_string()
        });
        Self {
            database_url,
            catalog: CatalogConfig::from_env_or_default(),
            breaker: BreakerConfig::from_env_or_default(),
            event_buffer_size: read_env("OFE_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE),
        }
    }
}
