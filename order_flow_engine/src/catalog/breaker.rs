//! An explicit circuit breaker around the catalog client.
//!
//! The breaker holds its state (closed / open / half-open, failure count, cool-down timer) as ordinary fields, and
//! the fallback is a plain function value supplied at construction. While the circuit is open, every call
//! short-circuits to the fallback, which fails deterministically with [`CatalogApiError::Unavailable`] so that no
//! order is ever priced from fabricated data.
//!
//! Only `Unavailable` results count as breaker failures. `NotFound` and `InvalidItem` are business outcomes from a
//! healthy dependency.

use std::{env, fmt::Display, future::Future, sync::Arc, time::Duration};

use log::*;
use tokio::{sync::RwLock, time::Instant};

use crate::catalog::{
    client::{CatalogApi, CatalogApiError},
    objects::{MenuItem, Restaurant},
};

const DEFAULT_FAILURE_THRESHOLD: usize = 5;
const DEFAULT_COOL_DOWN_MS: u64 = 30_000;
const DEFAULT_TRIAL_CALLS: usize = 2;

//--------------------------------------    BreakerConfig    ----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive `Unavailable` results before the circuit opens.
    pub failure_threshold: usize,
    /// How long the circuit stays open before probing recovery.
    pub cool_down: Duration,
    /// Trial calls allowed while half-open; this many successes close the circuit again.
    pub trial_calls: usize,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cool_down: Duration::from_millis(DEFAULT_COOL_DOWN_MS),
            trial_calls: DEFAULT_TRIAL_CALLS,
        }
    }
}

impl BreakerConfig {
    pub fn from_env_or_default() -> Self {
        let failure_threshold = read_env("OFE_BREAKER_FAILURE_THRESHOLD", DEFAULT_FAILURE_THRESHOLD);
        let cool_down = Duration::from_millis(read_env("OFE_BREAKER_COOL_DOWN_MS", DEFAULT_COOL_DOWN_MS));
        let trial_calls = read_env("OFE_BREAKER_TRIAL_CALLS", DEFAULT_TRIAL_CALLS);
        Self { failure_threshold, cool_down, trial_calls }
    }
}

pub(crate) fn read_env<T: std::str::FromStr + Display>(var: &str, default: T) -> T
where T::Err: Display {
    match env::var(var) {
        Ok(s) => s.parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {var}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

//--------------------------------------    CircuitBreaker   ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Normal operation. Calls pass through; failures are counted.
    Closed,
    /// Calls are short-circuited to the fallback until the cool-down elapses.
    Open,
    /// Limited trial calls are probing whether the dependency has recovered.
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    failure_count: usize,
    success_count: usize,
    trials_in_flight: usize,
    opened_at: Option<Instant>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: RwLock<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        let inner = BreakerInner {
            state: BreakerState::Closed,
            failure_count: 0,
            success_count: 0,
            trials_in_flight: 0,
            opened_at: None,
        };
        Self { config, inner: RwLock::new(inner) }
    }

    pub async fn state(&self) -> BreakerState {
        self.inner.read().await.state
    }

    /// Asks the breaker whether a call may proceed, transitioning open -> half-open once the cool-down has elapsed.
    async fn try_acquire(&self) -> bool {
        let mut inner = self.inner.write().await;
        match inner.state {
            BreakerState::Closed => true,
            BreakerState::Open => {
                let cooled = inner.opened_at.map(|t| t.elapsed() >= self.config.cool_down).unwrap_or(true);
                if cooled {
                    debug!("🔌️ Cool-down elapsed. Circuit is half-open; probing the catalog service.");
                    inner.state = BreakerState::HalfOpen;
                    inner.success_count = 0;
                    inner.trials_in_flight = 1;
                    true
                } else {
                    false
                }
            },
            BreakerState::HalfOpen => {
                if inner.trials_in_flight < self.config.trial_calls {
                    inner.trials_in_flight += 1;
                    true
                } else {
                    false
                }
            },
        }
    }

    async fn record_success(&self) {
        let mut inner = self.inner.write().await;
        match inner.state {
            BreakerState::Closed => inner.failure_count = 0,
            BreakerState::HalfOpen => {
                inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
                inner.success_count += 1;
                if inner.success_count >= self.config.trial_calls {
                    info!("🔌️ Catalog service has recovered. Circuit is closed again.");
                    inner.state = BreakerState::Closed;
                    inner.failure_count = 0;
                    inner.opened_at = None;
                }
            },
            BreakerState::Open => {},
        }
    }

    async fn record_failure(&self) {
        let mut inner = self.inner.write().await;
        match inner.state {
            BreakerState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    warn!(
                        "🔌️ {} consecutive catalog failures. Circuit is open for {}ms.",
                        inner.failure_count,
                        self.config.cool_down.as_millis()
                    );
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            },
            BreakerState::HalfOpen => {
                warn!("🔌️ Catalog probe failed. Circuit is open again for {}ms.", self.config.cool_down.as_millis());
                inner.state = BreakerState::Open;
                inner.trials_in_flight = 0;
                inner.opened_at = Some(Instant::now());
            },
            BreakerState::Open => {},
        }
    }
}

//--------------------------------------   ResilientCatalog  ----------------------------------------------------------
pub type Fallback = Arc<dyn Fn() -> CatalogApiError + Send + Sync>;

/// Circuit-breaker decorator over any [`CatalogApi`] implementation, exposing the same call surface.
///
/// Every guarded call is additionally bounded by a hard timeout; the breaker alone does not bound latency while
/// closed.
#[derive(Clone)]
pub struct ResilientCatalog<C: CatalogApi> {
    catalog: C,
    breaker: Arc<CircuitBreaker>,
    call_timeout: Duration,
    fallback: Fallback,
}

impl<C: CatalogApi> ResilientCatalog<C> {
    pub fn new(catalog: C, config: BreakerConfig, call_timeout: Duration) -> Self {
        let fallback: Fallback =
            Arc::new(|| CatalogApiError::Unavailable("The catalog service is currently unavailable".to_string()));
        Self::with_fallback(catalog, config, call_timeout, fallback)
    }

    pub fn with_fallback(catalog: C, config: BreakerConfig, call_timeout: Duration, fallback: Fallback) -> Self {
        Self { catalog, breaker: Arc::new(CircuitBreaker::new(config)), call_timeout, fallback }
    }

    pub async fn breaker_state(&self) -> BreakerState {
        self.breaker.state().await
    }

    async fn guarded<T, Fut>(&self, call: Fut) -> Result<T, CatalogApiError>
    where Fut: Future<Output = Result<T, CatalogApiError>> {
        if !self.breaker.try_acquire().await {
            trace!("🔌️ Circuit is open. Short-circuiting to the fallback.");
            return Err((self.fallback)());
        }
        let outcome = match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                Err(CatalogApiError::Unavailable(format!("Catalog call timed out after {:?}", self.call_timeout)))
            },
        };
        match &outcome {
            Err(CatalogApiError::Unavailable(reason)) => {
                debug!("🔌️ Catalog call failed: {reason}");
                self.breaker.record_failure().await;
            },
            _ => self.breaker.record_success().await,
        }
        outcome
    }
}

impl<C: CatalogApi> CatalogApi for ResilientCatalog<C> {
    async fn restaurant_by_id(&self, restaurant_id: i64) -> Result<Restaurant, CatalogApiError> {
        self.guarded(self.catalog.restaurant_by_id(restaurant_id)).await
    }

    async fn menu_item_by_id(&self, menu_item_id: i64) -> Result<MenuItem, CatalogApiError> {
        self.guarded(self.catalog.menu_item_by_id(menu_item_id)).await
    }

    async fn restaurant_for_owner(&self, owner_id: i64) -> Result<Restaurant, CatalogApiError> {
        self.guarded(self.catalog.restaurant_for_owner(owner_id)).await
    }
}
