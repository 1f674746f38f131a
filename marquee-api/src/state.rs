use marquee_booking::{LogNotifier, QueryFacade, ReservationService, RetryPolicy};
use marquee_catalog::{CatalogService, InMemoryCatalog, InMemoryUsers};
use marquee_core::notify::PurchaseNotifier;
use marquee_core::repository::{CatalogRepository, ReservationLedger, UserRepository};
use marquee_shared::models::events::SeatsReservedEvent;
use marquee_store::app_config::RateLimitConfig;
use marquee_store::RedisClient;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

/// Storage and side-effect backends the handlers run against.
pub struct Backends {
    pub catalog: Arc<dyn CatalogRepository>,
    pub users: Arc<dyn UserRepository>,
    pub ledger: Arc<dyn ReservationLedger>,
    pub notifier: Arc<dyn PurchaseNotifier>,
}

impl Backends {
    pub fn in_memory() -> Self {
        Self {
            catalog: Arc::new(InMemoryCatalog::new()),
            users: Arc::new(InMemoryUsers::new()),
            ledger: Arc::new(marquee_booking::InMemoryLedger::new()),
            notifier: Arc::new(LogNotifier),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub reservations: Arc<ReservationService>,
    pub queries: QueryFacade,
    pub users: Arc<dyn UserRepository>,
    /// Rate limiting is skipped when absent.
    pub redis: Option<Arc<RedisClient>>,
    pub rate_limit: RateLimitConfig,
    pub sse_tx: broadcast::Sender<SeatsReservedEvent>,
    pub auth: AuthConfig,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(backends: Backends, policy: RetryPolicy, auth: AuthConfig) -> Result<Self, prometheus::Error> {
        let (sse_tx, _) = broadcast::channel(100);

        Ok(Self {
            catalog: CatalogService::new(backends.catalog.clone()),
            reservations: Arc::new(ReservationService::new(
                backends.catalog.clone(),
                backends.ledger.clone(),
                backends.notifier,
                policy,
            )),
            queries: QueryFacade::new(backends.catalog, backends.ledger),
            users: backends.users,
            redis: None,
            rate_limit: RateLimitConfig::default(),
            sse_tx,
            auth,
            metrics: Arc::new(Metrics::new()?),
        })
    }

    pub fn with_rate_limit(mut self, redis: Arc<RedisClient>, limits: RateLimitConfig) -> Self {
        self.redis = Some(redis);
        self.rate_limit = limits;
        self
    }
}
