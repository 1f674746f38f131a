use anyhow::Context;
use marquee_api::{app, AppState, AuthConfig, Backends};
use marquee_booking::{LogNotifier, RetryPolicy};
use marquee_core::notify::PurchaseNotifier;
use marquee_core::repository::UserRepository;
use marquee_store::app_config::{Config, NotificationMode};
use marquee_store::{
    DbClient, EventProducer, KafkaNotifier, PgCatalogRepository, PgReservationLedger,
    PgUserRepository, RedisClient, SmtpNotifier,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Marquee API on port {}", config.server.port);

    let backends = build_backends(&config).await?;
    let policy = RetryPolicy {
        max_attempts: config.booking.max_attempts,
        base_delay: config.booking.base_backoff(),
        max_delay: config.booking.max_backoff(),
        lock_timeout: config.booking.lock_timeout(),
    };
    let auth = AuthConfig {
        secret: config.auth.jwt_secret.clone(),
        expiration: config.auth.jwt_expiration_seconds,
    };

    let mut app_state = AppState::new(backends, policy, auth).context("Failed to register metrics")?;

    match &config.redis {
        Some(redis) => {
            let redis_client = RedisClient::new(&redis.url)
                .await
                .context("Failed to connect to Redis")?;
            app_state = app_state.with_rate_limit(Arc::new(redis_client), config.rate_limit.clone());
        }
        None => tracing::info!("Redis not configured, rate limiting disabled"),
    }

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>()
    ).await?;

    Ok(())
}

async fn build_backends(config: &Config) -> anyhow::Result<Backends> {
    let mut backends = match &config.database {
        Some(database) => {
            let db = DbClient::new(&database.url)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;

            Backends {
                catalog: Arc::new(PgCatalogRepository::new(db.pool.clone())),
                users: Arc::new(PgUserRepository::new(db.pool.clone())),
                ledger: Arc::new(PgReservationLedger::new(db.pool.clone())),
                notifier: Arc::new(LogNotifier),
            }
        }
        None => {
            tracing::warn!("No database configured, state is kept in memory only");
            Backends::in_memory()
        }
    };

    backends.notifier = build_notifier(config, backends.users.clone())?;
    Ok(backends)
}

fn build_notifier(
    config: &Config,
    users: Arc<dyn UserRepository>,
) -> anyhow::Result<Arc<dyn PurchaseNotifier>> {
    let notifier: Arc<dyn PurchaseNotifier> = match config.notifications.mode {
        NotificationMode::Log => Arc::new(LogNotifier),
        NotificationMode::Smtp => {
            let smtp = config
                .notifications
                .smtp
                .as_ref()
                .context("notifications.smtp must be set when mode is smtp")?;
            Arc::new(SmtpNotifier::new(smtp, users)?)
        }
        NotificationMode::Kafka => {
            let kafka = config
                .kafka
                .as_ref()
                .context("kafka.brokers must be set when mode is kafka")?;
            let producer = EventProducer::new(&kafka.brokers).context("Failed to create Kafka producer")?;
            Arc::new(KafkaNotifier::new(producer, config.notifications.topic.clone()))
        }
    };

    tracing::info!("Purchase notifications: {:?}", config.notifications.mode);
    Ok(notifier)
}
