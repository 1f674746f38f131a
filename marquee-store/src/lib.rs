pub mod app_config;
pub mod catalog_repo;
pub mod database;
pub mod events;
pub mod mailer;
pub mod redis_repo;
pub mod reservation_repo;
pub mod user_repo;

pub use app_config::Config;
pub use catalog_repo::PgCatalogRepository;
pub use database::DbClient;
pub use events::{EventProducer, KafkaNotifier};
pub use mailer::SmtpNotifier;
pub use redis_repo::RedisClient;
pub use reservation_repo::PgReservationLedger;
pub use user_repo::PgUserRepository;
