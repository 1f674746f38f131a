pub mod ledger;
pub mod locks;
pub mod notifier;
pub mod query;
pub mod retry;
pub mod service;

pub use ledger::InMemoryLedger;
pub use locks::{LockTimeout, ShowtimeLocks};
pub use notifier::LogNotifier;
pub use query::{QueryFacade, SeatMap};
pub use retry::RetryPolicy;
pub use service::ReservationService;
