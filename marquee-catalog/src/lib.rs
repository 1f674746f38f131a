pub mod inventory;
pub mod memory;
pub mod schedule;
pub mod service;

pub use inventory::{build_roster, validate_capacity, InventoryError, MAX_CAPACITY};
pub use memory::{InMemoryCatalog, InMemoryUsers};
pub use schedule::{validate_start, ScheduleError};
pub use service::{CatalogService, MovieDetail};
