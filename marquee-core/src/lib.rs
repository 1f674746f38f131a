pub mod catalog;
pub mod error;
pub mod notify;
pub mod repository;
pub mod reservation;
pub mod seat;
pub mod user;

pub use catalog::{Movie, MovieSearch, NewMovie, NewShowtime, NewTheater, Showtime, ShowtimeOrdering, Theater};
pub use error::{BookingError, LedgerError};
pub use reservation::Reservation;
pub use seat::{SeatId, SeatInventory};
pub use user::{AccountError, User};

pub type BookingResult<T> = Result<T, BookingError>;
