use async_trait::async_trait;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::catalog::{Movie, MovieSearch, Showtime, ShowtimeOrdering, Theater};
use crate::error::LedgerError;
use crate::reservation::Reservation;
use crate::seat::SeatId;
use crate::user::{AccountError, User};

pub type RepoResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Repository trait for movies, theaters and showtimes
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn create_movie(&self, movie: &Movie) -> RepoResult<()>;

    async fn get_movie(&self, id: Uuid) -> RepoResult<Option<Movie>>;

    async fn list_movies(&self, search: &MovieSearch) -> RepoResult<Vec<Movie>>;

    /// Inserts all theaters or none.
    async fn create_theaters(&self, theaters: &[Theater]) -> RepoResult<()>;

    async fn get_theater(&self, id: Uuid) -> RepoResult<Option<Theater>>;

    async fn list_theaters(&self) -> RepoResult<Vec<Theater>>;

    /// Inserts all showtimes or none.
    async fn create_showtimes(&self, showtimes: &[Showtime]) -> RepoResult<()>;

    async fn get_showtime(&self, id: Uuid) -> RepoResult<Option<Showtime>>;

    async fn list_showtimes(&self, ordering: ShowtimeOrdering) -> RepoResult<Vec<Showtime>>;

    async fn showtimes_for_movie(&self, movie_id: Uuid) -> RepoResult<Vec<Showtime>>;
}

/// Repository trait for registered accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`AccountError::UsernameTaken`] when the username is in use.
    async fn create_user(&self, user: &User) -> Result<(), AccountError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AccountError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AccountError>;
}

/// Append-only record of every reservation ever made.
#[async_trait]
pub trait ReservationLedger: Send + Sync {
    /// Union of the seats held or purchased for a showtime.
    async fn active_seats_for(&self, showtime_id: Uuid) -> Result<BTreeSet<SeatId>, LedgerError>;

    /// Records a new hold. Refuses with [`LedgerError::SeatTaken`] if any seat
    /// already belongs to another reservation of the showtime.
    async fn create(
        &self,
        user_id: Uuid,
        showtime_id: Uuid,
        seats: &[SeatId],
    ) -> Result<Reservation, LedgerError>;

    async fn mark_purchased(
        &self,
        reservation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Reservation, LedgerError>;

    async fn get(&self, reservation_id: Uuid) -> Result<Option<Reservation>, LedgerError>;

    /// Oldest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Reservation>, LedgerError>;
}
