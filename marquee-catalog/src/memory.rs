use async_trait::async_trait;
use marquee_core::repository::{CatalogRepository, RepoResult, UserRepository};
use marquee_core::{AccountError, Movie, MovieSearch, Showtime, ShowtimeOrdering, Theater, User};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct CatalogState {
    movies: Vec<Movie>,
    theaters: Vec<Theater>,
    showtimes: Vec<Showtime>,
}

/// In-memory catalog used when no database is configured, and by tests.
#[derive(Default)]
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn create_movie(&self, movie: &Movie) -> RepoResult<()> {
        self.state.write().await.movies.push(movie.clone());
        Ok(())
    }

    async fn get_movie(&self, id: Uuid) -> RepoResult<Option<Movie>> {
        let state = self.state.read().await;
        Ok(state.movies.iter().find(|m| m.id == id).cloned())
    }

    async fn list_movies(&self, search: &MovieSearch) -> RepoResult<Vec<Movie>> {
        let state = self.state.read().await;
        Ok(state
            .movies
            .iter()
            .filter(|m| search.matches(m))
            .cloned()
            .collect())
    }

    async fn create_theaters(&self, theaters: &[Theater]) -> RepoResult<()> {
        self.state.write().await.theaters.extend_from_slice(theaters);
        Ok(())
    }

    async fn get_theater(&self, id: Uuid) -> RepoResult<Option<Theater>> {
        let state = self.state.read().await;
        Ok(state.theaters.iter().find(|t| t.id == id).cloned())
    }

    async fn list_theaters(&self) -> RepoResult<Vec<Theater>> {
        Ok(self.state.read().await.theaters.clone())
    }

    async fn create_showtimes(&self, showtimes: &[Showtime]) -> RepoResult<()> {
        self.state.write().await.showtimes.extend_from_slice(showtimes);
        Ok(())
    }

    async fn get_showtime(&self, id: Uuid) -> RepoResult<Option<Showtime>> {
        let state = self.state.read().await;
        Ok(state.showtimes.iter().find(|s| s.id == id).cloned())
    }

    async fn list_showtimes(&self, ordering: ShowtimeOrdering) -> RepoResult<Vec<Showtime>> {
        let mut showtimes = self.state.read().await.showtimes.clone();
        ordering.sort(&mut showtimes);
        Ok(showtimes)
    }

    async fn showtimes_for_movie(&self, movie_id: Uuid) -> RepoResult<Vec<Showtime>> {
        let state = self.state.read().await;
        let mut showtimes: Vec<Showtime> = state
            .showtimes
            .iter()
            .filter(|s| s.movie_id == movie_id)
            .cloned()
            .collect();
        ShowtimeOrdering::StartsAtAsc.sort(&mut showtimes);
        Ok(showtimes)
    }
}

/// In-memory account store keyed by username.
#[derive(Default)]
pub struct InMemoryUsers {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn create_user(&self, user: &User) -> Result<(), AccountError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(AccountError::UsernameTaken(user.username.clone()));
        }
        users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AccountError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AccountError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.id == id).cloned())
    }
}
