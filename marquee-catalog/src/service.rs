use chrono::{DateTime, Utc};
use marquee_core::repository::CatalogRepository;
use marquee_core::{
    BookingError, BookingResult, Movie, MovieSearch, NewMovie, NewShowtime, NewTheater, Showtime,
    ShowtimeOrdering, Theater,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::inventory::{build_roster, validate_capacity};
use crate::schedule::validate_start;

/// A movie together with its scheduled showtimes.
#[derive(Debug, Clone, Serialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub movie: Movie,
    pub showtimes: Vec<Showtime>,
}

/// Movie, theater and showtime management on top of a [`CatalogRepository`].
#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> Arc<dyn CatalogRepository> {
        self.repo.clone()
    }

    pub async fn create_movie(&self, req: NewMovie) -> BookingResult<Movie> {
        let movie = Movie::new(req);
        self.repo.create_movie(&movie).await?;
        info!("Movie created: {} ({})", movie.title, movie.id);
        Ok(movie)
    }

    pub async fn list_movies(&self, search: Option<&str>) -> BookingResult<Vec<Movie>> {
        Ok(self.repo.list_movies(&MovieSearch::parse(search)).await?)
    }

    pub async fn movie_detail(&self, id: Uuid) -> BookingResult<MovieDetail> {
        let movie = self
            .repo
            .get_movie(id)
            .await?
            .ok_or_else(|| BookingError::not_found("Movie", id))?;
        let showtimes = self.repo.showtimes_for_movie(id).await?;
        Ok(MovieDetail { movie, showtimes })
    }

    /// Rejects the whole batch if any capacity is out of range.
    pub async fn create_theaters(&self, reqs: Vec<NewTheater>) -> BookingResult<Vec<Theater>> {
        for req in &reqs {
            validate_capacity(req.capacity)?;
        }
        let theaters: Vec<Theater> = reqs.into_iter().map(Theater::new).collect();
        self.repo.create_theaters(&theaters).await?;
        info!("Created {} theater(s)", theaters.len());
        Ok(theaters)
    }

    pub async fn list_theaters(&self) -> BookingResult<Vec<Theater>> {
        Ok(self.repo.list_theaters().await?)
    }

    pub async fn create_showtime(&self, req: NewShowtime) -> BookingResult<Showtime> {
        let mut created = self.create_showtimes(vec![req]).await?;
        created
            .pop()
            .ok_or_else(|| BookingError::Storage("showtime was not created".to_string()))
    }

    /// Validates every request before persisting any of them.
    pub async fn create_showtimes(&self, reqs: Vec<NewShowtime>) -> BookingResult<Vec<Showtime>> {
        let now = Utc::now();
        let mut showtimes = Vec::with_capacity(reqs.len());
        for req in reqs {
            showtimes.push(self.prepare_showtime(req, now).await?);
        }

        self.repo.create_showtimes(&showtimes).await?;
        for showtime in &showtimes {
            info!(
                "Showtime scheduled: {} at {} ({} seats)",
                showtime.id,
                showtime.starts_at,
                showtime.seats.len()
            );
        }
        Ok(showtimes)
    }

    async fn prepare_showtime(&self, req: NewShowtime, now: DateTime<Utc>) -> BookingResult<Showtime> {
        validate_start(req.starts_at, now)?;

        if self.repo.get_movie(req.movie_id).await?.is_none() {
            return Err(BookingError::not_found("Movie", req.movie_id));
        }
        let theater = self
            .repo
            .get_theater(req.theater_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Theater", req.theater_id))?;

        let seats = build_roster(&theater, req.seats.as_deref())?;

        Ok(Showtime {
            id: Uuid::new_v4(),
            movie_id: req.movie_id,
            theater_id: req.theater_id,
            starts_at: req.starts_at,
            seats,
        })
    }

    pub async fn list_showtimes(&self, ordering: ShowtimeOrdering) -> BookingResult<Vec<Showtime>> {
        Ok(self.repo.list_showtimes(ordering).await?)
    }

    pub async fn get_showtime(&self, id: Uuid) -> BookingResult<Showtime> {
        self.repo
            .get_showtime(id)
            .await?
            .ok_or_else(|| BookingError::not_found("Showtime", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCatalog;
    use chrono::{Duration, NaiveDate};
    use marquee_core::SeatId;

    async fn seeded() -> (CatalogService, Movie, Theater) {
        let service = CatalogService::new(Arc::new(InMemoryCatalog::new()));
        let movie = service
            .create_movie(NewMovie {
                title: "Arrival".to_string(),
                director: "Denis Villeneuve".to_string(),
                genre: "Sci-Fi".to_string(),
                release_date: NaiveDate::from_ymd_opt(2016, 11, 11).unwrap(),
                duration: 116,
                synopsis: "Linguist meets heptapods.".to_string(),
            })
            .await
            .unwrap();
        let theater = service
            .create_theaters(vec![NewTheater {
                name: "Roxy".to_string(),
                location: "Downtown".to_string(),
                capacity: 10,
            }])
            .await
            .unwrap()
            .remove(0);
        (service, movie, theater)
    }

    #[tokio::test]
    async fn test_showtime_roster_from_theater_capacity() {
        let (service, movie, theater) = seeded().await;

        let showtime = service
            .create_showtime(NewShowtime {
                movie_id: movie.id,
                theater_id: theater.id,
                starts_at: Utc::now() + Duration::days(1),
                seats: None,
            })
            .await
            .unwrap();

        assert_eq!(showtime.seats.len(), 10);
        assert!(showtime.seats.contains(SeatId(10)));

        let detail = service.movie_detail(movie.id).await.unwrap();
        assert_eq!(detail.showtimes.len(), 1);
    }

    #[tokio::test]
    async fn test_past_showtime_is_rejected_and_not_persisted() {
        let (service, movie, theater) = seeded().await;

        let result = service
            .create_showtime(NewShowtime {
                movie_id: movie.id,
                theater_id: theater.id,
                starts_at: Utc::now() - Duration::hours(1),
                seats: None,
            })
            .await;

        assert!(matches!(result, Err(BookingError::InvalidSchedule(_))));
        assert!(service
            .list_showtimes(ShowtimeOrdering::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing() {
        let (service, movie, theater) = seeded().await;
        let future = Utc::now() + Duration::days(2);

        let result = service
            .create_showtimes(vec![
                NewShowtime {
                    movie_id: movie.id,
                    theater_id: theater.id,
                    starts_at: future,
                    seats: None,
                },
                NewShowtime {
                    movie_id: movie.id,
                    theater_id: Uuid::new_v4(),
                    starts_at: future,
                    seats: None,
                },
            ])
            .await;

        assert!(matches!(
            result,
            Err(BookingError::NotFound { entity: "Theater", .. })
        ));
        assert!(service
            .list_showtimes(ShowtimeOrdering::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_oversized_theater_batch_is_rejected() {
        let (service, _, _) = seeded().await;

        let result = service
            .create_theaters(vec![
                NewTheater {
                    name: "Annex".to_string(),
                    location: "Uptown".to_string(),
                    capacity: 50,
                },
                NewTheater {
                    name: "Stadium".to_string(),
                    location: "Nowhere".to_string(),
                    capacity: u32::MAX,
                },
            ])
            .await;

        assert!(matches!(result, Err(BookingError::InvalidTheater(_))));
        assert_eq!(service.list_theaters().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_movie_search() {
        let (service, _, _) = seeded().await;

        assert_eq!(service.list_movies(Some("villeneuve")).await.unwrap().len(), 1);
        assert!(service.list_movies(Some("comedy")).await.unwrap().is_empty());
        assert!(matches!(
            service.movie_detail(Uuid::new_v4()).await,
            Err(BookingError::NotFound { entity: "Movie", .. })
        ));
    }
}
