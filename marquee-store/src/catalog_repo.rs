use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use marquee_core::repository::{CatalogRepository, RepoResult};
use marquee_core::{Movie, MovieSearch, SeatId, SeatInventory, Showtime, ShowtimeOrdering, Theater};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MovieRow {
    id: Uuid,
    title: String,
    director: String,
    genre: String,
    release_date: NaiveDate,
    duration: i32,
    synopsis: String,
}

impl MovieRow {
    fn into_movie(self) -> RepoResult<Movie> {
        Ok(Movie {
            id: self.id,
            title: self.title,
            director: self.director,
            genre: self.genre,
            release_date: self.release_date,
            duration: u32::try_from(self.duration)?,
            synopsis: self.synopsis,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TheaterRow {
    id: Uuid,
    name: String,
    location: String,
    capacity: i32,
}

impl TheaterRow {
    fn into_theater(self) -> RepoResult<Theater> {
        Ok(Theater {
            id: self.id,
            name: self.name,
            location: self.location,
            capacity: u32::try_from(self.capacity)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ShowtimeRow {
    id: Uuid,
    movie_id: Uuid,
    theater_id: Uuid,
    starts_at: DateTime<Utc>,
    seats: Vec<i32>,
}

impl ShowtimeRow {
    fn into_showtime(self) -> RepoResult<Showtime> {
        let seats = self
            .seats
            .into_iter()
            .map(|s| u32::try_from(s).map(SeatId))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Showtime {
            id: self.id,
            movie_id: self.movie_id,
            theater_id: self.theater_id,
            starts_at: self.starts_at,
            seats: SeatInventory::from_seats(seats),
        })
    }
}

const MOVIE_COLUMNS: &str = "id, title, director, genre, release_date, duration, synopsis";
const SHOWTIME_COLUMNS: &str = "id, movie_id, theater_id, starts_at, seats";

fn seats_column(seats: &SeatInventory) -> RepoResult<Vec<i32>> {
    Ok(seats
        .iter()
        .map(|s| i32::try_from(s.get()))
        .collect::<Result<Vec<_>, _>>()?)
}

/// Escapes LIKE wildcards so search terms match literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn create_movie(&self, movie: &Movie) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO movies (id, title, director, genre, release_date, duration, synopsis) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(movie.id)
        .bind(&movie.title)
        .bind(&movie.director)
        .bind(&movie.genre)
        .bind(movie.release_date)
        .bind(i32::try_from(movie.duration)?)
        .bind(&movie.synopsis)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_movie(&self, id: Uuid) -> RepoResult<Option<Movie>> {
        let row: Option<MovieRow> =
            sqlx::query_as(&format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(MovieRow::into_movie).transpose()
    }

    async fn list_movies(&self, search: &MovieSearch) -> RepoResult<Vec<Movie>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE TRUE"));

        // Every term must match one of the searchable columns
        for term in search.terms() {
            let pattern = like_pattern(term);
            qb.push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR director ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR genre ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY created_at, id");

        let rows: Vec<MovieRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(MovieRow::into_movie).collect()
    }

    async fn create_theaters(&self, theaters: &[Theater]) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;
        for theater in theaters {
            sqlx::query("INSERT INTO theaters (id, name, location, capacity) VALUES ($1, $2, $3, $4)")
                .bind(theater.id)
                .bind(&theater.name)
                .bind(&theater.location)
                .bind(i32::try_from(theater.capacity)?)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_theater(&self, id: Uuid) -> RepoResult<Option<Theater>> {
        let row: Option<TheaterRow> =
            sqlx::query_as("SELECT id, name, location, capacity FROM theaters WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(TheaterRow::into_theater).transpose()
    }

    async fn list_theaters(&self) -> RepoResult<Vec<Theater>> {
        let rows: Vec<TheaterRow> =
            sqlx::query_as("SELECT id, name, location, capacity FROM theaters ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(TheaterRow::into_theater).collect()
    }

    async fn create_showtimes(&self, showtimes: &[Showtime]) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;
        for showtime in showtimes {
            sqlx::query(
                "INSERT INTO showtimes (id, movie_id, theater_id, starts_at, seats) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(showtime.id)
            .bind(showtime.movie_id)
            .bind(showtime.theater_id)
            .bind(showtime.starts_at)
            .bind(seats_column(&showtime.seats)?)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_showtime(&self, id: Uuid) -> RepoResult<Option<Showtime>> {
        let row: Option<ShowtimeRow> =
            sqlx::query_as(&format!("SELECT {SHOWTIME_COLUMNS} FROM showtimes WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(ShowtimeRow::into_showtime).transpose()
    }

    async fn list_showtimes(&self, ordering: ShowtimeOrdering) -> RepoResult<Vec<Showtime>> {
        let order = match ordering {
            ShowtimeOrdering::StartsAtAsc => "starts_at ASC, id ASC",
            ShowtimeOrdering::StartsAtDesc => "starts_at DESC, id DESC",
        };
        let rows: Vec<ShowtimeRow> =
            sqlx::query_as(&format!("SELECT {SHOWTIME_COLUMNS} FROM showtimes ORDER BY {order}"))
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(ShowtimeRow::into_showtime).collect()
    }

    async fn showtimes_for_movie(&self, movie_id: Uuid) -> RepoResult<Vec<Showtime>> {
        let rows: Vec<ShowtimeRow> = sqlx::query_as(&format!(
            "SELECT {SHOWTIME_COLUMNS} FROM showtimes WHERE movie_id = $1 ORDER BY starts_at, id"
        ))
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ShowtimeRow::into_showtime).collect()
    }
}
