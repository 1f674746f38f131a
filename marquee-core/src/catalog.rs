use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::seat::{SeatId, SeatInventory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub director: String,
    pub genre: String,
    pub release_date: NaiveDate,
    /// Duration in minutes
    pub duration: u32,
    pub synopsis: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMovie {
    pub title: String,
    pub director: String,
    pub genre: String,
    pub release_date: NaiveDate,
    pub duration: u32,
    pub synopsis: String,
}

impl Movie {
    pub fn new(movie: NewMovie) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: movie.title,
            director: movie.director,
            genre: movie.genre,
            release_date: movie.release_date,
            duration: movie.duration,
            synopsis: movie.synopsis,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theater {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub capacity: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTheater {
    pub name: String,
    pub location: String,
    pub capacity: u32,
}

impl Theater {
    pub fn new(theater: NewTheater) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: theater.name,
            location: theater.location,
            capacity: theater.capacity,
        }
    }
}

/// A scheduled screening. The seat roster is fixed when the showtime is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Showtime {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub theater_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub seats: SeatInventory,
}

impl Showtime {
    pub fn capacity(&self) -> &BTreeSet<SeatId> {
        self.seats.capacity()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewShowtime {
    pub movie_id: Uuid,
    pub theater_id: Uuid,
    pub starts_at: DateTime<Utc>,
    /// Explicit roster; defaults to `1..=theater.capacity`.
    #[serde(default)]
    pub seats: Option<Vec<SeatId>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShowtimeOrdering {
    #[default]
    StartsAtAsc,
    StartsAtDesc,
}

impl ShowtimeOrdering {
    /// Accepts `date_time` and `-date_time`; anything else falls back to ascending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("-date_time") => ShowtimeOrdering::StartsAtDesc,
            _ => ShowtimeOrdering::StartsAtAsc,
        }
    }

    pub fn sort(self, showtimes: &mut [Showtime]) {
        showtimes.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then(a.id.cmp(&b.id)));
        if self == ShowtimeOrdering::StartsAtDesc {
            showtimes.reverse();
        }
    }
}

/// Free-text movie search over title, director and genre.
///
/// Every whitespace-separated term has to match at least one of the fields,
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieSearch {
    terms: Vec<String>,
}

impl MovieSearch {
    pub fn parse(raw: Option<&str>) -> Self {
        let terms = raw
            .unwrap_or_default()
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn matches(&self, movie: &Movie) -> bool {
        let fields = [
            movie.title.to_lowercase(),
            movie.director.to_lowercase(),
            movie.genre.to_lowercase(),
        ];
        self.terms
            .iter()
            .all(|term| fields.iter().any(|field| field.contains(term.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn movie(title: &str, director: &str, genre: &str) -> Movie {
        Movie::new(NewMovie {
            title: title.to_string(),
            director: director.to_string(),
            genre: genre.to_string(),
            release_date: NaiveDate::from_ymd_opt(2010, 7, 16).unwrap(),
            duration: 148,
            synopsis: String::new(),
        })
    }

    #[test]
    fn test_search_terms_must_all_match() {
        let inception = movie("Inception", "Christopher Nolan", "Sci-Fi");

        assert!(MovieSearch::parse(None).matches(&inception));
        assert!(MovieSearch::parse(Some("nolan")).matches(&inception));
        assert!(MovieSearch::parse(Some("INCEPTION sci")).matches(&inception));
        assert!(!MovieSearch::parse(Some("nolan drama")).matches(&inception));
    }

    #[test]
    fn test_showtime_ordering() {
        let now = Utc::now();
        let make = |offset: i64| Showtime {
            id: Uuid::new_v4(),
            movie_id: Uuid::nil(),
            theater_id: Uuid::nil(),
            starts_at: now + Duration::hours(offset),
            seats: SeatInventory::contiguous(1),
        };
        let mut showtimes = vec![make(3), make(1), make(2)];

        ShowtimeOrdering::parse(Some("date_time")).sort(&mut showtimes);
        assert!(showtimes.windows(2).all(|w| w[0].starts_at <= w[1].starts_at));

        ShowtimeOrdering::parse(Some("-date_time")).sort(&mut showtimes);
        assert!(showtimes.windows(2).all(|w| w[0].starts_at >= w[1].starts_at));
    }
}
