use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use marquee_core::{NewShowtime, SeatId, Showtime, ShowtimeOrdering};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::catalog::OneOrMany;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ShowtimeQuery {
    /// `date_time` or `-date_time`
    pub ordering: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailableSeatsResponse {
    pub available_seats: Vec<SeatId>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/showtimes/", get(list_showtimes).post(create_showtimes))
        .route("/showtimes/{id}/available-seats/", get(available_seats))
        .route("/showtimes/{id}/stream", get(seat_stream))
}

async fn list_showtimes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ShowtimeQuery>,
) -> Result<Json<Vec<Showtime>>, AppError> {
    let ordering = ShowtimeOrdering::parse(query.ordering.as_deref());
    Ok(Json(state.catalog.list_showtimes(ordering).await?))
}

async fn create_showtimes(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<OneOrMany<NewShowtime>>,
) -> Result<(StatusCode, Json<OneOrMany<Showtime>>), AppError> {
    let single = req.is_single();
    let showtimes = state.catalog.create_showtimes(req.into_vec()).await?;
    let body = OneOrMany::shaped(single, showtimes)
        .ok_or_else(|| AppError::ValidationError("No showtimes provided.".to_string()))?;
    Ok((StatusCode::CREATED, Json(body)))
}

async fn available_seats(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<AvailableSeatsResponse>, AppError> {
    let available_seats = state.queries.available_seats(id).await?;
    Ok(Json(AvailableSeatsResponse { available_seats }))
}

/// Live `seats_reserved` events for one showtime.
async fn seat_stream(
    State(state): State<AppState>,
    ApiPath(showtime_id): ApiPath<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    state.catalog.get_showtime(showtime_id).await?;

    let rx = state.sse_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(event) if event.showtime_id == showtime_id => Event::default()
                .event("seats_reserved")
                .json_data(&event)
                .ok()
                .map(Ok),
            // Lagged receivers just skip ahead
            _ => None,
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
