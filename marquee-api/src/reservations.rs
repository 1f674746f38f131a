use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use marquee_core::{Reservation, SeatId};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{customer_auth_middleware, CustomerClaims};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    #[serde(default)]
    pub seats: Vec<SeatId>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub message: String,
    pub reservation: Reservation,
}

// ============================================================================
// Routes (all require a customer token)
// ============================================================================

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/reservations/", get(list_reservations))
        .route("/reservations/{showtime_id}/reserve/", post(reserve_seats))
        .route("/reservations/{id}/purchase/", post(purchase_tickets))
        .route("/purchased_tickets/", get(purchased_tickets))
        .layer(middleware::from_fn_with_state(state, customer_auth_middleware))
}

async fn reserve_seats(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    ApiPath(showtime_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ReserveRequest>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    let user_id = claims.user_id()?;

    let result = state.reservations.reserve(user_id, showtime_id, &req.seats).await;
    state.metrics.record_reservation(&result);
    let reservation = result?;

    // No subscribers is fine
    if state.sse_tx.send(reservation.reserved_event()).is_err() {
        debug!("No stream subscribers for showtime {}", showtime_id);
    }

    Ok((StatusCode::CREATED, Json(reservation)))
}

async fn purchase_tickets(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<PurchaseResponse>, AppError> {
    let user_id = claims.user_id()?;

    let result = state.reservations.purchase(user_id, id).await;
    state.metrics.record_purchase(&result);

    Ok(Json(PurchaseResponse {
        message: "Tickets purchased successfully.".to_string(),
        reservation: result?,
    }))
}

async fn list_reservations(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    Ok(Json(state.queries.reservations_for(claims.user_id()?).await?))
}

async fn purchased_tickets(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    Ok(Json(state.queries.purchased_tickets(claims.user_id()?).await?))
}
