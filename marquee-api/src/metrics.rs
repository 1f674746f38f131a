use axum::{extract::State, http::header, response::IntoResponse};
use marquee_core::BookingError;
use prometheus::{opts, Encoder, IntCounterVec, Registry, TextEncoder};

use crate::error::AppError;
use crate::state::AppState;

/// Booking counters exposed on `/metrics`.
pub struct Metrics {
    registry: Registry,
    reservations: IntCounterVec,
    purchases: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let reservations = IntCounterVec::new(
            opts!("marquee_reservations_total", "Reservation attempts by outcome"),
            &["outcome"],
        )?;
        let purchases = IntCounterVec::new(
            opts!("marquee_purchases_total", "Purchase attempts by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(reservations.clone()))?;
        registry.register(Box::new(purchases.clone()))?;

        Ok(Self { registry, reservations, purchases })
    }

    pub fn record_reservation<T>(&self, result: &Result<T, BookingError>) {
        self.reservations.with_label_values(&[outcome(result)]).inc();
    }

    pub fn record_purchase<T>(&self, result: &Result<T, BookingError>) {
        self.purchases.with_label_values(&[outcome(result)]).inc();
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn outcome<T>(result: &Result<T, BookingError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(BookingError::InvalidSchedule(_))
        | Err(BookingError::InvalidTheater(_))
        | Err(BookingError::UnknownSeat { .. })
        | Err(BookingError::EmptySelection) => "invalid",
        Err(BookingError::SeatUnavailable { .. }) => "seat_unavailable",
        Err(BookingError::Conflict { .. }) => "conflict",
        Err(BookingError::AlreadyPurchased { .. }) => "already_purchased",
        Err(BookingError::NotOwner { .. }) => "not_owner",
        Err(BookingError::NotFound { .. }) => "not_found",
        Err(BookingError::Storage(_)) => "error",
    }
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::InternalServerError(format!("Metrics encoding failed: {}", e)))?;

    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
