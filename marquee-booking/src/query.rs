use marquee_core::repository::{CatalogRepository, ReservationLedger};
use marquee_core::{BookingError, BookingResult, Reservation, SeatId};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Seat counts for one showtime. `available.len() + reserved == capacity`.
#[derive(Debug, Clone, Serialize)]
pub struct SeatMap {
    pub showtime_id: Uuid,
    pub capacity: usize,
    pub reserved: usize,
    pub available: Vec<SeatId>,
}

/// Read side: derived seat availability and per-user history.
#[derive(Clone)]
pub struct QueryFacade {
    catalog: Arc<dyn CatalogRepository>,
    ledger: Arc<dyn ReservationLedger>,
}

impl QueryFacade {
    pub fn new(catalog: Arc<dyn CatalogRepository>, ledger: Arc<dyn ReservationLedger>) -> Self {
        Self { catalog, ledger }
    }

    pub async fn seat_map(&self, showtime_id: Uuid) -> BookingResult<SeatMap> {
        let showtime = self
            .catalog
            .get_showtime(showtime_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Showtime", showtime_id))?;

        let taken = self.ledger.active_seats_for(showtime_id).await?;
        let available = showtime.seats.available(&taken);

        Ok(SeatMap {
            showtime_id,
            capacity: showtime.seats.len(),
            reserved: showtime.seats.len() - available.len(),
            available,
        })
    }

    /// Roster minus every held or purchased seat, ascending.
    pub async fn available_seats(&self, showtime_id: Uuid) -> BookingResult<Vec<SeatId>> {
        Ok(self.seat_map(showtime_id).await?.available)
    }

    pub async fn reservations_for(&self, user_id: Uuid) -> BookingResult<Vec<Reservation>> {
        Ok(self.ledger.list_for_user(user_id).await?)
    }

    pub async fn purchased_tickets(&self, user_id: Uuid) -> BookingResult<Vec<Reservation>> {
        let mut reservations = self.reservations_for(user_id).await?;
        reservations.retain(|r| r.is_purchased);
        Ok(reservations)
    }
}
