use marquee_core::notify::PurchaseNotifier;
use marquee_core::repository::{CatalogRepository, ReservationLedger};
use marquee_core::{BookingError, BookingResult, LedgerError, Reservation, SeatId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::locks::ShowtimeLocks;
use crate::retry::RetryPolicy;

/// Outcome of a single attempt inside the retry loop.
enum AttemptError {
    Retry(String),
    Fatal(BookingError),
}

impl From<LedgerError> for AttemptError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Contention(reason) => AttemptError::Retry(reason),
            other => AttemptError::Fatal(other.into()),
        }
    }
}

/// Places holds and purchases without ever double-booking a seat.
///
/// Every hold on a showtime runs under that showtime's lock: read the ledger,
/// check for overlap, write. Lock timeouts and ledger contention are retried
/// with backoff and finally reported as [`BookingError::Conflict`].
pub struct ReservationService {
    catalog: Arc<dyn CatalogRepository>,
    ledger: Arc<dyn ReservationLedger>,
    notifier: Arc<dyn PurchaseNotifier>,
    locks: ShowtimeLocks,
    policy: RetryPolicy,
}

impl ReservationService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        ledger: Arc<dyn ReservationLedger>,
        notifier: Arc<dyn PurchaseNotifier>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            catalog,
            ledger,
            notifier,
            locks: ShowtimeLocks::new(),
            policy,
        }
    }

    pub fn locks(&self) -> &ShowtimeLocks {
        &self.locks
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn reserve(
        &self,
        user_id: Uuid,
        showtime_id: Uuid,
        requested: &[SeatId],
    ) -> BookingResult<Reservation> {
        if requested.is_empty() {
            return Err(BookingError::EmptySelection);
        }

        let showtime = self
            .catalog
            .get_showtime(showtime_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Showtime", showtime_id))?;

        if let Some(seat) = showtime.seats.first_unknown(requested) {
            return Err(BookingError::UnknownSeat { seat });
        }

        let seats = dedup_in_order(requested);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_reserve(user_id, showtime_id, &seats).await {
                Ok(reservation) => {
                    info!(
                        "Reservation {} holds seats {:?} on showtime {}",
                        reservation.id,
                        reservation.seat_numbers(),
                        showtime_id
                    );
                    return Ok(reservation);
                }
                Err(AttemptError::Fatal(err)) => return Err(err),
                Err(AttemptError::Retry(reason)) if attempt < self.policy.max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        "Reserve on showtime {} hit contention ({}), retry {} in {:?}",
                        showtime_id, reason, attempt, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(AttemptError::Retry(reason)) => {
                    warn!(
                        "Giving up on showtime {} after {} attempts: {}",
                        showtime_id, attempt, reason
                    );
                    return Err(BookingError::Conflict {
                        showtime_id,
                        attempts: attempt,
                    });
                }
            }
        }
    }

    async fn try_reserve(
        &self,
        user_id: Uuid,
        showtime_id: Uuid,
        seats: &[SeatId],
    ) -> Result<Reservation, AttemptError> {
        let _guard = self
            .locks
            .acquire(showtime_id, self.policy.lock_timeout)
            .await
            .map_err(|e| AttemptError::Retry(e.to_string()))?;

        let active = self.ledger.active_seats_for(showtime_id).await?;
        if let Some(seat) = seats.iter().find(|s| active.contains(*s)) {
            return Err(AttemptError::Fatal(BookingError::SeatUnavailable { seat: *seat }));
        }

        Ok(self.ledger.create(user_id, showtime_id, seats).await?)
    }

    /// Held -> purchased. The confirmation is sent in the background, only on
    /// the first successful transition.
    pub async fn purchase(&self, user_id: Uuid, reservation_id: Uuid) -> BookingResult<Reservation> {
        let reservation = self.ledger.mark_purchased(reservation_id, user_id).await?;
        info!("Reservation {} purchased by {}", reservation.id, user_id);

        self.dispatch_notification(reservation.clone());
        Ok(reservation)
    }

    fn dispatch_notification(&self, reservation: Reservation) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.tickets_purchased(&reservation).await {
                warn!(
                    "Purchase notification for reservation {} failed: {}",
                    reservation.id, e
                );
            }
        });
    }
}

fn dedup_in_order(seats: &[SeatId]) -> Vec<SeatId> {
    let mut seen = HashSet::with_capacity(seats.len());
    seats.iter().copied().filter(|s| seen.insert(*s)).collect()
}
