use uuid::Uuid;

use crate::seat::SeatId;

/// Every failure a booking operation can report to its caller.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid theater: {0}")]
    InvalidTheater(String),

    #[error("Seat {seat} does not exist for this showtime.")]
    UnknownSeat { seat: SeatId },

    #[error("Seats must be provided.")]
    EmptySelection,

    #[error("Seat {seat} is not available.")]
    SeatUnavailable { seat: SeatId },

    #[error("Reservation {reservation_id} has already been purchased.")]
    AlreadyPurchased { reservation_id: Uuid },

    #[error("You can only purchase tickets for your own reservations.")]
    NotOwner { reservation_id: Uuid },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Showtime {showtime_id} is busy, gave up after {attempts} attempts")]
    Conflict { showtime_id: Uuid, attempts: u32 },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl BookingError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        BookingError::NotFound { entity, id }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for BookingError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        BookingError::Storage(err.to_string())
    }
}

/// Failures reported by a reservation ledger backend.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The seat already belongs to another reservation of the same showtime.
    #[error("Seat {seat} is already reserved")]
    SeatTaken { seat: SeatId },

    /// Transient serialization failure; the write can be retried.
    #[error("Ledger contention: {0}")]
    Contention(String),

    #[error("Reservation not found: {0}")]
    NotFound(Uuid),

    #[error("Reservation {0} belongs to another user")]
    NotOwner(Uuid),

    #[error("Reservation {0} is already purchased")]
    AlreadyPurchased(Uuid),

    #[error("Ledger storage error: {0}")]
    Storage(String),
}

impl From<LedgerError> for BookingError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::SeatTaken { seat } => BookingError::SeatUnavailable { seat },
            LedgerError::NotFound(id) => BookingError::not_found("Reservation", id),
            LedgerError::NotOwner(reservation_id) => BookingError::NotOwner { reservation_id },
            LedgerError::AlreadyPurchased(reservation_id) => {
                BookingError::AlreadyPurchased { reservation_id }
            }
            LedgerError::Contention(msg) | LedgerError::Storage(msg) => BookingError::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_errors_map_to_booking_errors() {
        let id = Uuid::new_v4();

        assert!(matches!(
            BookingError::from(LedgerError::SeatTaken { seat: SeatId(2) }),
            BookingError::SeatUnavailable { seat: SeatId(2) }
        ));
        assert!(matches!(
            BookingError::from(LedgerError::NotOwner(id)),
            BookingError::NotOwner { reservation_id } if reservation_id == id
        ));
        assert!(matches!(
            BookingError::from(LedgerError::NotFound(id)),
            BookingError::NotFound { entity: "Reservation", .. }
        ));
    }

    #[test]
    fn test_seat_unavailable_message_names_seat() {
        let err = BookingError::SeatUnavailable { seat: SeatId(7) };
        assert_eq!(err.to_string(), "Seat 7 is not available.");
    }
}
