use chrono::{DateTime, Utc};
use marquee_shared::models::events::{SeatsReservedEvent, TicketsPurchasedEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::seat::SeatId;

/// A user's hold on a set of seats for one showtime.
///
/// Created held, flips to purchased exactly once, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub showtime_id: Uuid,
    /// Seats in the order they were requested
    pub reserved_seats: Vec<SeatId>,
    pub is_purchased: bool,
    pub created_at: DateTime<Utc>,
    pub purchased_at: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn hold(user_id: Uuid, showtime_id: Uuid, reserved_seats: Vec<SeatId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            showtime_id,
            reserved_seats,
            is_purchased: false,
            created_at: Utc::now(),
            purchased_at: None,
        }
    }

    pub fn is_held(&self) -> bool {
        !self.is_purchased
    }

    /// Held -> purchased. Ownership is checked before state so a stranger learns nothing.
    pub fn purchase(&mut self, user_id: Uuid) -> Result<(), LedgerError> {
        if self.user_id != user_id {
            return Err(LedgerError::NotOwner(self.id));
        }
        if self.is_purchased {
            return Err(LedgerError::AlreadyPurchased(self.id));
        }

        self.is_purchased = true;
        self.purchased_at = Some(Utc::now());
        Ok(())
    }

    pub fn seat_numbers(&self) -> Vec<u32> {
        self.reserved_seats.iter().map(|s| s.get()).collect()
    }

    pub fn reserved_event(&self) -> SeatsReservedEvent {
        SeatsReservedEvent {
            showtime_id: self.showtime_id,
            reservation_id: self.id,
            seats: self.seat_numbers(),
            reserved_at: self.created_at.timestamp(),
        }
    }

    pub fn purchased_event(&self) -> TicketsPurchasedEvent {
        TicketsPurchasedEvent {
            reservation_id: self.id,
            showtime_id: self.showtime_id,
            user_id: self.user_id,
            seats: self.seat_numbers(),
            purchased_at: self.purchased_at.unwrap_or_else(Utc::now).timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_lifecycle() {
        let owner = Uuid::new_v4();
        let mut reservation = Reservation::hold(owner, Uuid::new_v4(), vec![SeatId(1), SeatId(2)]);
        assert!(reservation.is_held());

        reservation.purchase(owner).unwrap();
        assert!(reservation.is_purchased);
        assert!(reservation.purchased_at.is_some());

        // Never flips twice
        assert!(matches!(
            reservation.purchase(owner),
            Err(LedgerError::AlreadyPurchased(_))
        ));
    }

    #[test]
    fn test_purchase_by_stranger_leaves_flag_unchanged() {
        let mut reservation = Reservation::hold(Uuid::new_v4(), Uuid::new_v4(), vec![SeatId(3)]);

        let result = reservation.purchase(Uuid::new_v4());
        assert!(matches!(result, Err(LedgerError::NotOwner(_))));
        assert!(!reservation.is_purchased);
        assert!(reservation.purchased_at.is_none());
    }
}
