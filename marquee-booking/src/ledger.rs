use async_trait::async_trait;
use marquee_core::repository::ReservationLedger;
use marquee_core::{LedgerError, Reservation, SeatId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct LedgerState {
    /// Creation order
    reservations: Vec<Reservation>,
    by_id: HashMap<Uuid, usize>,
    /// showtime -> seat -> owning reservation. Plays the role of a unique
    /// (showtime, seat) constraint.
    seats: HashMap<Uuid, BTreeMap<SeatId, Uuid>>,
}

/// Process-local reservation ledger.
///
/// Writes take the exclusive lock, so readers always see either none or all of
/// a reservation.
#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.reservations.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ReservationLedger for InMemoryLedger {
    async fn active_seats_for(&self, showtime_id: Uuid) -> Result<BTreeSet<SeatId>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .seats
            .get(&showtime_id)
            .map(|taken| taken.keys().copied().collect())
            .unwrap_or_default())
    }

    async fn create(
        &self,
        user_id: Uuid,
        showtime_id: Uuid,
        seats: &[SeatId],
    ) -> Result<Reservation, LedgerError> {
        let mut state = self.state.write().await;

        if let Some(taken) = state.seats.get(&showtime_id) {
            if let Some(seat) = seats.iter().find(|s| taken.contains_key(*s)) {
                return Err(LedgerError::SeatTaken { seat: *seat });
            }
        }

        let reservation = Reservation::hold(user_id, showtime_id, seats.to_vec());
        let taken = state.seats.entry(showtime_id).or_default();
        for seat in seats {
            taken.insert(*seat, reservation.id);
        }
        let index = state.reservations.len();
        state.by_id.insert(reservation.id, index);
        state.reservations.push(reservation.clone());

        Ok(reservation)
    }

    async fn mark_purchased(
        &self,
        reservation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Reservation, LedgerError> {
        let mut state = self.state.write().await;
        let index = *state
            .by_id
            .get(&reservation_id)
            .ok_or(LedgerError::NotFound(reservation_id))?;

        let reservation = &mut state.reservations[index];
        reservation.purchase(user_id)?;
        Ok(reservation.clone())
    }

    async fn get(&self, reservation_id: Uuid) -> Result<Option<Reservation>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .by_id
            .get(&reservation_id)
            .map(|&index| state.reservations[index].clone()))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Reservation>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .reservations
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_overlapping_hold_is_refused() {
        let ledger = InMemoryLedger::new();
        let showtime = Uuid::new_v4();

        ledger
            .create(Uuid::new_v4(), showtime, &[SeatId(1), SeatId(2)])
            .await
            .unwrap();
        let err = ledger
            .create(Uuid::new_v4(), showtime, &[SeatId(3), SeatId(2)])
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::SeatTaken { seat: SeatId(2) }));
        assert_eq!(ledger.len().await, 1);

        // Same seats on another showtime are independent
        ledger
            .create(Uuid::new_v4(), Uuid::new_v4(), &[SeatId(2)])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_active_seats_include_purchased() {
        let ledger = InMemoryLedger::new();
        let showtime = Uuid::new_v4();
        let user = Uuid::new_v4();

        let held = ledger.create(user, showtime, &[SeatId(4)]).await.unwrap();
        let bought = ledger.create(user, showtime, &[SeatId(7)]).await.unwrap();
        ledger.mark_purchased(bought.id, user).await.unwrap();

        let active = ledger.active_seats_for(showtime).await.unwrap();
        assert_eq!(active.into_iter().collect::<Vec<_>>(), vec![SeatId(4), SeatId(7)]);

        let listed = ledger.list_for_user(user).await.unwrap();
        assert_eq!(listed.iter().map(|r| r.id).collect::<Vec<_>>(), vec![held.id, bought.id]);
    }

    #[tokio::test]
    async fn test_mark_purchased_errors() {
        let ledger = InMemoryLedger::new();
        let owner = Uuid::new_v4();
        let reservation = ledger
            .create(owner, Uuid::new_v4(), &[SeatId(1)])
            .await
            .unwrap();

        assert!(matches!(
            ledger.mark_purchased(Uuid::new_v4(), owner).await,
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            ledger.mark_purchased(reservation.id, Uuid::new_v4()).await,
            Err(LedgerError::NotOwner(_))
        ));
        assert!(!ledger.get(reservation.id).await.unwrap().unwrap().is_purchased);

        ledger.mark_purchased(reservation.id, owner).await.unwrap();
        assert!(matches!(
            ledger.mark_purchased(reservation.id, owner).await,
            Err(LedgerError::AlreadyPurchased(_))
        ));
    }
}
