use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_core::repository::ReservationLedger;
use marquee_core::{LedgerError, Reservation, SeatId};
use sqlx::PgPool;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;
use uuid::Uuid;

/// Postgres-backed ledger.
///
/// Every held seat is a row in `reservation_seats` keyed by
/// `(showtime_id, seat_id)`, so the database refuses a second holder even
/// when several API processes reserve the same showtime.
pub struct PgReservationLedger {
    pool: PgPool,
}

impl PgReservationLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    user_id: Uuid,
    showtime_id: Uuid,
    reserved_seats: Vec<i32>,
    is_purchased: bool,
    created_at: DateTime<Utc>,
    purchased_at: Option<DateTime<Utc>>,
}

impl ReservationRow {
    fn into_reservation(self) -> Result<Reservation, LedgerError> {
        let reserved_seats = self
            .reserved_seats
            .into_iter()
            .map(seat_from_column)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Reservation {
            id: self.id,
            user_id: self.user_id,
            showtime_id: self.showtime_id,
            reserved_seats,
            is_purchased: self.is_purchased,
            created_at: self.created_at,
            purchased_at: self.purchased_at,
        })
    }
}

const RESERVATION_COLUMNS: &str =
    "id, user_id, showtime_id, reserved_seats, is_purchased, created_at, purchased_at";

fn seat_from_column(raw: i32) -> Result<SeatId, LedgerError> {
    u32::try_from(raw)
        .map(SeatId)
        .map_err(|_| LedgerError::Storage(format!("invalid seat number {raw}")))
}

fn seat_to_column(seat: SeatId) -> Result<i32, LedgerError> {
    i32::try_from(seat.get()).map_err(|_| LedgerError::Storage(format!("seat {seat} out of range")))
}

/// Serialization failures, deadlocks and lock timeouts are worth retrying.
fn classify(err: sqlx::Error) -> LedgerError {
    if let sqlx::Error::Database(db) = &err {
        if matches!(db.code().as_deref(), Some("40001") | Some("40P01") | Some("55P03")) {
            return LedgerError::Contention(db.message().to_string());
        }
    }
    if matches!(err, sqlx::Error::PoolTimedOut) {
        return LedgerError::Contention(err.to_string());
    }
    LedgerError::Storage(err.to_string())
}

#[async_trait]
impl ReservationLedger for PgReservationLedger {
    async fn active_seats_for(&self, showtime_id: Uuid) -> Result<BTreeSet<SeatId>, LedgerError> {
        let seats: Vec<i32> =
            sqlx::query_scalar("SELECT seat_id FROM reservation_seats WHERE showtime_id = $1")
                .bind(showtime_id)
                .fetch_all(&self.pool)
                .await
                .map_err(classify)?;

        seats.into_iter().map(seat_from_column).collect()
    }

    async fn create(
        &self,
        user_id: Uuid,
        showtime_id: Uuid,
        seats: &[SeatId],
    ) -> Result<Reservation, LedgerError> {
        let reservation = Reservation::hold(user_id, showtime_id, seats.to_vec());
        let columns = seats
            .iter()
            .map(|s| seat_to_column(*s))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.pool.begin().await.map_err(classify)?;

        sqlx::query(
            "INSERT INTO reservations (id, user_id, showtime_id, reserved_seats, is_purchased, created_at) \
             VALUES ($1, $2, $3, $4, FALSE, $5)",
        )
        .bind(reservation.id)
        .bind(user_id)
        .bind(showtime_id)
        .bind(&columns)
        .bind(reservation.created_at)
        .execute(&mut *tx)
        .await
        .map_err(classify)?;

        // Ascending insert order keeps concurrent writers from deadlocking
        let inserted: Vec<i32> = sqlx::query_scalar(
            "INSERT INTO reservation_seats (showtime_id, seat_id, reservation_id) \
             SELECT $1, seat, $2 FROM UNNEST($3::int4[]) AS seat ORDER BY seat \
             ON CONFLICT (showtime_id, seat_id) DO NOTHING \
             RETURNING seat_id",
        )
        .bind(showtime_id)
        .bind(reservation.id)
        .bind(&columns)
        .fetch_all(&mut *tx)
        .await
        .map_err(classify)?;

        if inserted.len() != columns.len() {
            let inserted: HashSet<i32> = inserted.into_iter().collect();
            let taken = columns
                .iter()
                .zip(seats)
                .find(|(column, _)| !inserted.contains(*column))
                .map(|(_, seat)| *seat);
            tx.rollback().await.map_err(classify)?;

            return match taken {
                Some(seat) => {
                    debug!("Seat {} of showtime {} already held", seat, showtime_id);
                    Err(LedgerError::SeatTaken { seat })
                }
                None => Err(LedgerError::Storage("duplicate seats in reservation".to_string())),
            };
        }

        tx.commit().await.map_err(classify)?;
        Ok(reservation)
    }

    async fn mark_purchased(
        &self,
        reservation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Reservation, LedgerError> {
        let updated: Option<ReservationRow> = sqlx::query_as(&format!(
            "UPDATE reservations SET is_purchased = TRUE, purchased_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND is_purchased = FALSE \
             RETURNING {RESERVATION_COLUMNS}"
        ))
        .bind(reservation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        if let Some(row) = updated {
            return row.into_reservation();
        }

        // Nothing changed; work out which rule refused it
        match self.get(reservation_id).await? {
            None => Err(LedgerError::NotFound(reservation_id)),
            Some(existing) if existing.user_id != user_id => Err(LedgerError::NotOwner(reservation_id)),
            Some(_) => Err(LedgerError::AlreadyPurchased(reservation_id)),
        }
    }

    async fn get(&self, reservation_id: Uuid) -> Result<Option<Reservation>, LedgerError> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1"
        ))
        .bind(reservation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        row.map(ReservationRow::into_reservation).transpose()
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Reservation>, LedgerError> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE user_id = $1 ORDER BY seq"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        rows.into_iter().map(ReservationRow::into_reservation).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_contention() {
        assert!(matches!(classify(sqlx::Error::PoolTimedOut), LedgerError::Contention(_)));
        assert!(matches!(classify(sqlx::Error::RowNotFound), LedgerError::Storage(_)));
    }

    #[test]
    fn test_row_keeps_request_order() {
        let row = ReservationRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            showtime_id: Uuid::new_v4(),
            reserved_seats: vec![7, 2, 5],
            is_purchased: false,
            created_at: Utc::now(),
            purchased_at: None,
        };
        let reservation = row.into_reservation().unwrap();
        assert_eq!(reservation.reserved_seats, vec![SeatId(7), SeatId(2), SeatId(5)]);
        assert!(reservation.is_held());
    }
}
