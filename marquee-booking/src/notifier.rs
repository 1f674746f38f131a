use async_trait::async_trait;
use marquee_core::notify::{NotifyError, PurchaseNotifier};
use marquee_core::Reservation;
use tracing::info;

/// Writes purchase confirmations to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl PurchaseNotifier for LogNotifier {
    async fn tickets_purchased(&self, reservation: &Reservation) -> Result<(), NotifyError> {
        info!(
            reservation_id = %reservation.id,
            user_id = %reservation.user_id,
            seats = ?reservation.seat_numbers(),
            "Tickets purchased"
        );
        Ok(())
    }
}
