use async_trait::async_trait;

use crate::reservation::Reservation;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("No recipient for user {0}")]
    Recipient(String),

    #[error("Notification transport failed: {0}")]
    Transport(String),
}

/// Side effect fired once a reservation is purchased.
///
/// Callers dispatch it in the background; an error here never undoes the purchase.
#[async_trait]
pub trait PurchaseNotifier: Send + Sync {
    async fn tickets_purchased(&self, reservation: &Reservation) -> Result<(), NotifyError>;
}
