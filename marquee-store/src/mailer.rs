use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use marquee_core::notify::{NotifyError, PurchaseNotifier};
use marquee_core::repository::UserRepository;
use marquee_core::Reservation;
use std::sync::Arc;
use tracing::info;

use crate::app_config::SmtpConfig;

pub const PURCHASE_SUBJECT: &str = "Your tickets have been purchased successfully!";

/// Emails the purchaser a confirmation listing their seats.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    users: Arc<dyn UserRepository>,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig, users: Arc<dyn UserRepository>) -> Result<Self, NotifyError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| NotifyError::Transport(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(config.username.clone(), config.password.clone()))
            .build();

        let from = config
            .from
            .parse()
            .map_err(|e| NotifyError::Transport(format!("Invalid from address: {e}")))?;

        Ok(Self { transport, from, users })
    }
}

pub fn purchase_body(username: &str, reservation: &Reservation) -> String {
    let seats: Vec<String> = reservation.reserved_seats.iter().map(|s| s.to_string()).collect();
    format!(
        "Hello {username},\n\n\
         Your tickets for the reservation ID {} have been successfully purchased.\n\
         Seats: {}\n\n\
         Thank you for using our service!\n\n\
         Best regards,\n\
         Movie Ticket Booking Team",
        reservation.id,
        seats.join(", ")
    )
}

#[async_trait]
impl PurchaseNotifier for SmtpNotifier {
    async fn tickets_purchased(&self, reservation: &Reservation) -> Result<(), NotifyError> {
        let user = self
            .users
            .get_user(reservation.user_id)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .ok_or_else(|| NotifyError::Recipient(reservation.user_id.to_string()))?;

        let to: Mailbox = user
            .email
            .expose()
            .parse()
            .map_err(|_| NotifyError::Recipient(user.username.clone()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(PURCHASE_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(purchase_body(&user.username, reservation))
            .map_err(|e| NotifyError::Transport(format!("Failed to build email: {e}")))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Transport(format!("Failed to send email: {e}")))?;

        info!("Purchase confirmation sent for reservation {}", reservation.id);
        Ok(())
    }
}
