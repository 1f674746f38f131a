use chrono::{DateTime, Utc};
use marquee_core::BookingError;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Showtime date and time must be in the future.")]
    StartsInPast { starts_at: DateTime<Utc> },
}

impl From<ScheduleError> for BookingError {
    fn from(err: ScheduleError) -> Self {
        BookingError::InvalidSchedule(err.to_string())
    }
}

/// A showtime may only be created if it starts strictly after `now`.
pub fn validate_start(starts_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), ScheduleError> {
    if starts_at <= now {
        return Err(ScheduleError::StartsInPast { starts_at });
    }
    Ok(())
}
