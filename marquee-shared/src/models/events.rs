use uuid::Uuid;

/// Broadcast to seat-map subscribers whenever a hold is committed.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct SeatsReservedEvent {
    pub showtime_id: Uuid,
    pub reservation_id: Uuid,
    pub seats: Vec<u32>,
    pub reserved_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct TicketsPurchasedEvent {
    pub reservation_id: Uuid,
    pub showtime_id: Uuid,
    pub user_id: Uuid,
    pub seats: Vec<u32>,
    pub purchased_at: i64,
}

impl TicketsPurchasedEvent {
    /// Partition key used when the event is published to a topic.
    pub fn key(&self) -> String {
        self.showtime_id.to_string()
    }
}
